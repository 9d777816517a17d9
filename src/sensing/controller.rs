use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::info;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::aggregation::{AudioAggregator, AudioFeatures};

use super::loop_worker::{listening_loop, ListeningConfig, VoiceActivityDetector};

/// Owns the background audio loop and the latest-value cell it writes.
pub struct AudioMonitor {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    latest: Arc<watch::Sender<Option<AudioFeatures>>>,
    config: ListeningConfig,
    window: usize,
    short_window: usize,
}

impl AudioMonitor {
    pub fn new(config: ListeningConfig) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            handle: None,
            cancel_token: None,
            latest: Arc::new(tx),
            config,
            window: crate::aggregation::audio::AUDIO_WINDOW,
            short_window: crate::aggregation::audio::AUDIO_SHORT_WINDOW,
        }
    }

    pub fn with_windows(mut self, window: usize, short_window: usize) -> Self {
        self.window = window;
        self.short_window = short_window;
        self
    }

    /// Read-only handle on the latest aggregated audio features.
    pub fn subscribe(&self) -> watch::Receiver<Option<AudioFeatures>> {
        self.latest.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start(&mut self, detector: Box<dyn VoiceActivityDetector>) -> Result<()> {
        if self.handle.is_some() {
            bail!("audio monitor already active");
        }

        let cancel_token = CancellationToken::new();
        let aggregator = AudioAggregator::new(self.window, self.short_window);

        let handle = tokio::spawn(listening_loop(
            Arc::new(Mutex::new(detector)),
            aggregator,
            Arc::clone(&self.latest),
            self.config,
            cancel_token.clone(),
        ));

        info!("audio monitor started");
        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle.await.context("audio loop task failed to join")
        } else {
            Ok(())
        }
    }
}
