use std::time::Duration;
use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::aggregation::audio::{AUDIO_SHORT_WINDOW, AUDIO_WINDOW};
use crate::aggregation::identity::IDENTITY_WINDOW;
use crate::aggregation::vision::VISION_WINDOW;
use crate::fusion::{EscalationConfig, ScoringConfig};
use crate::sensing::identity::RECOGNITION_THRESHOLD;
use crate::sensing::VisionClasses;

pub const SETTINGS_PATH_ENV: &str = "PROCTOR_SETTINGS";

/// Where the collaborators live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Fan out to the vision/identity/audio HTTP services.
    Remote,
    /// Run synthetic in-process collaborators.
    Simulate,
}

impl std::str::FromStr for RunMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(RunMode::Remote),
            "simulate" | "simulation" => Ok(RunMode::Simulate),
            other => bail!("unknown run mode '{other}' (expected remote|simulate)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollaboratorEndpoints {
    pub vision_url: String,
    pub identity_url: String,
    pub audio_url: String,
    pub connect_timeout_ms: u64,
}

impl Default for CollaboratorEndpoints {
    fn default() -> Self {
        Self {
            vision_url: "http://vision:8001/process".into(),
            identity_url: "http://identity:8002/process".into(),
            audio_url: "http://audio:8003/get_features".into(),
            connect_timeout_ms: 2000,
        }
    }
}

/// Window sizes and detector mapping for the in-process collaborators.
/// Remote services own their own windows, so remote mode ignores these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensingSettings {
    pub vision_window: usize,
    pub identity_window: usize,
    pub audio_window: usize,
    pub audio_short_window: usize,
    pub recognition_threshold: f64,
    pub classes: VisionClasses,
}

impl Default for SensingSettings {
    fn default() -> Self {
        Self {
            vision_window: VISION_WINDOW,
            identity_window: IDENTITY_WINDOW,
            audio_window: AUDIO_WINDOW,
            audio_short_window: AUDIO_SHORT_WINDOW,
            recognition_threshold: RECOGNITION_THRESHOLD,
            classes: VisionClasses::default(),
        }
    }
}

impl SensingSettings {
    pub fn validate(&self) -> Result<()> {
        if self.vision_window == 0 || self.identity_window == 0 {
            bail!("vision_window and identity_window must be at least 1");
        }
        if self.audio_short_window == 0 || self.audio_short_window > self.audio_window {
            bail!(
                "audio_short_window must be in [1, audio_window], got {} with audio_window {}",
                self.audio_short_window,
                self.audio_window
            );
        }
        if !(0.0..=1.0).contains(&self.recognition_threshold) {
            bail!(
                "recognition_threshold must be in [0, 1], got {}",
                self.recognition_threshold
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionSettings {
    pub mode: RunMode,
    pub bind: String,
    pub collaborators: CollaboratorEndpoints,
    /// `null` waits on every branch without a deadline.
    pub branch_deadline_ms: Option<u64>,
    pub scoring: ScoringConfig,
    pub escalation: EscalationConfig,
    pub sensing: SensingSettings,
}

impl Default for FusionSettings {
    fn default() -> Self {
        Self {
            mode: RunMode::Remote,
            bind: "0.0.0.0:8000".into(),
            collaborators: CollaboratorEndpoints::default(),
            branch_deadline_ms: Some(5000),
            scoring: ScoringConfig::default(),
            escalation: EscalationConfig::default(),
            sensing: SensingSettings::default(),
        }
    }
}

impl FusionSettings {
    pub fn branch_deadline(&self) -> Option<Duration> {
        self.branch_deadline_ms.map(Duration::from_millis)
    }

    /// Apply `VISION_URL`, `IDENTITY_URL`, `AUDIO_URL`, `FUSION_BIND` and
    /// `FUSION_MODE` on top of the file values.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("VISION_URL") {
            self.collaborators.vision_url = url;
        }
        if let Some(url) = lookup("IDENTITY_URL") {
            self.collaborators.identity_url = url;
        }
        if let Some(url) = lookup("AUDIO_URL") {
            self.collaborators.audio_url = url;
        }
        if let Some(bind) = lookup("FUSION_BIND") {
            self.bind = bind;
        }
        if let Some(mode) = lookup("FUSION_MODE") {
            self.mode = mode.parse().context("invalid FUSION_MODE")?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.scoring.validate().context("invalid scoring settings")?;
        self.escalation
            .validate()
            .context("invalid escalation settings")?;
        self.sensing.validate().context("invalid sensing settings")?;
        if self.branch_deadline_ms == Some(0) {
            bail!("branch_deadline_ms must be positive or null");
        }
        Ok(())
    }
}

pub struct SettingsStore {
    path: Option<PathBuf>,
    data: RwLock<FusionSettings>,
}

impl SettingsStore {
    /// Load from `path` if it exists, then apply environment overrides.
    pub fn new(path: Option<PathBuf>) -> Result<Self> {
        let data = load(path.as_ref())?;
        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    /// Settings file from `PROCTOR_SETTINGS`, if set.
    pub fn from_env() -> Result<Self> {
        Self::new(std::env::var_os(SETTINGS_PATH_ENV).map(PathBuf::from))
    }

    pub fn current(&self) -> FusionSettings {
        self.data.read().clone()
    }

    pub fn reload(&self) -> Result<()> {
        let data = load(self.path.as_ref())?;
        *self.data.write() = data;
        Ok(())
    }
}

fn load(path: Option<&PathBuf>) -> Result<FusionSettings> {
    let mut settings = match path {
        Some(path) if path.exists() => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse settings in {}", path.display()))?
        }
        _ => FusionSettings::default(),
    };
    settings.apply_env(|key| std::env::var(key).ok())?;
    settings.validate()?;
    Ok(settings)
}
