use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::window::SlidingWindow;

/// Identity label history length in frames.
pub const IDENTITY_WINDOW: usize = 30;

/// Who was in front of the camera for one frame.
///
/// `Missing` and `Unknown` are the reserved sentinels; they take part in
/// dominance and switch counting like any recognised label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityLabel {
    /// No face detected.
    Missing,
    /// A face was detected but not confidently recognised.
    Unknown,
    Known(String),
}

impl IdentityLabel {
    pub fn is_sentinel(&self) -> bool {
        matches!(self, IdentityLabel::Missing | IdentityLabel::Unknown)
    }
}

impl fmt::Display for IdentityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityLabel::Missing => f.write_str("missing"),
            IdentityLabel::Unknown => f.write_str("unknown"),
            IdentityLabel::Known(name) => f.write_str(name),
        }
    }
}

/// Identity ratios: `[dominant, switch, unknown]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdentityRatios {
    pub dominant_ratio: f64,
    pub switch_ratio: f64,
    pub unknown_ratio: f64,
}

#[derive(Debug, Clone)]
pub struct IdentityAggregator {
    history: SlidingWindow<IdentityLabel>,
}

impl Default for IdentityAggregator {
    fn default() -> Self {
        Self::new(IDENTITY_WINDOW)
    }
}

impl IdentityAggregator {
    pub fn new(window: usize) -> Self {
        Self {
            history: SlidingWindow::new(window),
        }
    }

    pub fn update(&mut self, label: IdentityLabel) {
        self.history.push(label);
    }

    pub fn snapshot(&self) -> Option<IdentityRatios> {
        let total = self.history.len();
        if total == 0 {
            return None;
        }
        let total_f = total as f64;

        let mut counts: HashMap<&IdentityLabel, usize> = HashMap::new();
        for label in self.history.iter() {
            *counts.entry(label).or_insert(0) += 1;
        }
        let dominant = counts.values().copied().max().unwrap_or(0);

        // Transitions are divided by occupancy, not by the number of pairs.
        let switches = if total > 1 {
            self.history
                .iter()
                .zip(self.history.iter().skip(1))
                .filter(|(prev, next)| prev != next)
                .count()
        } else {
            0
        };

        let sentinels = self.history.iter().filter(|l| l.is_sentinel()).count();

        Some(IdentityRatios {
            dominant_ratio: dominant as f64 / total_f,
            switch_ratio: switches as f64 / total_f,
            unknown_ratio: sentinels as f64 / total_f,
        })
    }

    /// The most frequent label in the window, if any.
    pub fn dominant_label(&self) -> Option<&IdentityLabel> {
        let mut counts: HashMap<&IdentityLabel, usize> = HashMap::new();
        for label in self.history.iter() {
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .max_by_key(|(_, count)| *count)
            .map(|(label, _)| label)
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}
