//! Canonical 11-field feature vector and the positional mapping from
//! collaborator outputs onto it.
//!
//! Field mapping (collaborator index → canonical field):
//!
//! | collaborator | index | field        |
//! |--------------|-------|--------------|
//! | audio        | 0     | `audio_t2`   |
//! | audio        | 1     | `audio_t5`   |
//! | audio        | 2     | `audio_conf` |
//! | vision       | 0     | `vis_phone`  |
//! | vision       | 1     | `vis_multi`  |
//! | vision       | 2     | `vis_miss`   |
//! | vision       | 3     | `gaze_off`   |
//! | vision       | 4     | `gaze_turn`  |
//! | identity     | 0     | `id_dom`     |
//! | identity     | 1     | `id_switch`  |
//! | identity     | 2     | `id_unkn`    |
//!
//! Fail-safe sub-vectors replace a failed modality's output and are biased
//! toward higher risk.

use serde::{Deserialize, Serialize};

use crate::error::{CollaboratorError, CollaboratorResult, Modality};

pub const VISION_ARITY: usize = 5;
pub const IDENTITY_ARITY: usize = 3;
pub const AUDIO_ARITY: usize = 3;

/// No phone or second person asserted, face treated as missing, gaze fully off.
pub const VISION_FAIL_SAFE: [f64; VISION_ARITY] = [0.0, 0.0, 1.0, 1.0, 1.0];
/// No dominant identity, every frame treated as unknown.
pub const IDENTITY_FAIL_SAFE: [f64; IDENTITY_ARITY] = [0.0, 0.0, 1.0];
/// Talking in both windows, confidence unknown.
pub const AUDIO_FAIL_SAFE: [f64; AUDIO_ARITY] = [1.0, 1.0, 0.0];

/// `[phone, multi_person, face_missing, gaze_off, gaze_turn]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisionVector(pub [f64; VISION_ARITY]);

/// `[dominant, switch, unknown]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdentityVector(pub [f64; IDENTITY_ARITY]);

/// `[talking_2s, talking_5s, confidence_2s]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioVector(pub [f64; AUDIO_ARITY]);

impl VisionVector {
    pub const FAIL_SAFE: Self = Self(VISION_FAIL_SAFE);

    pub fn from_values(values: &[f64]) -> CollaboratorResult<Self> {
        check_arity(Modality::Vision, values).map(Self)
    }
}

impl IdentityVector {
    pub const FAIL_SAFE: Self = Self(IDENTITY_FAIL_SAFE);

    pub fn from_values(values: &[f64]) -> CollaboratorResult<Self> {
        check_arity(Modality::Identity, values).map(Self)
    }
}

impl AudioVector {
    pub const FAIL_SAFE: Self = Self(AUDIO_FAIL_SAFE);

    pub fn from_values(values: &[f64]) -> CollaboratorResult<Self> {
        check_arity(Modality::Audio, values).map(Self)
    }
}

/// Reject responses whose length or values do not fit the positional contract.
pub fn check_arity<const N: usize>(
    modality: Modality,
    values: &[f64],
) -> CollaboratorResult<[f64; N]> {
    let arr: [f64; N] = values.try_into().map_err(|_| CollaboratorError::Malformed {
        modality,
        reason: format!("expected {N} values, got {}", values.len()),
    })?;
    if let Some((idx, bad)) = arr
        .iter()
        .enumerate()
        .find(|(_, v)| !v.is_finite() || !(0.0..=1.0).contains(*v))
    {
        return Err(CollaboratorError::Malformed {
            modality,
            reason: format!("value {bad} at index {idx} outside [0, 1]"),
        });
    }
    Ok(arr)
}

/// One observation instant's fused inputs. Built once, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanonicalFeatureVector {
    pub audio_t2: f64,
    pub audio_t5: f64,
    pub audio_conf: f64,
    pub vis_phone: f64,
    pub vis_multi: f64,
    pub vis_miss: f64,
    pub id_dom: f64,
    pub id_switch: f64,
    pub id_unkn: f64,
    pub gaze_off: f64,
    pub gaze_turn: f64,
}

impl CanonicalFeatureVector {
    pub fn assemble(vision: VisionVector, identity: IdentityVector, audio: AudioVector) -> Self {
        let [vis_phone, vis_multi, vis_miss, gaze_off, gaze_turn] = vision.0;
        let [id_dom, id_switch, id_unkn] = identity.0;
        let [audio_t2, audio_t5, audio_conf] = audio.0;
        Self {
            audio_t2,
            audio_t5,
            audio_conf,
            vis_phone,
            vis_multi,
            vis_miss,
            id_dom,
            id_switch,
            id_unkn,
            gaze_off,
            gaze_turn,
        }
    }

    /// A vector with no risk indicators: the subject is alone, visible,
    /// consistently recognised and silent.
    pub fn baseline() -> Self {
        Self {
            audio_t2: 0.0,
            audio_t5: 0.0,
            audio_conf: 0.0,
            vis_phone: 0.0,
            vis_multi: 0.0,
            vis_miss: 0.0,
            id_dom: 1.0,
            id_switch: 0.0,
            id_unkn: 0.0,
            gaze_off: 0.0,
            gaze_turn: 0.0,
        }
    }

    pub fn vision(&self) -> VisionVector {
        VisionVector([
            self.vis_phone,
            self.vis_multi,
            self.vis_miss,
            self.gaze_off,
            self.gaze_turn,
        ])
    }

    pub fn identity(&self) -> IdentityVector {
        IdentityVector([self.id_dom, self.id_switch, self.id_unkn])
    }

    pub fn audio(&self) -> AudioVector {
        AudioVector([self.audio_t2, self.audio_t5, self.audio_conf])
    }
}
