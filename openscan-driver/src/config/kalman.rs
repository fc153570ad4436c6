use getset::CopyGetters;

use crate::error::ScanDriverError;

/// Minimum number of frames in a Kalman group.
pub const KALMAN_FRAMES_MIN: u32 = 1;
/// Maximum number of frames in a Kalman group.
pub const KALMAN_FRAMES_MAX: u32 = 100;
/// Minimum filter gain.
pub const FILTER_GAIN_MIN: f64 = 0.0;
/// Maximum filter gain.
pub const FILTER_GAIN_MAX: f64 = 1.0;

/// Frame averaging settings.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[getset(get_copy = "pub")]
pub struct KalmanConfig {
    /// Frames per Kalman group.
    frames: u32,
    /// If `true`, every raw frame delivers the running average instead of only the last frame of each group.
    progressive: bool,
    /// User filter gain, written once per reload.
    filter_gain: f64,
}

impl KalmanConfig {
    /// Sets the number of frames per Kalman group.
    ///
    /// # Errors
    ///
    /// Returns [`ScanDriverError::KalmanFramesOutOfRange`] if `frames` is outside [[`KALMAN_FRAMES_MIN`], [`KALMAN_FRAMES_MAX`]].
    pub fn with_frames(self, frames: u32) -> Result<Self, ScanDriverError> {
        if !(KALMAN_FRAMES_MIN..=KALMAN_FRAMES_MAX).contains(&frames) {
            return Err(ScanDriverError::KalmanFramesOutOfRange(frames));
        }
        Ok(Self { frames, ..self })
    }

    /// Sets the progressive flag.
    #[must_use]
    pub const fn with_progressive(self, progressive: bool) -> Self {
        Self {
            progressive,
            ..self
        }
    }

    /// Sets the filter gain.
    ///
    /// # Errors
    ///
    /// Returns [`ScanDriverError::FilterGainOutOfRange`] if `gain` is outside [[`FILTER_GAIN_MIN`], [`FILTER_GAIN_MAX`]].
    pub fn with_filter_gain(self, gain: f64) -> Result<Self, ScanDriverError> {
        if !(FILTER_GAIN_MIN..=FILTER_GAIN_MAX).contains(&gain) {
            return Err(ScanDriverError::FilterGainOutOfRange(gain));
        }
        Ok(Self {
            filter_gain: gain,
            ..self
        })
    }
}

impl Default for KalmanConfig {
    fn default() -> Self {
        Self {
            frames: 1,
            progressive: false,
            filter_gain: 1.0,
        }
    }
}
