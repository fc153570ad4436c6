use getset::CopyGetters;

use crate::{
    config::KalmanConfig,
    kalman::{self, KalmanGain},
};

/// One hardware-level frame acquisition of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStep {
    /// Value written to the frame number register.
    pub frame_number: u32,
    /// Kalman gain of this frame.
    pub gain: KalmanGain,
    /// Index of the delivered frame this acquisition contributes to.
    pub frame_index: u64,
    /// Whether the averaged result is handed to the host after this acquisition.
    pub deliver: bool,
    /// Whether this is the final acquisition of the session.
    pub last: bool,
}

/// One run of the scan state machine.
///
/// Yields the [`FrameStep`]s of the run in order. The frame number restarts at 0 for every Kalman group.
#[derive(Debug, Clone, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct AcquisitionSession {
    /// Number of frames to deliver.
    target_frame_count: u64,
    /// Frames per Kalman group.
    kalman_frame_count: u32,
    /// If `true`, every acquisition is delivered.
    progressive: bool,
    /// If `true`, a sink overflow ends the session.
    stop_on_overflow: bool,
    /// Index of the next frame to deliver.
    current_frame_index: u64,
    /// Position of the next acquisition within its Kalman group.
    kalman_counter: u32,
    /// Acquisitions done so far.
    acquired: u64,
}

impl AcquisitionSession {
    /// A sequence delivering `count` frames.
    #[must_use]
    pub fn sequence(count: u64, kalman: &KalmanConfig, stop_on_overflow: bool) -> Self {
        Self {
            target_frame_count: count,
            kalman_frame_count: kalman.frames().max(1),
            progressive: kalman.progressive(),
            stop_on_overflow,
            current_frame_index: 0,
            kalman_counter: 0,
            acquired: 0,
        }
    }

    /// A single snapped frame averaged over a full Kalman group.
    #[must_use]
    pub fn snap(kalman: &KalmanConfig) -> Self {
        Self {
            progressive: false,
            ..Self::sequence(1, kalman, true)
        }
    }

    /// Number of hardware-level acquisitions of the whole session.
    #[must_use]
    pub fn total_acquisitions(&self) -> u64 {
        if self.progressive {
            self.target_frame_count
        } else {
            self.target_frame_count
                .saturating_mul(self.kalman_frame_count as u64)
        }
    }
}

impl Iterator for AcquisitionSession {
    type Item = FrameStep;

    fn next(&mut self) -> Option<Self::Item> {
        let total = self.total_acquisitions();
        if self.acquired >= total {
            return None;
        }

        let i = self.kalman_counter;
        let deliver = self.progressive || i + 1 == self.kalman_frame_count;
        let step = FrameStep {
            frame_number: i,
            gain: KalmanGain::from_value(kalman::gain(i)),
            frame_index: self.current_frame_index,
            deliver,
            last: self.acquired + 1 == total,
        };

        self.acquired += 1;
        self.kalman_counter = (i + 1) % self.kalman_frame_count;
        if deliver {
            self.current_frame_index += 1;
        }
        Some(step)
    }
}
