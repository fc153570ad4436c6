use std::time::Duration;

use openscan_core::{fpga::ScanState, link::LinkError};
use thiserror::Error;

use crate::config::{
    GALVO_OFFSET_MAX, GALVO_OFFSET_MIN, KALMAN_FRAMES_MAX, KALMAN_FRAMES_MIN, ZOOM_MAX, ZOOM_MIN,
};

/// Scan axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Axis {
    /// Fast axis.
    X,
    /// Slow axis.
    Y,
}

/// A interface for error handling in openscan-driver.
#[derive(Error, Debug, PartialEq, Clone)]
#[non_exhaustive]
pub enum ScanDriverError {
    /// Error in the Link.
    #[error("{0}")]
    Link(#[from] LinkError),

    /// A waveform sample does not fit the DAC range.
    #[error("{axis} waveform sample {index} maps to DAC code {code}, outside [0, 65535]")]
    WaveformOutOfRange {
        /// Axis of the sample.
        axis: Axis,
        /// Index of the sample.
        index: usize,
        /// Unclamped DAC code.
        code: f64,
    },
    /// Waveform memory capacity disagrees with the computed element count.
    #[error(
        "Waveform memory size mismatch: memory full flag was {} after line {line} of {lines}",
        flag(.full)
    )]
    MemorySizeMismatch {
        /// Number of lines written when the mismatch was detected.
        line: usize,
        /// Number of lines in the waveform.
        lines: usize,
        /// Observed memory full flag.
        full: bool,
    },
    /// The target produced more pixel data than one frame.
    #[error("{0} elements left in FIFO after reading image")]
    DataLeftInFifoAfterReadingImage(usize),
    /// The state code after reset was not [`ScanState::Idle`].
    #[error("Unexpected state code ({0}) after reset")]
    UnexpectedStateAfterReset(u16),
    /// The state register holds a code that is not a [`ScanState`].
    #[error("Unknown state code ({0})")]
    UnknownStateCode(u16),
    /// The requested state transition is not allowed.
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Current state.
        from: ScanState,
        /// Requested state.
        to: ScanState,
    },
    /// No pixel data arrived for longer than the stall timeout.
    #[error("Frame read stalled after {read} of {expected} elements")]
    FrameReadStalled {
        /// Elements read so far.
        read: usize,
        /// Elements expected.
        expected: usize,
    },
    /// The frame acquisition finish indicator was not observed in time.
    #[error("Frame acquisition did not finish within {0:?}")]
    ScanTimeout(Duration),
    /// The frame was abandoned on a stop request.
    #[error("Frame acquisition cancelled")]
    Cancelled,
    /// No waveform has been loaded since the last reset.
    #[error("Waveform is not loaded")]
    WaveformNotLoaded,

    /// Resolution is not supported.
    #[error("Resolution ({0}) is not supported")]
    ResolutionNotSupported(u32),
    /// Scan rate is not supported.
    #[error("Scan rate ({0} MHz) is not supported")]
    ScanRateNotSupported(f64),
    /// Zoom is out of range.
    #[error("Zoom ({0}) is out of range ([{min}, {max}])", min = ZOOM_MIN, max = ZOOM_MAX)]
    ZoomOutOfRange(f64),
    /// Galvo offset is out of range.
    #[error(
        "Galvo offset ({0} V) is out of range ([{min}, {max}])",
        min = GALVO_OFFSET_MIN,
        max = GALVO_OFFSET_MAX
    )]
    GalvoOffsetOutOfRange(f64),
    /// Number of Kalman frames is out of range.
    #[error(
        "Number of Kalman frames ({0}) is out of range ([{min}, {max}])",
        min = KALMAN_FRAMES_MIN,
        max = KALMAN_FRAMES_MAX
    )]
    KalmanFramesOutOfRange(u32),
    /// Filter gain is out of range.
    #[error("Filter gain ({0}) is out of range ([0, 1])")]
    FilterGainOutOfRange(f64),
    /// ROI does not fit inside the image.
    #[error("ROI ({x}, {y}, {width}, {height}) does not fit inside {resolution}x{resolution}")]
    RoiOutOfRange {
        /// Left edge.
        x: u32,
        /// Top edge.
        y: u32,
        /// Width.
        width: u32,
        /// Height.
        height: u32,
        /// Pixels per side of the image.
        resolution: u32,
    },
}

fn flag(set: &bool) -> &'static str {
    if *set {
        "set"
    } else {
        "not set"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[rstest::rstest]
    #[test]
    #[case(
        "Waveform memory size mismatch: memory full flag was set after line 3 of 512",
        ScanDriverError::MemorySizeMismatch { line: 3, lines: 512, full: true }
    )]
    #[case(
        "Waveform memory size mismatch: memory full flag was not set after line 512 of 512",
        ScanDriverError::MemorySizeMismatch { line: 512, lines: 512, full: false }
    )]
    #[case(
        "3 elements left in FIFO after reading image",
        ScanDriverError::DataLeftInFifoAfterReadingImage(3)
    )]
    #[case(
        "Unexpected state code (5) after reset",
        ScanDriverError::UnexpectedStateAfterReset(5)
    )]
    #[case(
        "Invalid state transition from Idle to Done",
        ScanDriverError::InvalidStateTransition { from: ScanState::Idle, to: ScanState::Done }
    )]
    #[case("Zoom (0.1) is out of range ([0.2, 20])", ScanDriverError::ZoomOutOfRange(0.1))]
    fn display(#[case] expect: &str, #[case] err: ScanDriverError) {
        assert_eq!(expect, err.to_string());
        assert!(err.source().is_none());
    }

    #[test]
    fn link_error_is_propagated_verbatim() {
        let err = ScanDriverError::from(LinkError::with_status(-50400, "FIFO read timed out"));
        assert_eq!("FIFO read timed out (status -50400)", err.to_string());
    }
}
