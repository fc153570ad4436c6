use openscan_driver::error::ScanDriverError;
use thiserror::Error;

use crate::sink::SinkError;

/// A interface for error handling in openscan.
#[derive(Error, Debug, PartialEq, Clone)]
#[non_exhaustive]
pub enum OpenScanError {
    /// An acquisition is running. Retry after it has stopped.
    #[error("Acquisition in progress")]
    Busy,
    /// The device has been closed.
    #[error("Device is not initialized")]
    NotInitialized,
    /// The image sink is full.
    #[error("Image sink overflowed")]
    SinkOverflow,
    /// The image sink refused an image.
    #[error("Image sink rejected the image: {0}")]
    Sink(String),
    /// The acquisition thread panicked. The hardware session is lost.
    #[error("Acquisition thread panicked")]
    AcquisitionThreadPanicked,
    /// Error in the scan engine.
    #[error("{0}")]
    Driver(#[from] ScanDriverError),
}

impl From<SinkError> for OpenScanError {
    // GRCOV_EXCL_START
    fn from(e: SinkError) -> Self {
        match e {
            SinkError::Overflow => OpenScanError::SinkOverflow,
            SinkError::Rejected(msg) => OpenScanError::Sink(msg),
        }
    }
    // GRCOV_EXCL_STOP
}

#[cfg(test)]
mod tests {
    use openscan_core::link::LinkError;

    use super::*;

    #[rstest::rstest]
    #[test]
    #[case("Acquisition in progress", OpenScanError::Busy)]
    #[case("Image sink overflowed", OpenScanError::from(SinkError::Overflow))]
    #[case(
        "Image sink rejected the image: closed",
        OpenScanError::from(SinkError::Rejected("closed".to_string()))
    )]
    #[case(
        "broken",
        OpenScanError::from(ScanDriverError::from(LinkError::new("broken")))
    )]
    fn display(#[case] expect: &str, #[case] err: OpenScanError) {
        assert_eq!(expect, err.to_string());
    }
}
