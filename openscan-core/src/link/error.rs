use derive_more::Display;
use thiserror::Error;

/// Status codes reported by the FPGA interface driver.
pub mod status {
    /// A FIFO read or write did not complete before its timeout.
    pub const FIFO_TIMEOUT: i32 = -50400;
    /// The session handle is not valid (not opened, or already closed).
    pub const INVALID_SESSION: i32 = -63195;
    /// The bitfile signature does not match the one loaded on the target.
    pub const SIGNATURE_MISMATCH: i32 = -63106;
}

#[derive(Error, Debug, Display, PartialEq, Eq, Clone)]
#[display("{}", msg)]
/// An error produced by the link.
///
/// The driver status code, if any, is carried verbatim and never interpreted.
pub struct LinkError {
    msg: String,
    status: Option<i32>,
}

impl LinkError {
    /// Creates a new [`LinkError`] without a driver status code.
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            status: None,
        }
    }

    /// Creates a new [`LinkError`] carrying the driver status code.
    pub fn with_status(status: i32, msg: impl Into<String>) -> Self {
        Self {
            msg: format!("{} (status {})", msg.into(), status),
            status: Some(status),
        }
    }

    /// The driver status code.
    #[must_use]
    pub const fn status(&self) -> Option<i32> {
        self.status
    }
}
