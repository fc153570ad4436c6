use derive_more::Display;

use crate::error::ScanDriverError;

/// Pixels per side of the square image.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "u32", into = "u32")
)]
pub struct Resolution(u32);

impl Resolution {
    /// Supported resolutions.
    pub const SUPPORTED: [u32; 4] = [256, 512, 1024, 2048];

    /// Creates a new [`Resolution`].
    ///
    /// # Errors
    ///
    /// Returns [`ScanDriverError::ResolutionNotSupported`] if `pixels` is not in [`Resolution::SUPPORTED`].
    pub fn new(pixels: u32) -> Result<Self, ScanDriverError> {
        if Self::SUPPORTED.contains(&pixels) {
            Ok(Self(pixels))
        } else {
            Err(ScanDriverError::ResolutionNotSupported(pixels))
        }
    }

    /// Pixels per side.
    #[must_use]
    pub const fn pixels(self) -> u32 {
        self.0
    }

    /// Pixels per frame.
    #[must_use]
    pub const fn pixels_per_frame(self) -> usize {
        self.0 as usize * self.0 as usize
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self(512)
    }
}

impl TryFrom<u32> for Resolution {
    type Error = ScanDriverError;

    fn try_from(pixels: u32) -> Result<Self, Self::Error> {
        Self::new(pixels)
    }
}

impl From<Resolution> for u32 {
    fn from(value: Resolution) -> Self {
        value.0
    }
}
