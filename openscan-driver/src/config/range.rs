use crate::error::ScanDriverError;

/// Minimum zoom factor.
pub const ZOOM_MIN: f64 = 0.2;
/// Maximum zoom factor.
pub const ZOOM_MAX: f64 = 20.0;
/// Minimum galvo offset in volts.
pub const GALVO_OFFSET_MIN: f64 = -10.0;
/// Maximum galvo offset in volts.
pub const GALVO_OFFSET_MAX: f64 = 10.0;

/// Zoom factor. The scanned field shrinks by this factor.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "f64", into = "f64")
)]
pub struct Zoom(f64);

impl Zoom {
    /// Creates a new [`Zoom`].
    ///
    /// # Errors
    ///
    /// Returns [`ScanDriverError::ZoomOutOfRange`] if `value` is outside [[`ZOOM_MIN`], [`ZOOM_MAX`]].
    pub fn new(value: f64) -> Result<Self, ScanDriverError> {
        if (ZOOM_MIN..=ZOOM_MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ScanDriverError::ZoomOutOfRange(value))
        }
    }

    /// The zoom factor.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl Default for Zoom {
    fn default() -> Self {
        Self(1.0)
    }
}

impl TryFrom<f64> for Zoom {
    type Error = ScanDriverError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Zoom> for f64 {
    fn from(value: Zoom) -> Self {
        value.0
    }
}

/// Static galvo offset in volts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "f64", into = "f64")
)]
pub struct GalvoOffset(f64);

impl GalvoOffset {
    /// Creates a new [`GalvoOffset`].
    ///
    /// # Errors
    ///
    /// Returns [`ScanDriverError::GalvoOffsetOutOfRange`] if `volts` is outside [[`GALVO_OFFSET_MIN`], [`GALVO_OFFSET_MAX`]].
    pub fn new(volts: f64) -> Result<Self, ScanDriverError> {
        if (GALVO_OFFSET_MIN..=GALVO_OFFSET_MAX).contains(&volts) {
            Ok(Self(volts))
        } else {
            Err(ScanDriverError::GalvoOffsetOutOfRange(volts))
        }
    }

    /// The offset in volts.
    #[must_use]
    pub const fn volts(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for GalvoOffset {
    type Error = ScanDriverError;

    fn try_from(volts: f64) -> Result<Self, Self::Error> {
        Self::new(volts)
    }
}

impl From<GalvoOffset> for f64 {
    fn from(value: GalvoOffset) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    #[test]
    #[case(true, ZOOM_MIN)]
    #[case(true, 1.0)]
    #[case(true, ZOOM_MAX)]
    #[case(false, 0.1)]
    #[case(false, 20.5)]
    #[case(false, f64::NAN)]
    fn zoom(#[case] expect: bool, #[case] value: f64) {
        assert_eq!(expect, Zoom::new(value).is_ok());
    }

    #[rstest::rstest]
    #[test]
    #[case(true, GALVO_OFFSET_MIN)]
    #[case(true, 0.0)]
    #[case(true, GALVO_OFFSET_MAX)]
    #[case(false, -10.01)]
    #[case(false, 10.01)]
    #[case(false, f64::INFINITY)]
    fn galvo_offset(#[case] expect: bool, #[case] volts: f64) {
        assert_eq!(expect, GalvoOffset::new(volts).is_ok());
    }
}
