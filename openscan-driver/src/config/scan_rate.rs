use openscan_core::fpga::FPGA_CLOCK_HZ;

use crate::error::ScanDriverError;

/// Pixel rate of the scan.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "f64", into = "f64")
)]
pub struct ScanRate(f64);

impl ScanRate {
    /// Supported pixel rates in MHz.
    pub const SUPPORTED_MHZ: [f64; 8] = [0.05, 0.1, 0.2, 0.25, 0.4, 0.5, 1.0, 1.25];

    /// Creates a new [`ScanRate`] from a pixel rate in MHz.
    ///
    /// # Errors
    ///
    /// Returns [`ScanDriverError::ScanRateNotSupported`] if `mhz` is not one of [`ScanRate::SUPPORTED_MHZ`].
    pub fn new(mhz: f64) -> Result<Self, ScanDriverError> {
        Self::SUPPORTED_MHZ
            .iter()
            .find(|&&s| (s - mhz).abs() < 1e-9)
            .map(|&s| Self(s))
            .ok_or(ScanDriverError::ScanRateNotSupported(mhz))
    }

    /// Pixel rate in MHz.
    #[must_use]
    pub const fn mhz(self) -> f64 {
        self.0
    }

    /// Pixel dwell time in FPGA clock ticks.
    #[must_use]
    pub fn pixel_time_tick(self) -> u32 {
        (FPGA_CLOCK_HZ as f64 / (self.0 * 1e6)).round() as u32
    }

    /// Line rate in Hz for lines of `elements_per_line` samples.
    #[must_use]
    pub fn line_rate_hz(self, elements_per_line: usize) -> f64 {
        self.0 * 1e6 / elements_per_line as f64
    }
}

impl Default for ScanRate {
    fn default() -> Self {
        Self(1.25)
    }
}

impl TryFrom<f64> for ScanRate {
    type Error = ScanDriverError;

    fn try_from(mhz: f64) -> Result<Self, Self::Error> {
        Self::new(mhz)
    }
}

impl From<ScanRate> for f64 {
    fn from(value: ScanRate) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[rstest::rstest]
    #[test]
    #[case(800, 0.05)]
    #[case(400, 0.1)]
    #[case(200, 0.2)]
    #[case(160, 0.25)]
    #[case(100, 0.4)]
    #[case(80, 0.5)]
    #[case(40, 1.0)]
    #[case(32, 1.25)]
    fn pixel_time_tick(#[case] expect: u32, #[case] mhz: f64) -> anyhow::Result<()> {
        assert_eq!(expect, ScanRate::new(mhz)?.pixel_time_tick());
        Ok(())
    }

    #[rstest::rstest]
    #[test]
    #[case(0.3)]
    #[case(0.0)]
    #[case(2.0)]
    #[case(f64::NAN)]
    fn not_supported(#[case] mhz: f64) {
        assert!(matches!(
            ScanRate::new(mhz),
            Err(ScanDriverError::ScanRateNotSupported(_))
        ));
    }

    #[test]
    fn line_rate() -> anyhow::Result<()> {
        assert_abs_diff_eq!(1000.0, ScanRate::new(1.0)?.line_rate_hz(1000), epsilon = 1e-9);
        Ok(())
    }
}
