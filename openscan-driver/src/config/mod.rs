mod channel;
mod kalman;
mod range;
mod resolution;
mod roi;
mod scan_rate;

pub use channel::{Channel, ChannelMode};
pub use kalman::{
    KalmanConfig, FILTER_GAIN_MAX, FILTER_GAIN_MIN, KALMAN_FRAMES_MAX, KALMAN_FRAMES_MIN,
};
pub use range::{GalvoOffset, Zoom, GALVO_OFFSET_MAX, GALVO_OFFSET_MIN, ZOOM_MAX, ZOOM_MIN};
pub use resolution::Resolution;
pub use roi::Roi;
pub use scan_rate::ScanRate;

/// Scan parameters of a device.
///
/// Every field is validated on construction, so any `ScanConfig` can be loaded onto the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanConfig {
    /// Pixel rate.
    pub scan_rate: ScanRate,
    /// Pixels per side.
    pub resolution: Resolution,
    /// Zoom factor.
    pub zoom: Zoom,
    /// Galvo offset of the fast axis.
    pub offset_x: GalvoOffset,
    /// Galvo offset of the slow axis.
    pub offset_y: GalvoOffset,
    /// Channels delivered to the host.
    pub channel_mode: ChannelMode,
    /// Frame averaging.
    pub kalman: KalmanConfig,
}

impl ScanConfig {
    /// Magnification relative to the default resolution at zoom 1.0.
    #[must_use]
    pub fn magnification(&self) -> f64 {
        self.zoom.value() * self.resolution.pixels() as f64 / Resolution::default().pixels() as f64
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn default() {
        let config = ScanConfig::default();
        assert_eq!(512, config.resolution.pixels());
        assert_eq!(1.25, config.scan_rate.mhz());
        assert_eq!(1.0, config.zoom.value());
        assert_eq!(0.0, config.offset_x.volts());
        assert_eq!(0.0, config.offset_y.volts());
        assert_eq!(ChannelMode::RawAndAveraged, config.channel_mode);
        assert_eq!(1, config.kalman.frames());
        assert!(!config.kalman.progressive());
        assert_eq!(1.0, config.kalman.filter_gain());
    }

    #[rstest::rstest]
    #[test]
    #[case(1.0, 512, 1.0)]
    #[case(2.0, 1024, 1.0)]
    #[case(0.5, 256, 1.0)]
    #[case(3.0, 512, 3.0)]
    #[case(0.8, 2048, 0.2)]
    fn magnification(
        #[case] expect: f64,
        #[case] resolution: u32,
        #[case] zoom: f64,
    ) -> anyhow::Result<()> {
        let config = ScanConfig {
            resolution: Resolution::new(resolution)?,
            zoom: Zoom::new(zoom)?,
            ..Default::default()
        };
        assert_abs_diff_eq!(expect, config.magnification(), epsilon = 1e-12);
        Ok(())
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde() -> anyhow::Result<()> {
        let config = ScanConfig {
            resolution: Resolution::new(1024)?,
            zoom: Zoom::new(2.5)?,
            ..Default::default()
        };
        let json = serde_json::to_string(&config)?;
        assert_eq!(config, serde_json::from_str(&json)?);
        assert!(serde_json::from_str::<ScanConfig>(&json.replace("1024", "1000")).is_err());
        Ok(())
    }
}
