use openscan_core::{
    fpga::{ControlI32, ControlU16, ControlU32},
    link::{Link, LinkError, RegisterIo},
};

use crate::{config::ScanConfig, kalman::KalmanGain, waveform::{Waveform, X_UNDERSHOOT}};

/// Delay of the first pixel pulse in FPGA ticks.
pub const PIXEL_PULSE_INITIAL_DELAY: i32 = 2;

/// Timing and geometry registers derived from a [`ScanConfig`] and its [`Waveform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanTiming {
    /// Pixel dwell time in FPGA ticks.
    pub pixel_time_tick: i32,
    /// Pixel clock pulse width in FPGA ticks.
    pub pixel_clock_pulse_width_tick: i32,
    /// Pixels per side.
    pub resolution: i32,
    /// Undershoot samples per line.
    pub undershoot: i32,
    /// Y flyback time in FPGA ticks.
    pub frame_retrace_time: u32,
    /// Pixels per frame.
    pub samples_per_frame: u32,
    /// Frames per Kalman group.
    pub number_of_frames: i32,
    /// User filter gain.
    pub filter_gain: KalmanGain,
}

impl ScanTiming {
    /// Derives the registers for `config`.
    #[must_use]
    pub fn new(config: &ScanConfig, waveform: &Waveform) -> Self {
        let pixel_time_tick = config.scan_rate.pixel_time_tick();
        let resolution = config.resolution.pixels();
        Self {
            pixel_time_tick: pixel_time_tick as i32,
            pixel_clock_pulse_width_tick: (pixel_time_tick / 2).max(1) as i32,
            resolution: resolution as i32,
            undershoot: X_UNDERSHOOT as i32,
            frame_retrace_time: (waveform.elements_per_line() as u32)
                .saturating_mul(pixel_time_tick),
            samples_per_frame: resolution * resolution,
            number_of_frames: config.kalman.frames() as i32,
            filter_gain: KalmanGain::from_value(config.kalman.filter_gain()),
        }
    }

    /// Writes the registers through `link`.
    pub fn program<L: Link + ?Sized>(&self, link: &mut L) -> Result<(), LinkError> {
        link.write(ControlI32::PixelTimeTick, self.pixel_time_tick)?;
        link.write(
            ControlI32::PixelClockPulseWidthTick,
            self.pixel_clock_pulse_width_tick,
        )?;
        link.write(ControlI32::PixelPulseInitialDelay, PIXEL_PULSE_INITIAL_DELAY)?;
        link.write(ControlI32::Resolution, self.resolution)?;
        link.write(ControlI32::NumOfUndershoot, self.undershoot)?;
        link.write(ControlU32::FrameRetraceTime, self.frame_retrace_time)?;
        link.write(ControlU32::SamplesPerFrame, self.samples_per_frame)?;
        link.write(ControlU32::MaxAddr, self.samples_per_frame - 1)?;
        link.write(ControlI32::NumberOfFrames, self.number_of_frames)?;
        link.write(ControlU16::FilterGain, self.filter_gain.code())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{KalmanConfig, Resolution, ScanRate};

    use super::*;

    #[test]
    fn derived() -> anyhow::Result<()> {
        let config = ScanConfig {
            scan_rate: ScanRate::new(0.5)?,
            resolution: Resolution::new(256)?,
            kalman: KalmanConfig::default()
                .with_frames(3)?
                .with_filter_gain(0.5)?,
            ..Default::default()
        };
        let waveform = Waveform::from_config(&config)?;
        let timing = ScanTiming::new(&config, &waveform);
        assert_eq!(
            ScanTiming {
                pixel_time_tick: 80,
                pixel_clock_pulse_width_tick: 40,
                resolution: 256,
                undershoot: 50,
                frame_retrace_time: (50 + 256 + 438) * 80,
                samples_per_frame: 65536,
                number_of_frames: 3,
                filter_gain: KalmanGain::from_code(16384),
            },
            timing
        );
        Ok(())
    }
}
