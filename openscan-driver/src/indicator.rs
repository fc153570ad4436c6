use bitflags::bitflags;
use openscan_core::{
    fpga::{ControlU16, IndicatorBool, IndicatorI32, IndicatorU32, ScanState},
    link::{Link, LinkError, RegisterIo},
};

bitflags! {
    /// Boolean indicators of the scan FPGA.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct IndicatorFlags: u16 {
        /// See [`IndicatorBool::AveragedImageDisplayed`].
        const AVERAGED_IMAGE_DISPLAYED = 1 << 0;
        /// See [`IndicatorBool::FrameGalvoSignalWriteDone`].
        const FRAME_GALVO_SIGNAL_WRITE_DONE = 1 << 1;
        /// See [`IndicatorBool::FrameAcquisitionFinish`].
        const FRAME_ACQUISITION_FINISH = 1 << 2;
        /// See [`IndicatorBool::FrameImagingDataAveraged`].
        const FRAME_IMAGING_DATA_AVERAGED = 1 << 3;
        /// See [`IndicatorBool::FrameWaveformOutputFinish`].
        const FRAME_WAVEFORM_OUTPUT_FINISH = 1 << 4;
        /// See [`IndicatorBool::ImageAveragingDone`].
        const IMAGE_AVERAGING_DONE = 1 << 5;
        /// See [`IndicatorBool::LineClock`].
        const LINE_CLOCK = 1 << 6;
        /// See [`IndicatorBool::PixelClock`].
        const PIXEL_CLOCK = 1 << 7;
        /// See [`IndicatorBool::WriteDramDone`].
        const WRITE_DRAM_DONE = 1 << 8;
    }
}

impl From<IndicatorBool> for IndicatorFlags {
    fn from(indicator: IndicatorBool) -> Self {
        match indicator {
            IndicatorBool::AveragedImageDisplayed => Self::AVERAGED_IMAGE_DISPLAYED,
            IndicatorBool::FrameGalvoSignalWriteDone => Self::FRAME_GALVO_SIGNAL_WRITE_DONE,
            IndicatorBool::FrameAcquisitionFinish => Self::FRAME_ACQUISITION_FINISH,
            IndicatorBool::FrameImagingDataAveraged => Self::FRAME_IMAGING_DATA_AVERAGED,
            IndicatorBool::FrameWaveformOutputFinish => Self::FRAME_WAVEFORM_OUTPUT_FINISH,
            IndicatorBool::ImageAveragingDone => Self::IMAGE_AVERAGING_DONE,
            IndicatorBool::LineClock => Self::LINE_CLOCK,
            IndicatorBool::PixelClock => Self::PIXEL_CLOCK,
            IndicatorBool::WriteDramDone => Self::WRITE_DRAM_DONE,
        }
    }
}

/// Snapshot of the hardware indicators, for diagnosis independent of error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareIndicators {
    /// Boolean indicators.
    pub flags: IndicatorFlags,
    /// Raw state code.
    pub state_code: u16,
    /// Frames displayed since reset.
    pub display_frames_done: i32,
    /// Main loop iteration counter.
    pub loop_count: i32,
    /// Address of the last averaged sample.
    pub averaged_data_address: u32,
    /// Address requested from waveform memory.
    pub request_address: u32,
    /// Last galvo signal read back from memory.
    pub galvo_signal_read: u32,
    /// Last sample word.
    pub data: u32,
}

impl HardwareIndicators {
    /// Reads all indicators through `link`.
    pub fn read<L: Link + ?Sized>(link: &mut L) -> Result<Self, LinkError> {
        let flags = IndicatorBool::ALL
            .iter()
            .try_fold(IndicatorFlags::empty(), |flags, &indicator| {
                Ok::<_, LinkError>(if link.read(indicator)? {
                    flags | IndicatorFlags::from(indicator)
                } else {
                    flags
                })
            })?;
        Ok(Self {
            flags,
            state_code: link.read(ControlU16::Current)?,
            display_frames_done: link.read(IndicatorI32::DisplayFramesDone)?,
            loop_count: link.read(IndicatorI32::LoopCount)?,
            averaged_data_address: link.read(IndicatorU32::AveragedDataAddress)?,
            request_address: link.read(IndicatorU32::RequestAddress)?,
            galvo_signal_read: link.read(IndicatorU32::GalvoSignalRead)?,
            data: link.read(IndicatorU32::Data)?,
        })
    }

    /// The state, if the code is known.
    #[must_use]
    pub fn state(&self) -> Option<ScanState> {
        ScanState::try_from(self.state_code).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_flag_per_indicator() {
        let all = IndicatorBool::ALL
            .iter()
            .fold(IndicatorFlags::empty(), |acc, &i| {
                let flag = IndicatorFlags::from(i);
                assert!(!acc.intersects(flag));
                acc | flag
            });
        assert_eq!(IndicatorFlags::all(), all);
    }

    #[rstest::rstest]
    #[test]
    #[case(Some(ScanState::Scan), 3)]
    #[case(None, 42)]
    fn state(#[case] expect: Option<ScanState>, #[case] state_code: u16) {
        let indicators = HardwareIndicators {
            flags: IndicatorFlags::empty(),
            state_code,
            display_frames_done: 0,
            loop_count: 0,
            averaged_data_address: 0,
            request_address: 0,
            galvo_signal_read: 0,
            data: 0,
        };
        assert_eq!(expect, indicators.state());
    }
}
