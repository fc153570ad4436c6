use crate::link::{Link, LinkError};

/// A register of the scan FPGA.
pub trait Register: Copy + core::fmt::Debug {
    /// Value type of the register.
    type Value;

    /// Address of the register.
    fn addr(self) -> u32;

    /// Reads the register through `link`.
    fn read_from<L: Link + ?Sized>(self, link: &mut L) -> Result<Self::Value, LinkError>;
}

/// A register the host may write.
pub trait Control: Register {
    /// Writes the register through `link`.
    fn write_to<L: Link + ?Sized>(self, link: &mut L, value: Self::Value) -> Result<(), LinkError>;
}

macro_rules! registers {
    (
        $(#[$meta:meta])*
        $name:ident: $value:ty => $read:ident $(, $write:ident)? {
            $( $(#[$vmeta:meta])* $variant:ident = $addr:literal, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $addr, )*
        }

        impl $name {
            /// All registers of this group.
            pub const ALL: &'static [Self] = &[$(Self::$variant,)*];
        }

        impl Register for $name {
            type Value = $value;

            fn addr(self) -> u32 {
                self as u32
            }

            fn read_from<L: Link + ?Sized>(self, link: &mut L) -> Result<$value, LinkError> {
                link.$read(self as u32)
            }
        }

        $(
            impl Control for $name {
                fn write_to<L: Link + ?Sized>(
                    self,
                    link: &mut L,
                    value: $value,
                ) -> Result<(), LinkError> {
                    link.$write(self as u32, value)
                }
            }
        )?
    };
}

registers! {
    /// Boolean indicators.
    IndicatorBool: bool => read_bool {
        /// The averaged image has been handed to the display path.
        AveragedImageDisplayed = 0x10032,
        /// The galvo pre-position signal has been written.
        FrameGalvoSignalWriteDone = 0x10086,
        /// All pixels of the current frame are in the target-to-host FIFO.
        FrameAcquisitionFinish = 0x1001E,
        /// Imaging data of the current frame has been averaged.
        FrameImagingDataAveraged = 0x1002E,
        /// The waveform output of the current frame has finished.
        FrameWaveformOutputFinish = 0x1005A,
        /// Averaging over the Kalman group is done.
        ImageAveragingDone = 0x10036,
        /// Line clock level.
        LineClock = 0x10046,
        /// Pixel clock level.
        PixelClock = 0x1004A,
        /// Waveform memory is full.
        WriteDramDone = 0x1008A,
    }
}

registers! {
    /// Signed 32-bit indicators.
    IndicatorI32: i32 => read_i32 {
        /// Number of frames displayed since reset.
        DisplayFramesDone = 0x10024,
        /// Main loop iteration counter.
        LoopCount = 0x10020,
    }
}

registers! {
    /// Unsigned 32-bit indicators.
    IndicatorU32: u32 => read_u32 {
        /// Address of the last averaged sample.
        AveragedDataAddress = 0x10028,
        /// Last sample word.
        Data = 0x1004C,
        /// Last galvo signal read back from memory.
        GalvoSignalRead = 0x10050,
        /// Address requested from waveform memory.
        RequestAddress = 0x10054,
    }
}

registers! {
    /// Boolean controls.
    ControlBool: bool => read_bool, write_bool {
        /// Acquisition done handshake.
        Done = 0x1000E,
        /// Arms the scan. De-asserting it halts the scan.
        ReadyToScan = 0x1001A,
        /// Enables waveform upload into memory.
        WriteDramEnable = 0x10092,
        /// Latches [`ControlU32::GalvoSignal`] to the galvo outputs.
        WriteFrameGalvoSignal = 0x1009A,
    }
}

registers! {
    /// Unsigned 16-bit controls.
    ControlU16: u16 => read_u16, write_u16 {
        /// State code. See [`ScanState`](super::ScanState).
        Current = 0x10012,
        /// User filter gain, Q1.15.
        FilterGain = 0x1000A,
        /// Per-frame Kalman gain, Q1.15.
        KalmanGain = 0x10006,
    }
}

registers! {
    /// Signed 32-bit controls.
    ControlI32: i32 => read_i32, write_i32 {
        /// Waveform samples per line, including undershoot and retrace.
        ElementsPerLine = 0x10064,
        /// Frame number within the current Kalman group.
        FrameNumber = 0x10040,
        /// Frames per Kalman group.
        NumberOfFrames = 0x10080,
        /// Undershoot samples per line.
        NumOfUndershoot = 0x10070,
        /// Pixel clock pulse width in FPGA ticks.
        PixelClockPulseWidthTick = 0x1005C,
        /// Delay of the first pixel pulse in FPGA ticks.
        PixelPulseInitialDelay = 0x10074,
        /// Pixel dwell time in FPGA ticks.
        PixelTimeTick = 0x1006C,
        /// Pixels per side.
        Resolution = 0x10060,
    }
}

registers! {
    /// Unsigned 32-bit controls.
    ControlU32: u32 => read_u32, write_u32 {
        /// Y flyback time in FPGA ticks.
        FrameRetraceTime = 0x10078,
        /// Packed galvo position for pre-positioning.
        GalvoSignal = 0x10014,
        /// Last waveform memory address.
        MaxDramAddress = 0x10000,
        /// Waveform samples per line.
        NumOfElements = 0x10068,
        /// Pixels per frame.
        SamplesPerFrame = 0x1007C,
        /// Waveform samples per frame.
        TotalElements = 0x1008C,
        /// Last pixel memory address.
        MaxAddr = 0x10094,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn addresses_are_unique() {
        let addrs = IndicatorBool::ALL
            .iter()
            .map(|r| r.addr())
            .chain(IndicatorI32::ALL.iter().map(|r| r.addr()))
            .chain(IndicatorU32::ALL.iter().map(|r| r.addr()))
            .chain(ControlBool::ALL.iter().map(|r| r.addr()))
            .chain(ControlU16::ALL.iter().map(|r| r.addr()))
            .chain(ControlI32::ALL.iter().map(|r| r.addr()))
            .chain(ControlU32::ALL.iter().map(|r| r.addr()))
            .collect::<Vec<_>>();
        assert_eq!(addrs.len(), addrs.iter().collect::<HashSet<_>>().len());
    }

    #[rstest::rstest]
    #[test]
    #[case(0x1001E, IndicatorBool::FrameAcquisitionFinish.addr())]
    #[case(0x1008A, IndicatorBool::WriteDramDone.addr())]
    #[case(0x10012, ControlU16::Current.addr())]
    #[case(0x10006, ControlU16::KalmanGain.addr())]
    #[case(0x10040, ControlI32::FrameNumber.addr())]
    #[case(0x1008C, ControlU32::TotalElements.addr())]
    fn register_addr(#[case] expect: u32, #[case] actual: u32) {
        assert_eq!(expect, actual);
    }
}
