pub use crate::{
    device::{OpenScan, OpenScanOption},
    error::OpenScanError,
    sequence::{SequenceEvent, SequenceOutcome},
    sink::{Image, ImageSink, Metadata, RingBufferSink, SinkError},
};

#[cfg(feature = "link-simulated")]
pub use crate::link::Simulated;

pub use openscan_core::{
    fpga::{Bitfile, ScanState},
    link::{Link, LinkError},
    sleep::{Sleep, SpinSleeper, SpinWaitSleeper, StdSleeper},
};
pub use openscan_driver::{
    config::{
        Channel, ChannelMode, GalvoOffset, KalmanConfig, Resolution, Roi, ScanConfig, ScanRate,
        Zoom,
    },
    error::ScanDriverError,
    frame::FrameReaderOption,
    indicator::{HardwareIndicators, IndicatorFlags},
    poll::PollOption,
    scanner::ScannerOption,
};
