#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::unescaped_backticks)]

//! OpenScan laser scanning microscope.
//!
//! [`OpenScan`] owns the hardware session. Single frames are acquired on the caller's thread with
//! [`OpenScan::snap_image`]; sequences run on a dedicated thread and deliver frames to an [`ImageSink`].
//!
//! [`ImageSink`]: sink::ImageSink

/// The device.
pub mod device;
/// Error definitions.
pub mod error;
/// Links to the scan FPGA.
pub mod link;
/// Commonly used items.
pub mod prelude;
/// Sequence acquisition events.
pub mod sequence;
/// Image sinks.
pub mod sink;

pub use openscan_driver as driver;

pub use device::OpenScan;
