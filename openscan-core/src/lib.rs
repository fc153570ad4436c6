#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::unescaped_backticks)]

//! Core traits and types for OpenScan.

/// Register map, state codes and bitfile identity of the scan FPGA.
pub mod fpga;
/// A interface to the scan FPGA.
pub mod link;
/// Sleepers used by polling loops.
pub mod sleep;
