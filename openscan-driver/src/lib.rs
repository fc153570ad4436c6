#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::unescaped_backticks)]

//! Scan engine of OpenScan.
//!
//! [`scanner::Scanner`] owns the link to the scan FPGA and walks it through
//! `Idle -> Init -> Write -> Idle` to upload a [`waveform::Waveform`], then
//! `Idle -> Scan -> (Blank -> Scan)* -> Done -> Idle` for the frames of an [`session::AcquisitionSession`].

/// Scan parameters.
pub mod config;
/// Error definitions.
pub mod error;
/// Frame readback.
pub mod frame;
/// Hardware indicator snapshot.
pub mod indicator;
/// Kalman gain schedule.
pub mod kalman;
/// Indicator polling and stop requests.
pub mod poll;
/// Scan state machine.
pub mod scanner;
/// Acquisition stepping.
pub mod session;
/// Timing registers.
pub mod timing;
/// Galvo waveform generation.
pub mod waveform;
