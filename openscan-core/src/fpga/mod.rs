mod bitfile;
mod register;
mod state;

pub use bitfile::Bitfile;
pub use register::*;
pub use state::ScanState;

/// Base clock of the scan FPGA in Hz.
pub const FPGA_CLOCK_HZ: u32 = 40_000_000;

/// DMA FIFOs of the scan FPGA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Fifo {
    /// Pixel readback. Each word holds a raw sample in the high half and the averaged sample in the low half.
    TargetToHost = 0,
    /// Waveform upload. Each word holds an X code in the high half and a Y code in the low half.
    HostToTarget = 1,
}

impl Fifo {
    /// The FIFO number on the target.
    #[must_use]
    pub const fn id(self) -> u32 {
        self as u32
    }
}
