use openscan_core::fpga::Bitfile;

/// Behavior of [`FPGAEmulator`](super::emulator::FPGAEmulator), including injected faults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulatorOption {
    /// Signature of the loaded bitfile.
    pub signature: String,
    /// Reads of the frame acquisition finish indicator before a frame completes.
    pub frame_latency_polls: u32,
    /// Waveform memory capacity in words. If `None`, the capacity equals the programmed total element count.
    pub dram_capacity: Option<usize>,
    /// Words pushed after every frame.
    pub extra_words: usize,
    /// If set, only this many words of each frame reach the FIFO.
    pub stall_after: Option<usize>,
    /// State code observed after reset.
    pub state_after_reset: u16,
    /// Amplitude of the pixel noise.
    pub noise: u16,
    /// Seed of the pixel noise.
    pub seed: u64,
}

impl Default for EmulatorOption {
    fn default() -> Self {
        Self {
            signature: Bitfile::OPEN_SCAN_SIGNATURE.to_string(),
            frame_latency_polls: 0,
            dram_capacity: None,
            extra_words: 0,
            stall_after: None,
            state_after_reset: 0,
            noise: 64,
            seed: 0x05CA_11AB,
        }
    }
}
