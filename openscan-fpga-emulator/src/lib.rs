pub mod fpga;

pub use fpga::{emulator::FPGAEmulator, option::EmulatorOption};
