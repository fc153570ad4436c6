use std::time::Duration;

use derive_more::{Deref, DerefMut};
use openscan_core::{
    fpga::{Bitfile, Fifo},
    link::{Link, LinkError},
};
use openscan_fpga_emulator::{EmulatorOption, FPGAEmulator};

/// A [`Link`] to an emulated scan FPGA.
///
/// The emulator renders a synthetic specimen along the uploaded waveform, so every scan parameter has a visible
/// effect on the images.
#[derive(Deref, DerefMut)]
pub struct Simulated {
    is_open: bool,
    #[deref]
    #[deref_mut]
    emulator: FPGAEmulator,
}

impl Simulated {
    /// Creates a new [`Simulated`].
    #[must_use]
    pub fn new(option: EmulatorOption) -> Self {
        Self {
            is_open: false,
            emulator: FPGAEmulator::new(option),
        }
    }

    fn ensure_open(&self) -> Result<(), LinkError> {
        if self.is_open {
            Ok(())
        } else {
            Err(super::invalid_session())
        }
    }
}

impl Default for Simulated {
    fn default() -> Self {
        Self::new(EmulatorOption::default())
    }
}

impl Link for Simulated {
    fn open(&mut self, bitfile: &Bitfile) -> Result<(), LinkError> {
        super::check_signature(bitfile, self.emulator.signature())?;
        self.is_open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), LinkError> {
        self.is_open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.is_open
    }

    fn reset(&mut self) -> Result<(), LinkError> {
        self.ensure_open()?;
        self.emulator.reset();
        Ok(())
    }

    fn read_bool(&mut self, addr: u32) -> Result<bool, LinkError> {
        self.ensure_open()?;
        Ok(self.emulator.read_register(addr) != 0)
    }

    fn write_bool(&mut self, addr: u32, value: bool) -> Result<(), LinkError> {
        self.ensure_open()?;
        self.emulator.write_register(addr, value as u32);
        Ok(())
    }

    fn read_u16(&mut self, addr: u32) -> Result<u16, LinkError> {
        self.ensure_open()?;
        Ok(self.emulator.read_register(addr) as u16)
    }

    fn write_u16(&mut self, addr: u32, value: u16) -> Result<(), LinkError> {
        self.ensure_open()?;
        self.emulator.write_register(addr, value as u32);
        Ok(())
    }

    fn read_i32(&mut self, addr: u32) -> Result<i32, LinkError> {
        self.ensure_open()?;
        Ok(self.emulator.read_register(addr) as i32)
    }

    fn write_i32(&mut self, addr: u32, value: i32) -> Result<(), LinkError> {
        self.ensure_open()?;
        self.emulator.write_register(addr, value as u32);
        Ok(())
    }

    fn read_u32(&mut self, addr: u32) -> Result<u32, LinkError> {
        self.ensure_open()?;
        Ok(self.emulator.read_register(addr))
    }

    fn write_u32(&mut self, addr: u32, value: u32) -> Result<(), LinkError> {
        self.ensure_open()?;
        self.emulator.write_register(addr, value);
        Ok(())
    }

    fn write_fifo(
        &mut self,
        fifo: Fifo,
        data: &[u32],
        _timeout: Duration,
    ) -> Result<usize, LinkError> {
        self.ensure_open()?;
        self.emulator.write_fifo(fifo, data)
    }

    fn read_fifo(
        &mut self,
        fifo: Fifo,
        data: &mut [u32],
        _timeout: Duration,
    ) -> Result<usize, LinkError> {
        self.ensure_open()?;
        self.emulator.read_fifo(fifo, data)
    }
}
