use std::time::Duration;

use crate::fpga::{Bitfile, Fifo};

use super::error::LinkError;

/// A trait that provides the interface with the scan FPGA.
///
/// Registers are addressed by their raw offset. Use [`RegisterIo`] for typed access through the register map.
///
/// [`RegisterIo`]: super::RegisterIo
pub trait Link: Send {
    /// Opens a session on the target running `bitfile`.
    ///
    /// Fails if the signature of the bitfile on the target does not match.
    fn open(&mut self, bitfile: &Bitfile) -> Result<(), LinkError>;

    /// Closes the session.
    fn close(&mut self) -> Result<(), LinkError>;

    /// Checks if the link is open.
    #[must_use]
    fn is_open(&self) -> bool;

    /// Resets the FPGA to its default state.
    fn reset(&mut self) -> Result<(), LinkError>;

    /// Reads a boolean register.
    fn read_bool(&mut self, addr: u32) -> Result<bool, LinkError>;

    /// Writes a boolean register.
    fn write_bool(&mut self, addr: u32, value: bool) -> Result<(), LinkError>;

    /// Reads an unsigned 16-bit register.
    fn read_u16(&mut self, addr: u32) -> Result<u16, LinkError>;

    /// Writes an unsigned 16-bit register.
    fn write_u16(&mut self, addr: u32, value: u16) -> Result<(), LinkError>;

    /// Reads a signed 32-bit register.
    fn read_i32(&mut self, addr: u32) -> Result<i32, LinkError>;

    /// Writes a signed 32-bit register.
    fn write_i32(&mut self, addr: u32, value: i32) -> Result<(), LinkError>;

    /// Reads an unsigned 32-bit register.
    fn read_u32(&mut self, addr: u32) -> Result<u32, LinkError>;

    /// Writes an unsigned 32-bit register.
    fn write_u32(&mut self, addr: u32, value: u32) -> Result<(), LinkError>;

    /// Starts a DMA FIFO.
    fn start_fifo(&mut self, _fifo: Fifo) -> Result<(), LinkError> {
        Ok(())
    }

    /// Stops a DMA FIFO.
    fn stop_fifo(&mut self, _fifo: Fifo) -> Result<(), LinkError> {
        Ok(())
    }

    /// Writes all of `data` to a host-to-target FIFO, waiting up to `timeout` for space.
    ///
    /// Returns the number of empty elements remaining in the FIFO.
    fn write_fifo(&mut self, fifo: Fifo, data: &[u32], timeout: Duration)
        -> Result<usize, LinkError>;

    /// Fills `data` from a target-to-host FIFO, waiting up to `timeout` for enough elements.
    ///
    /// Returns the number of elements remaining in the FIFO. An empty `data` only queries that number.
    fn read_fifo(
        &mut self,
        fifo: Fifo,
        data: &mut [u32],
        timeout: Duration,
    ) -> Result<usize, LinkError>;
}

impl Link for Box<dyn Link> {
    fn open(&mut self, bitfile: &Bitfile) -> Result<(), LinkError> {
        self.as_mut().open(bitfile)
    }

    fn close(&mut self) -> Result<(), LinkError> {
        self.as_mut().close()
    }

    fn is_open(&self) -> bool {
        self.as_ref().is_open()
    }

    fn reset(&mut self) -> Result<(), LinkError> {
        self.as_mut().reset()
    }

    fn read_bool(&mut self, addr: u32) -> Result<bool, LinkError> {
        self.as_mut().read_bool(addr)
    }

    fn write_bool(&mut self, addr: u32, value: bool) -> Result<(), LinkError> {
        self.as_mut().write_bool(addr, value)
    }

    fn read_u16(&mut self, addr: u32) -> Result<u16, LinkError> {
        self.as_mut().read_u16(addr)
    }

    fn write_u16(&mut self, addr: u32, value: u16) -> Result<(), LinkError> {
        self.as_mut().write_u16(addr, value)
    }

    fn read_i32(&mut self, addr: u32) -> Result<i32, LinkError> {
        self.as_mut().read_i32(addr)
    }

    fn write_i32(&mut self, addr: u32, value: i32) -> Result<(), LinkError> {
        self.as_mut().write_i32(addr, value)
    }

    fn read_u32(&mut self, addr: u32) -> Result<u32, LinkError> {
        self.as_mut().read_u32(addr)
    }

    fn write_u32(&mut self, addr: u32, value: u32) -> Result<(), LinkError> {
        self.as_mut().write_u32(addr, value)
    }

    fn start_fifo(&mut self, fifo: Fifo) -> Result<(), LinkError> {
        self.as_mut().start_fifo(fifo)
    }

    fn stop_fifo(&mut self, fifo: Fifo) -> Result<(), LinkError> {
        self.as_mut().stop_fifo(fifo)
    }

    fn write_fifo(
        &mut self,
        fifo: Fifo,
        data: &[u32],
        timeout: Duration,
    ) -> Result<usize, LinkError> {
        self.as_mut().write_fifo(fifo, data, timeout)
    }

    fn read_fifo(
        &mut self,
        fifo: Fifo,
        data: &mut [u32],
        timeout: Duration,
    ) -> Result<usize, LinkError> {
        self.as_mut().read_fifo(fifo, data, timeout)
    }
}
