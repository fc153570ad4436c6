use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use openscan_core::{
    fpga::{Bitfile, Fifo},
    link::{Link, LinkError},
};
use openscan_fpga_emulator::{EmulatorOption, FPGAEmulator};

#[derive(Debug, Default, Clone)]
#[doc(hidden)]
pub struct AuditOption {
    pub emulator: EmulatorOption,
    pub broken: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[doc(hidden)]
pub struct RegisterWrite {
    pub addr: u32,
    pub value: u32,
}

struct AuditState {
    is_open: bool,
    broken: bool,
    emulator: FPGAEmulator,
    writes: Vec<RegisterWrite>,
}

/// Clones share the same emulator, so a test can keep a handle while a device owns the link.
#[derive(Clone)]
#[doc(hidden)]
pub struct Audit {
    option: AuditOption,
    state: Arc<Mutex<AuditState>>,
}

impl Audit {
    pub fn new(option: AuditOption) -> Self {
        Self {
            state: Arc::new(Mutex::new(AuditState {
                is_open: false,
                broken: false,
                emulator: FPGAEmulator::new(option.emulator.clone()),
                writes: Vec::new(),
            })),
            option,
        }
    }

    pub fn break_down(&self) {
        self.lock().broken = true;
    }

    pub fn repair(&self) {
        self.lock().broken = false;
    }

    pub fn writes(&self) -> Vec<RegisterWrite> {
        self.lock().writes.clone()
    }

    pub fn writes_to(&self, addr: u32) -> Vec<u32> {
        self.lock()
            .writes
            .iter()
            .filter(|w| w.addr == addr)
            .map(|w| w.value)
            .collect()
    }

    pub fn clear_writes(&self) {
        self.lock().writes.clear();
    }

    pub fn with_emulator<R>(&self, f: impl FnOnce(&mut FPGAEmulator) -> R) -> R {
        f(&mut self.lock().emulator)
    }

    fn lock(&self) -> MutexGuard<'_, AuditState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn io<R>(&self, f: impl FnOnce(&mut AuditState) -> R) -> Result<R, LinkError> {
        let mut state = self.lock();
        if state.broken {
            return Err(LinkError::new("broken"));
        }
        if !state.is_open {
            return Err(super::invalid_session());
        }
        Ok(f(&mut state))
    }

    fn write(&self, addr: u32, value: u32) -> Result<(), LinkError> {
        self.io(|state| {
            state.writes.push(RegisterWrite { addr, value });
            state.emulator.write_register(addr, value);
        })
    }

    fn read(&self, addr: u32) -> Result<u32, LinkError> {
        self.io(|state| state.emulator.read_register(addr))
    }
}

impl Link for Audit {
    fn open(&mut self, bitfile: &Bitfile) -> Result<(), LinkError> {
        let mut state = self.lock();
        super::check_signature(bitfile, state.emulator.signature())?;
        state.is_open = true;
        state.broken = self.option.broken;
        Ok(())
    }

    fn close(&mut self) -> Result<(), LinkError> {
        self.lock().is_open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.lock().is_open
    }

    fn reset(&mut self) -> Result<(), LinkError> {
        self.io(|state| state.emulator.reset())
    }

    fn read_bool(&mut self, addr: u32) -> Result<bool, LinkError> {
        self.read(addr).map(|v| v != 0)
    }

    fn write_bool(&mut self, addr: u32, value: bool) -> Result<(), LinkError> {
        self.write(addr, value as u32)
    }

    fn read_u16(&mut self, addr: u32) -> Result<u16, LinkError> {
        self.read(addr).map(|v| v as u16)
    }

    fn write_u16(&mut self, addr: u32, value: u16) -> Result<(), LinkError> {
        self.write(addr, value as u32)
    }

    fn read_i32(&mut self, addr: u32) -> Result<i32, LinkError> {
        self.read(addr).map(|v| v as i32)
    }

    fn write_i32(&mut self, addr: u32, value: i32) -> Result<(), LinkError> {
        self.write(addr, value as u32)
    }

    fn read_u32(&mut self, addr: u32) -> Result<u32, LinkError> {
        self.read(addr)
    }

    fn write_u32(&mut self, addr: u32, value: u32) -> Result<(), LinkError> {
        self.write(addr, value)
    }

    fn write_fifo(
        &mut self,
        fifo: Fifo,
        data: &[u32],
        _timeout: Duration,
    ) -> Result<usize, LinkError> {
        self.io(|state| state.emulator.write_fifo(fifo, data))?
    }

    fn read_fifo(
        &mut self,
        fifo: Fifo,
        data: &mut [u32],
        _timeout: Duration,
    ) -> Result<usize, LinkError> {
        self.io(|state| state.emulator.read_fifo(fifo, data))?
    }
}
