use std::collections::HashMap;

/// Register file and waveform memory.
#[derive(Debug, Default)]
pub(crate) struct Memory {
    registers: HashMap<u32, u32>,
    dram: Vec<u32>,
}

impl Memory {
    pub fn get(&self, addr: u32) -> u32 {
        self.registers.get(&addr).copied().unwrap_or(0)
    }

    pub fn set(&mut self, addr: u32, value: u32) {
        self.registers.insert(addr, value);
    }

    pub fn flag(&self, addr: u32) -> bool {
        self.get(addr) != 0
    }

    pub fn set_flag(&mut self, addr: u32, value: bool) {
        self.set(addr, value as u32);
    }

    pub fn dram(&self) -> &[u32] {
        &self.dram
    }

    /// Appends up to `capacity` words in total and returns how many were dropped.
    pub fn fill_dram(&mut self, data: &[u32], capacity: usize) -> usize {
        let free = capacity.saturating_sub(self.dram.len());
        let n = free.min(data.len());
        self.dram.extend_from_slice(&data[..n]);
        data.len() - n
    }

    pub fn clear_dram(&mut self) {
        self.dram.clear();
    }

    pub fn clear(&mut self) {
        self.registers.clear();
        self.dram.clear();
    }
}
