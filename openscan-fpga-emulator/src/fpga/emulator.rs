mod memory;
mod specimen;

use std::collections::VecDeque;

use getset::{CopyGetters, Getters, MutGetters};
use openscan_core::{
    fpga::{
        ControlBool, ControlI32, ControlU16, ControlU32, Fifo, IndicatorBool, IndicatorI32,
        IndicatorU32, ScanState,
    },
    link::{status, LinkError},
};

use memory::Memory;
use specimen::Specimen;

use super::option::EmulatorOption;

const CURRENT: u32 = ControlU16::Current as u32;
const KALMAN_GAIN: u32 = ControlU16::KalmanGain as u32;
const READY_TO_SCAN: u32 = ControlBool::ReadyToScan as u32;
const WRITE_DRAM_ENABLE: u32 = ControlBool::WriteDramEnable as u32;
const WRITE_FRAME_GALVO_SIGNAL: u32 = ControlBool::WriteFrameGalvoSignal as u32;
const FRAME_NUMBER: u32 = ControlI32::FrameNumber as u32;
const NUMBER_OF_FRAMES: u32 = ControlI32::NumberOfFrames as u32;
const RESOLUTION: u32 = ControlI32::Resolution as u32;
const ELEMENTS_PER_LINE: u32 = ControlI32::ElementsPerLine as u32;
const NUM_OF_UNDERSHOOT: u32 = ControlI32::NumOfUndershoot as u32;
const TOTAL_ELEMENTS: u32 = ControlU32::TotalElements as u32;
const GALVO_SIGNAL: u32 = ControlU32::GalvoSignal as u32;
const FRAME_ACQUISITION_FINISH: u32 = IndicatorBool::FrameAcquisitionFinish as u32;
const FRAME_IMAGING_DATA_AVERAGED: u32 = IndicatorBool::FrameImagingDataAveraged as u32;
const FRAME_WAVEFORM_OUTPUT_FINISH: u32 = IndicatorBool::FrameWaveformOutputFinish as u32;
const FRAME_GALVO_SIGNAL_WRITE_DONE: u32 = IndicatorBool::FrameGalvoSignalWriteDone as u32;
const IMAGE_AVERAGING_DONE: u32 = IndicatorBool::ImageAveragingDone as u32;
const WRITE_DRAM_DONE: u32 = IndicatorBool::WriteDramDone as u32;
const DISPLAY_FRAMES_DONE: u32 = IndicatorI32::DisplayFramesDone as u32;
const LOOP_COUNT: u32 = IndicatorI32::LoopCount as u32;
const AVERAGED_DATA_ADDRESS: u32 = IndicatorU32::AveragedDataAddress as u32;
const DATA: u32 = IndicatorU32::Data as u32;
const GALVO_SIGNAL_READ: u32 = IndicatorU32::GalvoSignalRead as u32;
const REQUEST_ADDRESS: u32 = IndicatorU32::RequestAddress as u32;

/// Registers latched when a frame is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRecord {
    /// Frame number within the Kalman group.
    pub frame_number: i32,
    /// Kalman gain code.
    pub kalman_gain: u16,
}

/// Emulates the OpenScan scan FPGA.
///
/// A frame armed by entering [`ScanState::Scan`] with ready-to-scan asserted completes after
/// [`EmulatorOption::frame_latency_polls`] reads of the frame acquisition finish indicator. The pixels are sampled
/// from a synthetic specimen at the galvo positions stored in the waveform memory.
#[derive(Getters, MutGetters, CopyGetters)]
pub struct FPGAEmulator {
    /// The option. Faults changed through it apply from the next frame on.
    #[getset(get = "pub", get_mut = "pub")]
    option: EmulatorOption,
    mem: Memory,
    to_host: VecDeque<u32>,
    averaged: Vec<f64>,
    pending: Option<u32>,
    /// Frames armed since reset.
    #[getset(get = "pub")]
    frames: Vec<FrameRecord>,
    /// Frames completed since reset.
    #[getset(get_copy = "pub")]
    completed_frames: usize,
    specimen: Specimen,
}

impl FPGAEmulator {
    /// Creates a new emulator in its reset state.
    #[must_use]
    pub fn new(option: EmulatorOption) -> Self {
        let mut emulator = Self {
            specimen: Specimen::new(option.seed, option.noise),
            option,
            mem: Memory::default(),
            to_host: VecDeque::new(),
            averaged: Vec::new(),
            pending: None,
            frames: Vec::new(),
            completed_frames: 0,
        };
        emulator.reset();
        emulator
    }

    /// Signature of the loaded bitfile.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.option.signature
    }

    /// Clears every register, both memories and the FIFO.
    pub fn reset(&mut self) {
        self.mem.clear();
        self.mem.set(CURRENT, self.option.state_after_reset as u32);
        self.to_host.clear();
        self.averaged.clear();
        self.pending = None;
        self.frames.clear();
        self.completed_frames = 0;
        self.specimen = Specimen::new(self.option.seed, self.option.noise);
    }

    /// Current state code.
    #[must_use]
    pub fn state_code(&self) -> u16 {
        self.mem.get(CURRENT) as u16
    }

    /// Checks if a frame is armed and not yet complete.
    #[must_use]
    pub fn is_scanning(&self) -> bool {
        self.pending.is_some()
    }

    /// Contents of the waveform memory.
    #[must_use]
    pub fn dram(&self) -> &[u32] {
        self.mem.dram()
    }

    /// Capacity of the waveform memory.
    #[must_use]
    pub fn dram_capacity(&self) -> usize {
        self.option
            .dram_capacity
            .unwrap_or(self.mem.get(TOTAL_ELEMENTS) as usize)
    }

    /// Number of elements in the target-to-host FIFO.
    #[must_use]
    pub fn fifo_len(&self) -> usize {
        self.to_host.len()
    }

    /// Reads a register. Reading the frame acquisition finish indicator advances an armed frame.
    pub fn read_register(&mut self, addr: u32) -> u32 {
        match addr {
            FRAME_ACQUISITION_FINISH => self.progress(),
            WRITE_DRAM_DONE => {
                let full = self.dram_full();
                self.mem.set_flag(WRITE_DRAM_DONE, full);
            }
            LOOP_COUNT => self.mem.set(LOOP_COUNT, self.mem.get(LOOP_COUNT).wrapping_add(1)),
            _ => {}
        }
        self.mem.get(addr)
    }

    /// Writes a register and runs its side effects.
    pub fn write_register(&mut self, addr: u32, value: u32) {
        self.mem.set(addr, value);
        match addr {
            CURRENT => self.enter(value as u16),
            READY_TO_SCAN if value == 0 => self.pending = None,
            WRITE_FRAME_GALVO_SIGNAL if value != 0 => {
                self.mem.set(GALVO_SIGNAL_READ, self.mem.get(GALVO_SIGNAL));
                self.mem.set_flag(FRAME_GALVO_SIGNAL_WRITE_DONE, true);
            }
            _ => {}
        }
    }

    /// Writes `data` to a host-to-target FIFO. Words beyond the memory capacity are dropped.
    ///
    /// Returns the empty space remaining.
    pub fn write_fifo(&mut self, fifo: Fifo, data: &[u32]) -> Result<usize, LinkError> {
        if fifo != Fifo::HostToTarget {
            return Err(LinkError::new(format!("FIFO {} is not host-to-target", fifo.id())));
        }
        if !self.mem.flag(WRITE_DRAM_ENABLE) {
            return Err(LinkError::with_status(
                status::FIFO_TIMEOUT,
                "waveform memory is not accepting writes",
            ));
        }
        let capacity = self.dram_capacity();
        let dropped = self.mem.fill_dram(data, capacity);
        if dropped > 0 {
            tracing::trace!("Waveform memory full, {} words dropped", dropped);
        }
        self.mem
            .set(REQUEST_ADDRESS, self.mem.dram().len().saturating_sub(1) as u32);
        Ok(capacity.saturating_sub(self.mem.dram().len()))
    }

    /// Fills `data` from a target-to-host FIFO.
    ///
    /// Returns the number of elements remaining.
    pub fn read_fifo(&mut self, fifo: Fifo, data: &mut [u32]) -> Result<usize, LinkError> {
        if fifo != Fifo::TargetToHost {
            return Err(LinkError::new(format!("FIFO {} is not target-to-host", fifo.id())));
        }
        if data.len() > self.to_host.len() {
            return Err(LinkError::with_status(
                status::FIFO_TIMEOUT,
                format!(
                    "{} elements requested, {} available",
                    data.len(),
                    self.to_host.len()
                ),
            ));
        }
        let n = data.len();
        data.iter_mut()
            .zip(self.to_host.drain(..n))
            .for_each(|(d, s)| *d = s);
        Ok(self.to_host.len())
    }

    fn dram_full(&self) -> bool {
        let capacity = self.dram_capacity();
        capacity > 0 && self.mem.dram().len() >= capacity
    }

    fn enter(&mut self, code: u16) {
        match ScanState::try_from(code) {
            Ok(ScanState::Init) => {
                self.mem.clear_dram();
                self.pending = None;
                self.clear_frame_flags();
            }
            Ok(ScanState::Write) => {}
            Ok(ScanState::Scan) => {
                if self.mem.flag(READY_TO_SCAN) {
                    self.arm();
                } else {
                    tracing::trace!("Scan entered without ready-to-scan");
                }
            }
            Ok(ScanState::Stop) => {
                self.pending = None;
                self.clear_frame_flags();
            }
            Ok(ScanState::Idle | ScanState::Blank | ScanState::Done) => self.clear_frame_flags(),
            Err(code) => tracing::warn!("Unknown state code: {}", code),
        }
    }

    fn clear_frame_flags(&mut self) {
        self.mem.set_flag(FRAME_ACQUISITION_FINISH, false);
        self.mem.set_flag(FRAME_IMAGING_DATA_AVERAGED, false);
        self.mem.set_flag(FRAME_WAVEFORM_OUTPUT_FINISH, false);
    }

    fn arm(&mut self) {
        self.clear_frame_flags();
        self.pending = Some(self.option.frame_latency_polls);
        self.frames.push(FrameRecord {
            frame_number: self.mem.get(FRAME_NUMBER) as i32,
            kalman_gain: self.mem.get(KALMAN_GAIN) as u16,
        });
    }

    fn progress(&mut self) {
        match self.pending {
            Some(0) => {
                self.pending = None;
                self.complete_frame();
            }
            Some(n) => self.pending = Some(n - 1),
            None => {}
        }
    }

    fn complete_frame(&mut self) {
        let resolution = self.mem.get(RESOLUTION) as usize;
        let elements = self.mem.get(ELEMENTS_PER_LINE) as usize;
        let undershoot = self.mem.get(NUM_OF_UNDERSHOOT) as usize;
        let gain = f64::from(self.mem.get(KALMAN_GAIN) as u16) / 32768.0;
        let pixels = resolution * resolution;
        if self.averaged.len() != pixels {
            self.averaged = vec![0.0; pixels];
        }

        let limit = self.option.stall_after.unwrap_or(pixels).min(pixels);
        let mut last = 0;
        (0..pixels).for_each(|i| {
            let (row, col) = (i / resolution, i % resolution);
            let word = self
                .mem
                .dram()
                .get(row * elements + undershoot + col)
                .copied()
                .unwrap_or(0);
            let raw = self.specimen.sample((word >> 16) as u16, word as u16);
            let avg = &mut self.averaged[i];
            *avg += gain * (f64::from(raw) - *avg);
            last = (u32::from(raw) << 16) | avg.round().clamp(0.0, u16::MAX as f64) as u32;
            if i < limit {
                self.to_host.push_back(last);
            }
        });
        self.to_host
            .extend(std::iter::repeat(0).take(self.option.extra_words));

        let frame_number = self.mem.get(FRAME_NUMBER) as i32;
        let number_of_frames = self.mem.get(NUMBER_OF_FRAMES) as i32;
        self.mem.set_flag(FRAME_ACQUISITION_FINISH, true);
        self.mem.set_flag(FRAME_IMAGING_DATA_AVERAGED, true);
        self.mem.set_flag(FRAME_WAVEFORM_OUTPUT_FINISH, true);
        self.mem
            .set_flag(IMAGE_AVERAGING_DONE, frame_number + 1 >= number_of_frames);
        self.mem.set(
            DISPLAY_FRAMES_DONE,
            self.mem.get(DISPLAY_FRAMES_DONE).wrapping_add(1),
        );
        self.mem
            .set(AVERAGED_DATA_ADDRESS, pixels.saturating_sub(1) as u32);
        self.mem.set(DATA, last);
        self.completed_frames += 1;
        tracing::trace!(
            "Frame completed: {} pixels, number {}, gain {}",
            pixels,
            frame_number,
            gain
        );
    }
}
