use std::time::Duration;

use getset::{CopyGetters, Getters, MutGetters};
use openscan_core::{
    fpga::{
        Bitfile, ControlBool, ControlI32, ControlU16, ControlU32, Fifo, IndicatorBool, ScanState,
    },
    link::{Link, RegisterIo},
    sleep::Sleep,
};

use crate::{
    config::ScanConfig,
    error::ScanDriverError,
    frame::{FrameBuffers, FrameReader, FrameReaderOption},
    indicator::HardwareIndicators,
    poll::{self, PollOption, StopToken},
    session::FrameStep,
    timing::ScanTiming,
    waveform::Waveform,
};

/// The option of [`Scanner`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScannerOption {
    /// FPGA image to open.
    pub bitfile: Bitfile,
    /// Polling of the frame acquisition finish indicator.
    pub poll: PollOption,
    /// Frame readback.
    pub reader: FrameReaderOption,
    /// Timeout of each waveform line written to the host-to-target FIFO.
    pub fifo_write_timeout: Duration,
}

impl Default for ScannerOption {
    fn default() -> Self {
        Self {
            bitfile: Bitfile::default(),
            poll: PollOption::default(),
            reader: FrameReaderOption::default(),
            fifo_write_timeout: Duration::from_secs(1),
        }
    }
}

/// Checks if the state machine may go from `from` to `to`.
#[must_use]
pub const fn is_allowed(from: ScanState, to: ScanState) -> bool {
    use ScanState::*;
    matches!(
        (from, to),
        (Idle, Init)
            | (Idle, Scan)
            | (Init, Write)
            | (Init, Stop)
            | (Write, Idle)
            | (Write, Stop)
            | (Scan, Blank)
            | (Scan, Done)
            | (Scan, Stop)
            | (Blank, Scan)
            | (Blank, Done)
            | (Blank, Stop)
            | (Done, Idle)
            | (Stop, Idle)
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LoadedScan {
    resolution: u32,
    first_sample: u32,
}

/// Drives the scan FPGA through its state sequence.
///
/// The scanner exclusively owns the hardware session. The waveform stays loaded across frames until
/// [`Scanner::load`] is called again or the FPGA is reset.
#[derive(Getters, MutGetters, CopyGetters)]
pub struct Scanner<L: Link, S: Sleep> {
    /// The link to the FPGA.
    #[getset(get = "pub", get_mut = "pub")]
    link: L,
    sleeper: S,
    /// The option.
    #[getset(get = "pub")]
    option: ScannerOption,
    /// Current state.
    #[getset(get_copy = "pub")]
    state: ScanState,
    loaded: Option<LoadedScan>,
}

impl<L: Link, S: Sleep> Scanner<L, S> {
    /// Opens the session and resets the FPGA.
    ///
    /// # Errors
    ///
    /// Fails if the link cannot be opened, or with [`ScanDriverError::UnexpectedStateAfterReset`] if the FPGA
    /// does not come back to [`ScanState::Idle`]. The link is closed again on failure.
    pub fn open(mut link: L, sleeper: S, option: ScannerOption) -> Result<Self, ScanDriverError> {
        tracing::info!("Opening session with {}", option.bitfile.name);
        link.open(&option.bitfile)?;
        let mut scanner = Self {
            link,
            sleeper,
            option,
            state: ScanState::Idle,
            loaded: None,
        };
        if let Err(e) = scanner.reset() {
            tracing::error!("Failed to reset FPGA: {}", e);
            let _ = scanner.link.close();
            return Err(e);
        }
        Ok(scanner)
    }

    /// Resets the FPGA. The waveform must be loaded again afterwards.
    pub fn reset(&mut self) -> Result<(), ScanDriverError> {
        self.loaded = None;
        self.link.reset()?;
        let code = self.link.read(ControlU16::Current)?;
        if code != ScanState::Idle.code() {
            return Err(ScanDriverError::UnexpectedStateAfterReset(code));
        }
        self.state = ScanState::Idle;
        self.link.start_fifo(Fifo::TargetToHost)?;
        tracing::debug!("FPGA reset");
        Ok(())
    }

    /// Checks if a waveform is loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Generates the waveform for `config`, uploads it and programs the timing registers.
    ///
    /// The waveform is generated before any register is written, so a [`ScanDriverError::WaveformOutOfRange`]
    /// leaves the hardware untouched.
    pub fn load(&mut self, config: &ScanConfig) -> Result<(), ScanDriverError> {
        let waveform = Waveform::from_config(config)?;
        let timing = ScanTiming::new(config, &waveform);

        tracing::info!(
            "Loading waveform: {}x{}, zoom {}, offset ({}, {}) V, {} MHz",
            config.resolution,
            config.resolution,
            config.zoom.value(),
            config.offset_x.volts(),
            config.offset_y.volts(),
            config.scan_rate.mhz()
        );
        self.loaded = None;
        self.init()?;
        self.write_waveform(&waveform)?;
        timing.program(&mut self.link)?;
        self.loaded = Some(LoadedScan {
            resolution: config.resolution.pixels(),
            first_sample: waveform.first_sample(),
        });
        Ok(())
    }

    /// Clears the handshake flags, disables the write paths and enters [`ScanState::Init`].
    pub fn init(&mut self) -> Result<(), ScanDriverError> {
        self.transition(ScanState::Init)?;
        self.link.write(ControlBool::Done, false)?;
        self.link.write(ControlBool::ReadyToScan, false)?;
        self.link.write(ControlBool::WriteDramEnable, false)?;
        self.link.write(ControlBool::WriteFrameGalvoSignal, false)?;
        Ok(())
    }

    /// Uploads `waveform` line by line and returns to [`ScanState::Idle`].
    ///
    /// # Errors
    ///
    /// Returns [`ScanDriverError::MemorySizeMismatch`] if the memory full indicator is set before the last line,
    /// or is not set after it.
    pub fn write_waveform(&mut self, waveform: &Waveform) -> Result<(), ScanDriverError> {
        self.transition(ScanState::Write)?;

        let lines = waveform.lines();
        let elements = waveform.elements_per_line();
        let total = waveform.total_elements();
        self.link.write(ControlU32::TotalElements, total as u32)?;
        self.link.write(ControlU32::NumOfElements, elements as u32)?;
        self.link.write(ControlI32::ElementsPerLine, elements as i32)?;
        self.link
            .write(ControlU32::MaxDramAddress, total.saturating_sub(1) as u32)?;
        self.link.write(ControlBool::WriteDramEnable, true)?;
        self.link.start_fifo(Fifo::HostToTarget)?;
        let written = self.upload(waveform);
        let stopped = self.link.stop_fifo(Fifo::HostToTarget);
        written?;
        stopped?;

        self.link.write(ControlBool::WriteDramEnable, false)?;
        tracing::debug!("Waveform written: {} lines of {} elements", lines, elements);
        self.transition(ScanState::Idle)
    }

    fn upload(&mut self, waveform: &Waveform) -> Result<(), ScanDriverError> {
        let lines = waveform.lines();
        let mut buf = Vec::with_capacity(waveform.elements_per_line());
        for line in 0..lines {
            buf.clear();
            buf.extend(waveform.packed_line(line));
            self.link
                .write_fifo(Fifo::HostToTarget, &buf, self.option.fifo_write_timeout)?;

            let full = self.link.read(IndicatorBool::WriteDramDone)?;
            if full != (line + 1 == lines) {
                return Err(ScanDriverError::MemorySizeMismatch {
                    line: line + 1,
                    lines,
                    full,
                });
            }
        }
        Ok(())
    }

    /// Scans one frame and reads it back.
    ///
    /// From [`ScanState::Idle`] the galvos are pre-positioned and the scan is armed first. Between frames of a
    /// session only the frame number and Kalman gain registers change. Ends in [`ScanState::Blank`], or back in
    /// [`ScanState::Idle`] after the last step.
    pub fn acquire_frame(
        &mut self,
        step: &FrameStep,
        stop: &StopToken,
    ) -> Result<FrameBuffers, ScanDriverError> {
        let loaded = self.loaded.ok_or(ScanDriverError::WaveformNotLoaded)?;

        self.link
            .write(ControlI32::FrameNumber, step.frame_number as i32)?;
        self.link.write(ControlU16::KalmanGain, step.gain.code())?;
        if self.state == ScanState::Idle {
            self.link.write(ControlU32::GalvoSignal, loaded.first_sample)?;
            self.link.write(ControlBool::WriteFrameGalvoSignal, true)?;
            self.link.write(ControlBool::WriteFrameGalvoSignal, false)?;
            self.link.write(ControlBool::ReadyToScan, true)?;
        }
        self.transition(ScanState::Scan)?;

        poll::wait_for(
            &mut self.link,
            &self.sleeper,
            IndicatorBool::FrameAcquisitionFinish,
            &self.option.poll,
            stop,
        )?;
        let frame = FrameReader::new(&mut self.link, &self.sleeper, self.option.reader)
            .read(loaded.resolution)?;
        tracing::debug!(
            "Frame {} (number {}, gain {}) read",
            step.frame_index,
            step.frame_number,
            step.gain
        );

        if step.last {
            self.transition(ScanState::Done)?;
            self.link.write(ControlBool::ReadyToScan, false)?;
            self.transition(ScanState::Idle)?;
        } else {
            self.transition(ScanState::Blank)?;
        }
        Ok(frame)
    }

    /// Halts the scan by de-asserting ready-to-scan and returns to [`ScanState::Idle`].
    ///
    /// Pixel data left over from an aborted frame is discarded, so the next frame starts on an empty FIFO.
    /// The state is not touched when idle.
    pub fn stop(&mut self) -> Result<(), ScanDriverError> {
        self.link.write(ControlBool::ReadyToScan, false)?;
        self.link.write(ControlBool::WriteDramEnable, false)?;
        match self.state {
            ScanState::Idle => {}
            ScanState::Done | ScanState::Stop => self.transition(ScanState::Idle)?,
            _ => {
                self.transition(ScanState::Stop)?;
                self.transition(ScanState::Idle)?;
            }
        }
        self.discard_readback()?;
        tracing::debug!("Scan stopped");
        Ok(())
    }

    fn discard_readback(&mut self) -> Result<(), ScanDriverError> {
        let remaining = self
            .link
            .read_fifo(Fifo::TargetToHost, &mut [], Duration::ZERO)?;
        if remaining > 0 {
            let mut discarded = vec![0u32; remaining];
            self.link.read_fifo(
                Fifo::TargetToHost,
                &mut discarded,
                self.option.reader.fifo_timeout,
            )?;
            tracing::debug!("Discarded {} elements left in FIFO", remaining);
        }
        self.link.stop_fifo(Fifo::TargetToHost)?;
        self.link.start_fifo(Fifo::TargetToHost)?;
        Ok(())
    }

    /// Stops the scan and closes the session.
    pub fn close(&mut self) -> Result<(), ScanDriverError> {
        if !self.link.is_open() {
            return Ok(());
        }
        let stopped = self.stop();
        self.link.close()?;
        tracing::info!("Session closed");
        stopped
    }

    /// Reads all hardware indicators.
    pub fn indicators(&mut self) -> Result<HardwareIndicators, ScanDriverError> {
        Ok(HardwareIndicators::read(&mut self.link)?)
    }

    fn transition(&mut self, to: ScanState) -> Result<(), ScanDriverError> {
        if !is_allowed(self.state, to) {
            return Err(ScanDriverError::InvalidStateTransition {
                from: self.state,
                to,
            });
        }
        self.link.write(ControlU16::Current, to.code())?;
        tracing::trace!("State {} -> {}", self.state, to);
        self.state = to;
        Ok(())
    }
}
