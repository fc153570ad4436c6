use std::time::{Duration, Instant};

use derive_new::new;
use getset::{CopyGetters, Getters};
use openscan_core::{fpga::Fifo, link::Link, sleep::Sleep};

use crate::{config::Channel, error::ScanDriverError};

/// The option of [`FrameReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameReaderOption {
    /// The duration between two availability checks when the FIFO is empty.
    pub interval: Duration,
    /// Timeout passed to each FIFO read.
    pub fifo_timeout: Duration,
    /// If no element arrives for this long, the read fails. If `None`, the reader waits forever.
    pub stall_timeout: Option<Duration>,
    /// Maximum number of elements per FIFO read.
    pub max_chunk: usize,
}

impl Default for FrameReaderOption {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(5),
            fifo_timeout: Duration::from_secs(1),
            stall_timeout: Some(Duration::from_secs(5)),
            max_chunk: 1 << 16,
        }
    }
}

/// Raw and averaged samples of one frame.
#[derive(Debug, Clone, PartialEq, Eq, new, Getters, CopyGetters)]
pub struct FrameBuffers {
    /// Pixels per side.
    #[getset(get_copy = "pub")]
    resolution: u32,
    /// Samples of the latest frame.
    #[getset(get = "pub")]
    raw: Vec<u16>,
    /// Running average over the Kalman group.
    #[getset(get = "pub")]
    averaged: Vec<u16>,
}

impl FrameBuffers {
    /// Splits readback words into raw (high half) and averaged (low half) samples.
    #[must_use]
    pub fn from_words(resolution: u32, words: &[u32]) -> Self {
        let (raw, averaged) = words
            .iter()
            .map(|&w| ((w >> 16) as u16, (w & 0xFFFF) as u16))
            .unzip();
        Self {
            resolution,
            raw,
            averaged,
        }
    }

    /// Samples of `channel`.
    #[must_use]
    pub fn channel(&self, channel: Channel) -> &[u16] {
        match channel {
            Channel::Raw => &self.raw,
            Channel::Averaged => &self.averaged,
        }
    }
}

/// Drains one frame from the target-to-host FIFO.
pub struct FrameReader<'a, L: Link + ?Sized, S: Sleep> {
    link: &'a mut L,
    sleeper: &'a S,
    option: FrameReaderOption,
}

impl<'a, L: Link + ?Sized, S: Sleep> FrameReader<'a, L, S> {
    /// Creates a new [`FrameReader`].
    pub fn new(link: &'a mut L, sleeper: &'a S, option: FrameReaderOption) -> Self {
        Self {
            link,
            sleeper,
            option,
        }
    }

    /// Reads exactly `resolution²` words and splits them into a new [`FrameBuffers`].
    ///
    /// # Errors
    ///
    /// Returns [`ScanDriverError::DataLeftInFifoAfterReadingImage`] if the FIFO still holds elements afterwards,
    /// and [`ScanDriverError::FrameReadStalled`] if no element arrives within the stall timeout.
    pub fn read(&mut self, resolution: u32) -> Result<FrameBuffers, ScanDriverError> {
        let expected = resolution as usize * resolution as usize;
        let mut words = vec![0u32; expected];
        let mut read = 0;
        let mut last_progress = Instant::now();
        while read < expected {
            let available = self
                .link
                .read_fifo(Fifo::TargetToHost, &mut [], Duration::ZERO)?;
            if available == 0 {
                if let Some(stall_timeout) = self.option.stall_timeout {
                    if last_progress.elapsed() > stall_timeout {
                        return Err(ScanDriverError::FrameReadStalled { read, expected });
                    }
                }
                self.sleeper.sleep(self.option.interval);
                continue;
            }

            let chunk = available.min(expected - read).min(self.option.max_chunk.max(1));
            self.link.read_fifo(
                Fifo::TargetToHost,
                &mut words[read..read + chunk],
                self.option.fifo_timeout,
            )?;
            tracing::trace!("Read {} elements ({}/{})", chunk, read + chunk, expected);
            read += chunk;
            last_progress = Instant::now();
        }

        let remaining = self
            .link
            .read_fifo(Fifo::TargetToHost, &mut [], Duration::ZERO)?;
        if remaining != 0 {
            return Err(ScanDriverError::DataLeftInFifoAfterReadingImage(remaining));
        }

        Ok(FrameBuffers::from_words(resolution, &words))
    }
}
