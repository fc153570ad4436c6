use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::JoinHandle,
};

use async_channel::{Receiver, Sender};
use openscan_core::{
    fpga::ScanState,
    link::Link,
    sleep::{Sleep, StdSleeper},
};
use openscan_driver::{
    config::{
        Channel, ChannelMode, GalvoOffset, KalmanConfig, Resolution, Roi, ScanConfig, ScanRate,
        Zoom,
    },
    indicator::HardwareIndicators,
    poll::StopToken,
    scanner::{Scanner, ScannerOption},
    session::AcquisitionSession,
};

use crate::{
    error::OpenScanError,
    sequence::{Delivery, SequenceEvent, SequenceOutcome, SequenceWorker},
    sink::{ImageSink, BYTES_PER_PIXEL},
};

const EVENT_CAPACITY: usize = 64;

/// The option of [`OpenScan`].
#[derive(Debug, Clone, PartialEq)]
pub struct OpenScanOption {
    /// Device label used in image metadata.
    pub label: String,
    /// The option of the scanner.
    pub scanner: ScannerOption,
    /// Initial scan parameters.
    pub config: ScanConfig,
}

impl Default for OpenScanOption {
    fn default() -> Self {
        Self {
            label: "OpenScan".to_string(),
            scanner: ScannerOption::default(),
            config: ScanConfig::default(),
        }
    }
}

struct Worker<L: Link, S: Sleep> {
    handle: JoinHandle<(Scanner<L, S>, SequenceOutcome)>,
    // set by the worker before it publishes the terminal event
    finished: Arc<AtomicBool>,
}

impl<L: Link, S: Sleep> Worker<L, S> {
    fn is_running(&self) -> bool {
        !self.finished.load(Ordering::Acquire) && !self.handle.is_finished()
    }
}

/// A laser scanning microscope driven through the OpenScan FPGA.
///
/// Parameters may only change while no sequence is running; otherwise [`OpenScanError::Busy`] is returned. A
/// changed parameter marks the configuration dirty and the waveform is reloaded before the next acquisition.
pub struct OpenScan<L: Link + 'static, S: Sleep + Send + 'static = StdSleeper> {
    label: String,
    scanner: Option<Scanner<L, S>>,
    worker: Option<Worker<L, S>>,
    stop: StopToken,
    config: ScanConfig,
    roi: Option<Roi>,
    dirty: bool,
    snapped: Vec<Vec<u8>>,
    sink: Arc<dyn ImageSink>,
    events: (Sender<SequenceEvent>, Receiver<SequenceEvent>),
    last_outcome: Option<SequenceOutcome>,
}

impl<L: Link + 'static> OpenScan<L, StdSleeper> {
    /// Equivalent to [`Self::open_with_sleeper`] with [`StdSleeper`].
    pub fn open(
        link: L,
        sink: Arc<dyn ImageSink>,
        option: OpenScanOption,
    ) -> Result<Self, OpenScanError> {
        Self::open_with_sleeper(link, StdSleeper, sink, option)
    }
}

impl<L: Link + 'static, S: Sleep + Send + 'static> OpenScan<L, S> {
    /// Opens the hardware session and resets the FPGA.
    ///
    /// The waveform is loaded lazily by the first acquisition.
    pub fn open_with_sleeper(
        link: L,
        sleeper: S,
        sink: Arc<dyn ImageSink>,
        option: OpenScanOption,
    ) -> Result<Self, OpenScanError> {
        let scanner = Scanner::open(link, sleeper, option.scanner)?;
        tracing::info!("{} initialized", option.label);
        Ok(Self {
            label: option.label,
            scanner: Some(scanner),
            worker: None,
            stop: StopToken::new(),
            config: option.config,
            roi: None,
            dirty: true,
            snapped: Vec::new(),
            sink,
            events: async_channel::bounded(EVENT_CAPACITY),
            last_outcome: None,
        })
    }

    /// Device label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Current scan parameters.
    #[must_use]
    pub const fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Checks if the waveform must be reloaded before the next acquisition.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replaces every scan parameter.
    pub fn set_config(&mut self, config: ScanConfig) -> Result<(), OpenScanError> {
        let resolution = self.config.resolution;
        self.update(|c| *c = config)?;
        if config.resolution != resolution {
            self.roi = None;
        }
        Ok(())
    }

    /// Pixel rate.
    #[must_use]
    pub const fn scan_rate(&self) -> ScanRate {
        self.config.scan_rate
    }

    /// Sets the pixel rate.
    pub fn set_scan_rate(&mut self, scan_rate: ScanRate) -> Result<(), OpenScanError> {
        self.update(|c| c.scan_rate = scan_rate)
    }

    /// Pixels per side.
    #[must_use]
    pub const fn resolution(&self) -> Resolution {
        self.config.resolution
    }

    /// Sets the resolution. A changed resolution clears the ROI.
    pub fn set_resolution(&mut self, resolution: Resolution) -> Result<(), OpenScanError> {
        let changed = resolution != self.config.resolution;
        self.update(|c| c.resolution = resolution)?;
        if changed {
            self.roi = None;
        }
        Ok(())
    }

    /// Zoom factor.
    #[must_use]
    pub const fn zoom(&self) -> Zoom {
        self.config.zoom
    }

    /// Sets the zoom factor.
    pub fn set_zoom(&mut self, zoom: Zoom) -> Result<(), OpenScanError> {
        self.update(|c| c.zoom = zoom)
    }

    /// Galvo offset of the fast axis.
    #[must_use]
    pub const fn offset_x(&self) -> GalvoOffset {
        self.config.offset_x
    }

    /// Sets the galvo offset of the fast axis.
    pub fn set_offset_x(&mut self, offset: GalvoOffset) -> Result<(), OpenScanError> {
        self.update(|c| c.offset_x = offset)
    }

    /// Galvo offset of the slow axis.
    #[must_use]
    pub const fn offset_y(&self) -> GalvoOffset {
        self.config.offset_y
    }

    /// Sets the galvo offset of the slow axis.
    pub fn set_offset_y(&mut self, offset: GalvoOffset) -> Result<(), OpenScanError> {
        self.update(|c| c.offset_y = offset)
    }

    /// Channels delivered to the host.
    #[must_use]
    pub const fn channel_mode(&self) -> ChannelMode {
        self.config.channel_mode
    }

    /// Sets the delivered channels. The waveform does not depend on it.
    pub fn set_channel_mode(&mut self, channel_mode: ChannelMode) -> Result<(), OpenScanError> {
        self.ensure_idle()?;
        self.config.channel_mode = channel_mode;
        Ok(())
    }

    /// Frame averaging.
    #[must_use]
    pub const fn kalman(&self) -> KalmanConfig {
        self.config.kalman
    }

    /// Sets the number of frames per Kalman group.
    pub fn set_kalman_frames(&mut self, frames: u32) -> Result<(), OpenScanError> {
        let kalman = self.config.kalman.with_frames(frames)?;
        self.update(|c| c.kalman = kalman)
    }

    /// Delivers every frame instead of one per Kalman group.
    pub fn set_kalman_progressive(&mut self, progressive: bool) -> Result<(), OpenScanError> {
        let kalman = self.config.kalman.with_progressive(progressive);
        self.update(|c| c.kalman = kalman)
    }

    /// Sets the filter gain.
    pub fn set_filter_gain(&mut self, gain: f64) -> Result<(), OpenScanError> {
        let kalman = self.config.kalman.with_filter_gain(gain)?;
        self.update(|c| c.kalman = kalman)
    }

    /// Magnification relative to the default resolution at zoom 1.0.
    #[must_use]
    pub fn magnification(&self) -> f64 {
        self.config.magnification()
    }

    /// Region of interest, if any.
    #[must_use]
    pub const fn roi(&self) -> Option<Roi> {
        self.roi
    }

    /// Restricts delivered and snapped images to a region of the current resolution.
    pub fn set_roi(
        &mut self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Result<(), OpenScanError> {
        self.ensure_idle()?;
        self.roi = Some(Roi::new(x, y, width, height, self.config.resolution.pixels())?);
        Ok(())
    }

    /// Restores the full frame.
    pub fn clear_roi(&mut self) -> Result<(), OpenScanError> {
        self.ensure_idle()?;
        self.roi = None;
        Ok(())
    }

    /// Image width in pixels.
    #[must_use]
    pub fn image_width(&self) -> u32 {
        self.roi
            .map_or(self.config.resolution.pixels(), |roi| roi.width())
    }

    /// Image height in pixels.
    #[must_use]
    pub fn image_height(&self) -> u32 {
        self.roi
            .map_or(self.config.resolution.pixels(), |roi| roi.height())
    }

    /// Bytes per pixel.
    #[must_use]
    pub const fn bytes_per_pixel(&self) -> usize {
        BYTES_PER_PIXEL
    }

    /// Significant bits per pixel.
    #[must_use]
    pub const fn bit_depth(&self) -> u32 {
        16
    }

    /// Components per pixel.
    #[must_use]
    pub const fn number_of_components(&self) -> u32 {
        1
    }

    /// Binning. Always 1.
    #[must_use]
    pub const fn binning(&self) -> u32 {
        1
    }

    /// Exposure. Pixel dwell is set by the scan rate, so this is always 0.
    #[must_use]
    pub const fn exposure(&self) -> f64 {
        0.0
    }

    /// Number of delivered channels.
    #[must_use]
    pub const fn number_of_channels(&self) -> usize {
        self.config.channel_mode.channels().len()
    }

    /// Channel at `index`.
    #[must_use]
    pub fn channel(&self, index: usize) -> Option<Channel> {
        self.config.channel_mode.channels().get(index).copied()
    }

    /// Name of the channel at `index`.
    #[must_use]
    pub fn channel_name(&self, index: usize) -> Option<String> {
        self.channel(index).map(|c| c.to_string())
    }

    /// Size of one channel image in bytes.
    #[must_use]
    pub fn image_buffer_size(&self) -> usize {
        self.image_width() as usize * self.image_height() as usize * BYTES_PER_PIXEL
    }

    /// Acquires one frame, averaged over a full Kalman group, and caches it per channel.
    ///
    /// The previous snap is discarded first, so a failed snap leaves no image behind.
    pub fn snap_image(&mut self) -> Result<(), OpenScanError> {
        self.ensure_idle()?;
        self.snapped.clear();
        self.prepare()?;

        let session = AcquisitionSession::snap(&self.config.kalman);
        let stop = StopToken::new();
        let scanner = self.idle_scanner()?;
        let mut frame = None;
        for step in session {
            match scanner.acquire_frame(&step, &stop) {
                Ok(f) => frame = Some(f),
                Err(e) => {
                    if let Err(stop_err) = scanner.stop() {
                        tracing::warn!("Failed to stop scan: {}", stop_err);
                    }
                    return Err(e.into());
                }
            }
        }

        if let Some(frame) = frame {
            self.snapped = self
                .delivery()
                .images(&frame)
                .iter()
                .map(|image| image.to_le_bytes())
                .collect();
        }
        Ok(())
    }

    /// Little-endian pixels of the last snap for the channel at `channel`.
    ///
    /// Returns `None` for an unknown channel or when nothing has been snapped.
    #[must_use]
    pub fn image_buffer(&self, channel: usize) -> Option<&[u8]> {
        self.snapped.get(channel).map(Vec::as_slice)
    }

    /// Starts delivering `count` frames to the sink on a dedicated thread.
    ///
    /// A `count` of 0 does nothing. If `stop_on_overflow` is `false`, an overflowing sink is cleared and the
    /// insertion retried once.
    ///
    /// # Errors
    ///
    /// Returns [`OpenScanError::Busy`] if a sequence is running, or the error of the waveform reload.
    pub fn start_sequence_acquisition(
        &mut self,
        count: u64,
        stop_on_overflow: bool,
    ) -> Result<(), OpenScanError> {
        self.ensure_idle()?;
        if count == 0 {
            return Ok(());
        }
        self.prepare()?;

        let scanner = self.scanner.take().ok_or(OpenScanError::NotInitialized)?;
        self.stop = StopToken::new();
        let finished = Arc::new(AtomicBool::new(false));
        let worker = SequenceWorker {
            scanner,
            session: AcquisitionSession::sequence(count, &self.config.kalman, stop_on_overflow),
            delivery: self.delivery(),
            sink: self.sink.clone(),
            stop: self.stop.clone(),
            events: self.events.0.clone(),
            finished: finished.clone(),
        };
        tracing::info!("Starting sequence acquisition of {} frames", count);
        self.worker = Some(Worker {
            handle: std::thread::spawn(move || worker.run()),
            finished,
        });
        Ok(())
    }

    /// Starts delivering frames until stopped. A full sink is cleared.
    pub fn start_continuous_acquisition(&mut self) -> Result<(), OpenScanError> {
        self.start_sequence_acquisition(u64::MAX, false)
    }

    /// Requests the running sequence to stop, and waits for its thread if `wait` is `true`.
    ///
    /// Does nothing if no sequence is running.
    pub fn stop_sequence_acquisition(&mut self, wait: bool) -> Result<(), OpenScanError> {
        if self.worker.is_none() {
            return Ok(());
        }
        self.stop.request();
        tracing::debug!("Sequence stop requested");
        if wait {
            self.join()
        } else {
            Ok(())
        }
    }

    /// Checks if a sequence is running.
    ///
    /// Turns `false` before [`SequenceEvent::Finished`] is published, so a host may start the next
    /// acquisition as soon as it receives that event.
    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.worker.as_ref().is_some_and(Worker::is_running)
    }

    /// Outcome of the last finished sequence.
    pub fn last_outcome(&mut self) -> Option<&SequenceOutcome> {
        if !self.is_capturing() {
            let _ = self.join();
        }
        self.last_outcome.as_ref()
    }

    /// A receiver of [`SequenceEvent`]s. Only the latest events are kept if nobody receives them.
    #[must_use]
    pub fn events(&self) -> Receiver<SequenceEvent> {
        self.events.1.clone()
    }

    /// Reads all hardware indicators.
    pub fn debug_indicators(&mut self) -> Result<HardwareIndicators, OpenScanError> {
        Ok(self.idle_scanner()?.indicators()?)
    }

    /// Stops a running sequence and closes the hardware session.
    pub fn close(mut self) -> Result<(), OpenScanError> {
        self.close_impl()
    }

    fn close_impl(&mut self) -> Result<(), OpenScanError> {
        self.stop_sequence_acquisition(true)?;
        if let Some(mut scanner) = self.scanner.take() {
            scanner.close()?;
            tracing::info!("{} closed", self.label);
        }
        Ok(())
    }

    fn delivery(&self) -> Delivery {
        Delivery {
            label: self.label.clone(),
            channel_mode: self.config.channel_mode,
            roi: self.roi,
        }
    }

    fn update(&mut self, f: impl FnOnce(&mut ScanConfig)) -> Result<(), OpenScanError> {
        self.ensure_idle()?;
        let prev = self.config;
        f(&mut self.config);
        if self.config != prev {
            self.dirty = true;
        }
        Ok(())
    }

    fn ensure_idle(&mut self) -> Result<(), OpenScanError> {
        self.idle_scanner().map(|_| ())
    }

    fn idle_scanner(&mut self) -> Result<&mut Scanner<L, S>, OpenScanError> {
        if self.is_capturing() {
            return Err(OpenScanError::Busy);
        }
        self.join()?;
        self.scanner.as_mut().ok_or(OpenScanError::NotInitialized)
    }

    /// Brings the scanner back to idle after an aborted acquisition and reloads the waveform if needed.
    fn prepare(&mut self) -> Result<(), OpenScanError> {
        let config = self.config;
        let dirty = self.dirty;
        let scanner = self.idle_scanner()?;
        if scanner.state() != ScanState::Idle {
            scanner.stop()?;
        }
        if dirty || !scanner.is_loaded() {
            if let Err(e) = scanner.load(&config) {
                if scanner.state() != ScanState::Idle {
                    if let Err(stop_err) = scanner.stop() {
                        tracing::warn!("Failed to stop scan: {}", stop_err);
                    }
                }
                return Err(e.into());
            }
            self.dirty = false;
        }
        Ok(())
    }

    fn join(&mut self) -> Result<(), OpenScanError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        match worker.handle.join() {
            Ok((scanner, outcome)) => {
                self.scanner = Some(scanner);
                self.last_outcome = Some(outcome);
                Ok(())
            }
            Err(_) => {
                tracing::error!("Acquisition thread panicked");
                self.last_outcome = Some(SequenceOutcome::Failed {
                    frames: 0,
                    error: OpenScanError::AcquisitionThreadPanicked,
                });
                Err(OpenScanError::AcquisitionThreadPanicked)
            }
        }
    }
}

impl<L: Link + 'static, S: Sleep + Send + 'static> Drop for OpenScan<L, S> {
    fn drop(&mut self) {
        if self.is_capturing() {
            tracing::warn!("{} dropped while a sequence is running", self.label);
        }
        // GRCOV_EXCL_START
        if let Err(e) = self.close_impl() {
            tracing::warn!("Failed to close {}: {}", self.label, e);
        }
        // GRCOV_EXCL_STOP
    }
}
