use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_channel::Sender;
use openscan_core::{link::Link, sleep::Sleep};
use openscan_driver::{
    config::{ChannelMode, Roi},
    error::ScanDriverError,
    frame::FrameBuffers,
    poll::StopToken,
    scanner::Scanner,
    session::AcquisitionSession,
};

use crate::{
    error::OpenScanError,
    sink::{Image, ImageSink, Metadata, SinkError},
};

/// Event published while a sequence acquisition runs.
#[derive(Debug, Clone, PartialEq)]
pub enum SequenceEvent {
    /// The frame with `index` has been inserted into the sink.
    FrameDelivered {
        /// Index of the frame within the sequence.
        index: u64,
    },
    /// The sequence has ended.
    Finished(SequenceOutcome),
}

/// How a sequence acquisition ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SequenceOutcome {
    /// Every requested frame was delivered.
    Completed {
        /// Delivered frames.
        frames: u64,
    },
    /// A stop was requested.
    Stopped {
        /// Delivered frames.
        frames: u64,
    },
    /// The sequence was aborted by an error.
    Failed {
        /// Delivered frames.
        frames: u64,
        /// The error.
        error: OpenScanError,
    },
}

impl SequenceOutcome {
    /// Number of frames delivered before the sequence ended.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        match self {
            Self::Completed { frames } | Self::Stopped { frames } | Self::Failed { frames, .. } => {
                *frames
            }
        }
    }
}

/// Turns frames into the images handed to the host.
#[derive(Debug, Clone)]
pub(crate) struct Delivery {
    pub label: String,
    pub channel_mode: ChannelMode,
    pub roi: Option<Roi>,
}

impl Delivery {
    pub fn images(&self, frame: &FrameBuffers) -> Vec<Image> {
        let resolution = frame.resolution();
        let (width, height) = self
            .roi
            .map_or((resolution, resolution), |roi| (roi.width(), roi.height()));
        self.channel_mode
            .channels()
            .iter()
            .enumerate()
            .map(|(index, &channel)| {
                let pixels = frame.channel(channel);
                let pixels = match self.roi {
                    Some(roi) => roi.crop(pixels, resolution),
                    None => pixels.to_vec(),
                };
                Image::new(
                    width,
                    height,
                    pixels,
                    Metadata::for_channel(&self.label, index, channel),
                )
            })
            .collect()
    }
}

/// Runs a sequence on its own thread. Owns the scanner until the sequence ends.
pub(crate) struct SequenceWorker<L: Link, S: Sleep> {
    pub scanner: Scanner<L, S>,
    pub session: AcquisitionSession,
    pub delivery: Delivery,
    pub sink: Arc<dyn ImageSink>,
    pub stop: StopToken,
    pub events: Sender<SequenceEvent>,
    pub finished: Arc<AtomicBool>,
}

impl<L: Link, S: Sleep> SequenceWorker<L, S> {
    pub fn run(mut self) -> (Scanner<L, S>, SequenceOutcome) {
        let mut frames = 0;
        let outcome = match self.acquire_all(&mut frames) {
            Ok(()) => SequenceOutcome::Completed { frames },
            Err(OpenScanError::Driver(ScanDriverError::Cancelled)) => {
                SequenceOutcome::Stopped { frames }
            }
            Err(error) => {
                tracing::error!("Sequence aborted after {} frames: {}", frames, error);
                SequenceOutcome::Failed { frames, error }
            }
        };

        if let Err(e) = self.scanner.stop() {
            tracing::warn!("Failed to stop scan: {}", e);
        }
        tracing::info!("Sequence finished: {:?}", outcome);
        self.finished.store(true, Ordering::Release);
        self.publish(SequenceEvent::Finished(outcome.clone()));
        (self.scanner, outcome)
    }

    fn acquire_all(&mut self, frames: &mut u64) -> Result<(), OpenScanError> {
        while let Some(step) = self.session.next() {
            if self.stop.is_requested() {
                return Err(ScanDriverError::Cancelled.into());
            }
            let frame = self.scanner.acquire_frame(&step, &self.stop)?;
            if step.deliver {
                self.insert(&self.delivery.images(&frame))?;
                *frames += 1;
                self.publish(SequenceEvent::FrameDelivered {
                    index: step.frame_index,
                });
            }
        }
        Ok(())
    }

    fn insert(&self, images: &[Image]) -> Result<(), OpenScanError> {
        match self.sink.insert_frame(images) {
            Err(SinkError::Overflow) if !self.session.stop_on_overflow() => {
                tracing::warn!("Image sink overflowed, clearing and retrying");
                self.sink.clear();
                Ok(self.sink.insert_frame(images)?)
            }
            r => Ok(r?),
        }
    }

    fn publish(&self, event: SequenceEvent) {
        if let Err(e) = self.events.force_send(event) {
            tracing::trace!("Sequence event dropped: {:?}", e.into_inner());
        }
    }
}
