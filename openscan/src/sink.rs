use std::{
    collections::{BTreeMap, VecDeque},
    sync::{Mutex, MutexGuard, PoisonError},
};

use derive_more::{Deref, DerefMut};
use getset::{CopyGetters, Getters};
use openscan_driver::config::Channel;
use thiserror::Error;

/// Bytes per pixel of every delivered image.
pub const BYTES_PER_PIXEL: usize = 2;

/// An error reported by an [`ImageSink`].
#[derive(Error, Debug, PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum SinkError {
    /// The sink has no room for another image.
    #[error("Sink is full")]
    Overflow,
    /// The sink refused the image.
    #[error("{0}")]
    Rejected(String),
}

/// Tags attached to a delivered image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, DerefMut)]
pub struct Metadata(BTreeMap<String, String>);

impl Metadata {
    /// Channel tags of `channel` at `index`, plain and prefixed with the device `label`.
    #[must_use]
    pub fn for_channel(label: &str, index: usize, channel: Channel) -> Self {
        let mut tags = BTreeMap::new();
        tags.insert("CameraChannelIndex".to_string(), index.to_string());
        tags.insert("CameraChannelName".to_string(), channel.to_string());
        tags.insert(format!("{label}-CameraChannelIndex"), index.to_string());
        tags.insert(format!("{label}-CameraChannelName"), channel.to_string());
        Self(tags)
    }
}

/// One channel of a delivered frame.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct Image {
    /// Width in pixels.
    #[getset(get_copy = "pub")]
    width: u32,
    /// Height in pixels.
    #[getset(get_copy = "pub")]
    height: u32,
    /// Row-major pixels.
    #[getset(get = "pub")]
    pixels: Vec<u16>,
    /// Channel tags.
    #[getset(get = "pub")]
    metadata: Metadata,
}

impl Image {
    /// Creates a new [`Image`].
    #[must_use]
    pub const fn new(width: u32, height: u32, pixels: Vec<u16>, metadata: Metadata) -> Self {
        Self {
            width,
            height,
            pixels,
            metadata,
        }
    }

    /// Bytes per pixel.
    #[must_use]
    pub const fn bytes_per_pixel(&self) -> usize {
        BYTES_PER_PIXEL
    }

    /// Pixels as little-endian bytes.
    #[must_use]
    pub fn to_le_bytes(&self) -> Vec<u8> {
        to_le_bytes(&self.pixels)
    }
}

pub(crate) fn to_le_bytes(pixels: &[u16]) -> Vec<u8> {
    pixels.iter().flat_map(|p| p.to_le_bytes()).collect()
}

/// Receives the frames of a sequence acquisition.
pub trait ImageSink: Send + Sync {
    /// Inserts an image.
    fn insert_image(&self, image: &Image) -> Result<(), SinkError>;

    /// Inserts every channel of one frame.
    ///
    /// The default inserts the images one at a time. Sinks that can fail part way should override it so that
    /// either all channels are inserted or none is.
    fn insert_frame(&self, images: &[Image]) -> Result<(), SinkError> {
        images.iter().try_for_each(|image| self.insert_image(image))
    }

    /// Drops every buffered image.
    fn clear(&self);
}

/// An [`ImageSink`] holding at most `capacity` images.
#[derive(Debug)]
pub struct RingBufferSink {
    capacity: usize,
    images: Mutex<VecDeque<Image>>,
}

impl RingBufferSink {
    /// Creates a new [`RingBufferSink`].
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            images: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Maximum number of buffered images.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of buffered images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Checks if no image is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Removes the oldest image.
    pub fn pop(&self) -> Option<Image> {
        self.lock().pop_front()
    }

    /// Removes every image.
    pub fn drain(&self) -> Vec<Image> {
        self.lock().drain(..).collect()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Image>> {
        self.images.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ImageSink for RingBufferSink {
    fn insert_image(&self, image: &Image) -> Result<(), SinkError> {
        let mut images = self.lock();
        if images.len() >= self.capacity {
            return Err(SinkError::Overflow);
        }
        images.push_back(image.clone());
        Ok(())
    }

    fn insert_frame(&self, frame: &[Image]) -> Result<(), SinkError> {
        let mut images = self.lock();
        if images.len() + frame.len() > self.capacity {
            return Err(SinkError::Overflow);
        }
        images.extend(frame.iter().cloned());
        Ok(())
    }

    fn clear(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(value: u16) -> Image {
        Image::new(2, 1, vec![value; 2], Metadata::default())
    }

    #[test]
    fn ring_buffer_overflow() -> anyhow::Result<()> {
        let sink = RingBufferSink::new(2);
        sink.insert_image(&image(1))?;
        sink.insert_image(&image(2))?;
        assert_eq!(Err(SinkError::Overflow), sink.insert_image(&image(3)));
        assert_eq!(2, sink.len());

        assert_eq!(Some(image(1)), sink.pop());
        sink.insert_image(&image(3))?;
        assert_eq!(vec![image(2), image(3)], sink.drain());
        assert!(sink.is_empty());
        Ok(())
    }

    #[rstest::rstest]
    #[test]
    #[case::fits(Ok(()), 3, 1)]
    #[case::exact(Ok(()), 2, 0)]
    #[case::partial(Err(SinkError::Overflow), 2, 1)]
    fn insert_frame_is_all_or_nothing(
        #[case] expect: Result<(), SinkError>,
        #[case] capacity: usize,
        #[case] buffered: u16,
    ) -> anyhow::Result<()> {
        let sink = RingBufferSink::new(capacity);
        (0..buffered).try_for_each(|v| sink.insert_image(&image(v)))?;
        assert_eq!(expect, sink.insert_frame(&[image(10), image(11)]));
        let expect_len = if expect.is_ok() {
            buffered as usize + 2
        } else {
            buffered as usize
        };
        assert_eq!(expect_len, sink.len());
        Ok(())
    }

    #[test]
    fn clear() -> anyhow::Result<()> {
        let sink = RingBufferSink::new(1);
        sink.insert_image(&image(1))?;
        sink.clear();
        assert!(sink.is_empty());
        sink.insert_image(&image(2))?;
        Ok(())
    }

    #[test]
    fn metadata() {
        let metadata = Metadata::for_channel("OpenScan", 1, Channel::Averaged);
        assert_eq!(Some("1"), metadata.get("CameraChannelIndex").map(String::as_str));
        assert_eq!(Some("Kalman"), metadata.get("CameraChannelName").map(String::as_str));
        assert_eq!(
            Some("1"),
            metadata.get("OpenScan-CameraChannelIndex").map(String::as_str)
        );
        assert_eq!(
            Some("Kalman"),
            metadata.get("OpenScan-CameraChannelName").map(String::as_str)
        );
        assert_eq!(4, metadata.len());
    }

    #[test]
    fn le_bytes() {
        let image = Image::new(2, 1, vec![0x1234, 0xABCD], Metadata::default());
        assert_eq!(vec![0x34, 0x12, 0xCD, 0xAB], image.to_le_bytes());
        assert_eq!(2, image.bytes_per_pixel());
    }
}
