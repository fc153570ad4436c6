use getset::CopyGetters;
use itertools::Itertools;

use crate::error::ScanDriverError;

/// Rectangular region of interest within a square image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Roi {
    /// Left edge.
    x: u32,
    /// Top edge.
    y: u32,
    /// Width.
    width: u32,
    /// Height.
    height: u32,
}

impl Roi {
    /// Creates a new [`Roi`] that fits inside a `resolution` x `resolution` image.
    ///
    /// # Errors
    ///
    /// Returns [`ScanDriverError::RoiOutOfRange`] if the region is empty or extends past the image.
    pub fn new(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        resolution: u32,
    ) -> Result<Self, ScanDriverError> {
        let fits = |start: u32, len: u32| {
            len > 0 && start.checked_add(len).is_some_and(|end| end <= resolution)
        };
        if fits(x, width) && fits(y, height) {
            Ok(Self {
                x,
                y,
                width,
                height,
            })
        } else {
            Err(ScanDriverError::RoiOutOfRange {
                x,
                y,
                width,
                height,
                resolution,
            })
        }
    }

    /// Copies the region out of a row-major square image of `resolution` pixels per side.
    #[must_use]
    pub fn crop(&self, pixels: &[u16], resolution: u32) -> Vec<u16> {
        let stride = resolution as usize;
        let (x, w) = (self.x as usize, self.width as usize);
        pixels
            .chunks_exact(stride)
            .skip(self.y as usize)
            .take(self.height as usize)
            .flat_map(|row| &row[x..x + w])
            .copied()
            .collect_vec()
    }
}
