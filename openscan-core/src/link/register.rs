use crate::fpga::{Control, Register};

use super::{Link, LinkError};

/// Typed register access for any [`Link`].
pub trait RegisterIo: Link {
    /// Reads `reg`.
    fn read<R: Register>(&mut self, reg: R) -> Result<R::Value, LinkError> {
        reg.read_from(self)
    }

    /// Writes `value` to `reg`.
    fn write<R: Control>(&mut self, reg: R, value: R::Value) -> Result<(), LinkError> {
        reg.write_to(self, value)
    }
}

impl<L: Link + ?Sized> RegisterIo for L {}
