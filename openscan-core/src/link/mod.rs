mod error;
mod register;
mod sync;

pub use error::{status, LinkError};
pub use register::RegisterIo;
#[doc(inline)]
pub use sync::*;
