pub mod emulator;
pub mod option;
