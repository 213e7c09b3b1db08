//! Receiver for fixed-format OOK keyfob transmissions: data-aided clock
//! recovery and bit slicing over envelope-detected amplitude samples.

pub mod dsp;
pub mod keyfob;
pub mod utils;
