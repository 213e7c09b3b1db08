// Sample-level primitives shared by the demodulator

pub mod energy;
pub mod window;

pub use energy::{GateDirection, chip_energy, early_late};
pub use window::{SampleView, WindowUnderrun};
