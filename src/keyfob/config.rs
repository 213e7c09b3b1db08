use crate::utils::consts::{
    DEFAULT_BITRATE_MAX, DEFAULT_BITRATE_MIN, DEFAULT_BITRATE_NOMINAL,
    DEFAULT_BITRATE_STEP, DEFAULT_SAMPLE_RATE, DEFAULT_THRESHOLD,
};

/// Receiver tuning, fixed at construction.
#[derive(Clone, Debug)]
pub struct DecoderConfig {
    pub sample_rate: f32,
    /// Amplitude a sample must exceed to open a preamble candidate
    pub threshold: f32,
    pub bitrate_min: f32,
    pub bitrate_max: f32,
    pub bitrate_nominal: f32,
    pub bitrate_step: f32,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            threshold: DEFAULT_THRESHOLD,
            bitrate_min: DEFAULT_BITRATE_MIN,
            bitrate_max: DEFAULT_BITRATE_MAX,
            bitrate_nominal: DEFAULT_BITRATE_NOMINAL,
            bitrate_step: DEFAULT_BITRATE_STEP,
        }
    }
}

impl DecoderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.sample_rate > 0.0) {
            return Err("sample rate must be positive".to_string());
        }
        if !(self.bitrate_step > 0.0) {
            return Err("bitrate step must be positive".to_string());
        }
        if self.bitrate_min > self.bitrate_max {
            return Err(format!(
                "bitrate range is inverted: {} > {}",
                self.bitrate_min, self.bitrate_max
            ));
        }
        if self.bitrate_nominal < self.bitrate_min
            || self.bitrate_nominal > self.bitrate_max
        {
            return Err(format!(
                "nominal bitrate {} outside [{}, {}]",
                self.bitrate_nominal, self.bitrate_min, self.bitrate_max
            ));
        }
        Ok(())
    }

    /// Widest chip the search can produce, in samples.
    pub fn max_chip_width(&self) -> usize {
        (self.sample_rate / self.bitrate_min).ceil() as usize
    }
}

/// Policy for deriving the slicing reference from the tracked peak sample.
///
/// The transmitter gives no explicit reference; halving the peak is the
/// stock heuristic, kept behind a trait so hosts can substitute their own.
pub trait RefLevel {
    fn reference(&self, peak: f32) -> f32;
}

/// Half the peak amplitude at the locked bit center.
#[derive(Clone, Copy, Debug, Default)]
pub struct HalfPeak;

impl RefLevel for HalfPeak {
    fn reference(&self, peak: f32) -> f32 {
        peak / 2.0
    }
}
