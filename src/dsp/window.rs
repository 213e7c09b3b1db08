use std::fmt;

/// The algorithm asked for a sample the current window does not hold.
///
/// A positive `index` past the end means the host has to supply more
/// lookahead before the in-progress check can finish. A negative `index`
/// means the lookback guarantee was violated, which no amount of new
/// samples will fix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowUnderrun {
    /// Index the caller tried to read, relative to the window start
    pub index: isize,
    /// Number of samples the window held
    pub len: usize,
}

impl fmt::Display for WindowUnderrun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sample window underrun: index {} outside 0..{}",
            self.index, self.len
        )
    }
}

impl std::error::Error for WindowUnderrun {}

/// Bounded view over the host's sample history.
///
/// Every read is range-checked; the demodulator never indexes the raw
/// buffer directly, so a short window surfaces as `WindowUnderrun`
/// instead of undefined behavior.
#[derive(Clone, Copy, Debug)]
pub struct SampleView<'a> {
    samples: &'a [f32],
}

impl<'a> SampleView<'a> {
    pub fn new(samples: &'a [f32]) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, index: isize) -> Result<f32, WindowUnderrun> {
        if index < 0 || index as usize >= self.samples.len() {
            return Err(WindowUnderrun {
                index,
                len: self.samples.len(),
            });
        }
        Ok(self.samples[index as usize])
    }
}
