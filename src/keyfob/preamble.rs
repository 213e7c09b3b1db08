use tracing::trace;

use crate::dsp::window::{SampleView, WindowUnderrun};
use crate::keyfob::bit_period_index;
use crate::utils::consts::{PREAMBLE_PATTERN, PREAMBLE_TOLERANCE};

/// Probe one scan position for the start of a packet.
///
/// A candidate opens when the sample exceeds the threshold and sits on
/// top of its pulse (the next sample is no larger). The 12 bits after
/// the anchor must then match the fixed preamble pattern: "1" bits
/// within ±30 % of the anchor peak, "0" bits at or below 70 % of it.
///
/// Returns the anchor peak on a match, `None` on any mismatch.
pub fn detect_at(
    view: &SampleView,
    index: usize,
    threshold: f32,
    samples_per_bit: f32,
) -> Result<Option<f32>, WindowUnderrun> {
    let peak = view.get(index as isize)?;
    if peak <= threshold {
        return Ok(None);
    }
    if view.get(index as isize + 1)? > peak {
        // still on the rising edge
        return Ok(None);
    }

    let ref_min = (1.0 - PREAMBLE_TOLERANCE) * peak;
    let ref_max = (1.0 + PREAMBLE_TOLERANCE) * peak;

    for (j, &bit) in PREAMBLE_PATTERN.iter().enumerate().skip(1) {
        let level = view.get(bit_period_index(index, samples_per_bit, j))?;
        let matched = if bit {
            level >= ref_min && level <= ref_max
        } else {
            level <= ref_min
        };
        if !matched {
            trace!("preamble mismatch at bit {} (level {:.3})", j, level);
            return Ok(None);
        }
    }

    Ok(Some(peak))
}
