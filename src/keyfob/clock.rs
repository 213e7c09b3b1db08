use tracing::trace;

use crate::dsp::energy::{GateDirection, chip_energy, early_late};
use crate::dsp::window::{SampleView, WindowUnderrun};
use crate::keyfob::bit_period_index;
use crate::keyfob::config::DecoderConfig;
use crate::utils::consts::{ONE_SLOT_BIT, PACKET_SYMBOLS, SYMBOL_SPAN_BITS, ZERO_SLOT_BIT};

/// Committed symbol clock, adapted across successful decodes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BitClock {
    pub bitrate: f32,
    pub samples_per_bit: f32,
}

impl BitClock {
    pub fn new(sample_rate: f32, bitrate: f32) -> Self {
        Self {
            bitrate,
            samples_per_bit: sample_rate / bitrate,
        }
    }
}

/// Walk the sampling point forward until the early-late gate stops
/// reporting `Late`.
///
/// Only lateness is corrected; an `Early` verdict is accepted as locked.
/// That asymmetry is inherited from the transmitter's pulse shape (the
/// anchor lands on the rising side of the pulse) and is intentional:
/// correcting it changes which sample every later offset lands on.
///
/// Returns `None` if no lock is reached within one bit period.
pub fn track_bit_center(
    view: &SampleView,
    anchor: usize,
    samples_per_bit: f32,
) -> Result<Option<usize>, WindowUnderrun> {
    let samples_per_chip = (samples_per_bit.round() as usize).max(1);
    let mut center = anchor;
    for _ in 0..samples_per_chip {
        match early_late(view, center as isize, samples_per_chip)? {
            GateDirection::Late => center += 1,
            _ => return Ok(Some(center)),
        }
    }
    Ok(None)
}

/// Sum of expected-one chip energies minus expected-zero chip energies
/// across the whole packet, at a candidate samples-per-bit. Peaks when
/// the candidate matches the transmitter's true rate.
pub fn energy_separation(
    view: &SampleView,
    center: usize,
    samples_per_bit: f32,
) -> Result<f32, WindowUnderrun> {
    let samples_per_chip = (samples_per_bit.round() as usize).max(1);
    let mut ones = 0.0;
    let mut zeros = 0.0;
    for k in 0..PACKET_SYMBOLS {
        let zero_at = bit_period_index(
            center,
            samples_per_bit,
            ZERO_SLOT_BIT + SYMBOL_SPAN_BITS * k,
        );
        let one_at = bit_period_index(
            center,
            samples_per_bit,
            ONE_SLOT_BIT + SYMBOL_SPAN_BITS * k,
        );
        zeros += chip_energy(view, zero_at, samples_per_chip)?;
        ones += chip_energy(view, one_at, samples_per_chip)?;
    }
    Ok(ones - zeros)
}

/// Greedy hill climb over the bitrate grid, starting from the committed
/// clock and moving toward whichever neighbor rate separates expected
/// ones from zeros better. Stops at a local maximum (ties count as
/// converged) or when the next step would leave the configured range,
/// in which case the rate clamps to the bound.
///
/// The iteration count is bounded by the grid size, so the search
/// always terminates.
pub fn estimate_bitrate(
    view: &SampleView,
    center: usize,
    start: &BitClock,
    config: &DecoderConfig,
) -> Result<BitClock, WindowUnderrun> {
    let grid_steps = ((config.bitrate_max - config.bitrate_min)
        / config.bitrate_step)
        .ceil() as usize;
    let mut bitrate = start.bitrate;

    for _ in 0..=grid_steps {
        let curr =
            energy_separation(view, center, config.sample_rate / bitrate)?;
        let below = energy_separation(
            view,
            center,
            config.sample_rate / (bitrate - config.bitrate_step),
        )?;
        let above = energy_separation(
            view,
            center,
            config.sample_rate / (bitrate + config.bitrate_step),
        )?;

        if curr >= below && curr >= above {
            break;
        }
        let stepped = if below >= above {
            bitrate - config.bitrate_step
        } else {
            bitrate + config.bitrate_step
        };
        if stepped < config.bitrate_min || stepped > config.bitrate_max {
            bitrate = stepped.clamp(config.bitrate_min, config.bitrate_max);
            break;
        }
        trace!("rate search stepping to {:.0}", stepped);
        bitrate = stepped;
    }

    Ok(BitClock::new(config.sample_rate, bitrate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyfob::encode::KeyfobEncoder;
    use crate::utils::consts::DEFAULT_SAMPLE_RATE;

    const LEAD_BITS: usize = 4;

    fn burst(bitrate: f32) -> (Vec<f32>, usize) {
        let encoder = KeyfobEncoder::new(DEFAULT_SAMPLE_RATE, bitrate, 1.0);
        let signal = encoder.encode_burst(0x155, 0x0F, LEAD_BITS, 40);
        let anchor = (LEAD_BITS as f32 * encoder.samples_per_bit).round() as usize;
        (signal, anchor)
    }

    #[test]
    fn test_center_lock_within_one_bit() {
        let (signal, anchor) = burst(2400.0);
        let view = SampleView::new(&signal);
        let spb = DEFAULT_SAMPLE_RATE / 2400.0;
        let center = track_bit_center(&view, anchor, spb).unwrap().unwrap();
        assert!(center - anchor <= spb.round() as usize);
        // locked point reports Centered (or the accepted Early)
        let direction =
            early_late(&view, center as isize, spb.round() as usize).unwrap();
        assert_ne!(direction, GateDirection::Late);
    }

    #[test]
    fn test_center_lock_from_offset_anchor() {
        let (signal, anchor) = burst(2400.0);
        let view = SampleView::new(&signal);
        let spb = DEFAULT_SAMPLE_RATE / 2400.0;
        // anchor pushed up to half a chip early still locks
        for offset in 0..(spb.round() as usize / 2) {
            let center = track_bit_center(&view, anchor + offset, spb)
                .unwrap()
                .unwrap();
            assert!(center >= anchor + offset);
            assert!(center - (anchor + offset) <= spb.round() as usize);
        }
    }

    #[test]
    fn test_estimator_locks_across_full_range() {
        // seeded within one grid step of the true rate (the tracking
        // regime), the search must land on the injected rate exactly
        let config = DecoderConfig::default();
        let mut rate = config.bitrate_min;
        while rate <= config.bitrate_max {
            let (signal, anchor) = burst(rate);
            let view = SampleView::new(&signal);
            let true_spb = DEFAULT_SAMPLE_RATE / rate;
            let center =
                track_bit_center(&view, anchor, true_spb).unwrap().unwrap();
            for seed in [
                rate - config.bitrate_step,
                rate,
                rate + config.bitrate_step,
            ] {
                if seed < config.bitrate_min || seed > config.bitrate_max {
                    continue;
                }
                let start = BitClock::new(config.sample_rate, seed);
                let estimated =
                    estimate_bitrate(&view, center, &start, &config)
                        .unwrap();
                assert!(
                    (estimated.bitrate - rate).abs() <= config.bitrate_step,
                    "rate {rate} seeded {seed} estimated {}",
                    estimated.bitrate
                );
            }
            rate += config.bitrate_step;
        }
    }

    #[test]
    fn test_estimator_acquires_near_nominal() {
        // cold start from the nominal rate acquires within two steps
        let config = DecoderConfig::default();
        for rate in [2360.0f32, 2380.0, 2400.0, 2420.0, 2440.0] {
            let (signal, anchor) = burst(rate);
            let view = SampleView::new(&signal);
            let nominal_spb = DEFAULT_SAMPLE_RATE / config.bitrate_nominal;
            let center = track_bit_center(&view, anchor, nominal_spb)
                .unwrap()
                .unwrap();
            let start =
                BitClock::new(config.sample_rate, config.bitrate_nominal);
            let estimated =
                estimate_bitrate(&view, center, &start, &config).unwrap();
            assert_eq!(estimated.bitrate, rate);
        }
    }

    #[test]
    fn test_estimator_terminates_on_silence() {
        let signal = vec![0.0f32; 20_000];
        let view = SampleView::new(&signal);
        let config = DecoderConfig::default();
        let start = BitClock::new(config.sample_rate, config.bitrate_nominal);
        // all separations are zero: an immediate tie, converged at start
        let estimated =
            estimate_bitrate(&view, 1000, &start, &config).unwrap();
        assert_eq!(estimated.bitrate, config.bitrate_nominal);
    }
}
