use crate::dsp::window::{SampleView, WindowUnderrun};

/// Which way the early-late gate says the sampling point should move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDirection {
    /// The early gate carries more energy; the point sits past the center
    Early,
    /// The current point dominates both gates
    Centered,
    /// The late gate carries more energy; the point sits before the center
    Late,
}

/// Integrated energy of one chip centered at `center`, biased right for
/// even widths. Widths of two or less degenerate to the single sample.
pub fn chip_energy(
    view: &SampleView,
    center: isize,
    samples_per_chip: usize,
) -> Result<f32, WindowUnderrun> {
    if samples_per_chip <= 2 {
        return view.get(center);
    }
    let half = (samples_per_chip / 2) as isize;
    let mut energy = 0.0;
    for j in (1 - half)..half {
        energy += view.get(center + j)?;
    }
    Ok(energy)
}

/// Compare chip energy one sample early, here, and one sample late.
pub fn early_late(
    view: &SampleView,
    center: isize,
    samples_per_chip: usize,
) -> Result<GateDirection, WindowUnderrun> {
    let gate_early = chip_energy(view, center - 1, samples_per_chip)?;
    let gate_now = chip_energy(view, center, samples_per_chip)?;
    let gate_late = chip_energy(view, center + 1, samples_per_chip)?;

    if gate_early > gate_now {
        Ok(GateDirection::Early)
    } else if gate_late > gate_now {
        Ok(GateDirection::Late)
    } else {
        Ok(GateDirection::Centered)
    }
}
