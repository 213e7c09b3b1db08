use crate::utils::consts::{
    ADDRESS_FIELDS, PACKET_BITS, PACKET_SYMBOLS, PREAMBLE_PATTERN,
    SWITCH_FIELDS,
};

/// Flat on-off keyed waveform for a bit sequence: each bit becomes a run
/// of samples at `amplitude` or zero, with bit edges kept on the exact
/// fractional grid so long packets do not accumulate timing drift.
pub fn modulate(bits: &[bool], samples_per_bit: f32, amplitude: f32) -> Vec<f32> {
    let total = (bits.len() as f32 * samples_per_bit).round() as usize;
    let mut samples = Vec::with_capacity(total);
    for (index, &bit) in bits.iter().enumerate() {
        let start = (index as f32 * samples_per_bit).round() as usize;
        let end = ((index + 1) as f32 * samples_per_bit).round() as usize;
        let level = if bit { amplitude } else { 0.0 };
        samples.extend(std::iter::repeat(level).take(end - start));
        debug_assert_eq!(samples.len(), end);
    }
    samples
}

/// Generates keyfob transmissions; the receive-side counterpart lives in
/// `keyfob::decoder`. Used for loopback tests and the `synth` command.
pub struct KeyfobEncoder {
    pub samples_per_bit: f32,
    pub amplitude: f32,
}

impl KeyfobEncoder {
    pub fn new(sample_rate: f32, bitrate: f32, amplitude: f32) -> Self {
        Self {
            samples_per_bit: sample_rate / bitrate,
            amplitude,
        }
    }

    /// Full on-air bit sequence for one packet: the 13-bit preamble
    /// followed by 36 three-bit symbols (zero slot, data chip, one slot).
    ///
    /// Address bits ride as chip pairs (1,1) for clear / (0,0) for set;
    /// switch bits as (0,1) for clear / (1,0) for set, matching the codes
    /// the slicer reads back.
    pub fn packet_bits(address: u16, switches: u8) -> Vec<bool> {
        let mut data = Vec::with_capacity(PACKET_SYMBOLS);
        for j in 0..ADDRESS_FIELDS {
            let set = (address >> j) & 1 == 1;
            data.push(!set);
            data.push(!set);
        }
        for j in 0..SWITCH_FIELDS {
            let set = (switches >> j) & 1 == 1;
            data.push(set);
            data.push(!set);
        }

        let mut bits = Vec::with_capacity(PACKET_BITS);
        bits.extend_from_slice(&PREAMBLE_PATTERN);
        for &chip in &data {
            bits.push(false);
            bits.push(chip);
            bits.push(true);
        }
        bits
    }

    /// One packet as samples, without surrounding silence.
    pub fn encode(&self, address: u16, switches: u8) -> Vec<f32> {
        modulate(
            &Self::packet_bits(address, switches),
            self.samples_per_bit,
            self.amplitude,
        )
    }

    /// One packet padded with leading and trailing silence, measured in
    /// bit-periods. The lead gives the early-late gate its lookback; the
    /// tail covers the rate search's widest probe.
    pub fn encode_burst(
        &self,
        address: u16,
        switches: u8,
        lead_bits: usize,
        tail_bits: usize,
    ) -> Vec<f32> {
        let lead = (lead_bits as f32 * self.samples_per_bit).round() as usize;
        let tail = (tail_bits as f32 * self.samples_per_bit).round() as usize;
        let mut signal = Vec::new();
        signal.extend(std::iter::repeat(0.0).take(lead));
        signal.extend(self.encode(address, switches));
        signal.extend(std::iter::repeat(0.0).take(tail));
        signal
    }
}
