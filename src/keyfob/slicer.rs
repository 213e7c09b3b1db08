use crate::dsp::window::{SampleView, WindowUnderrun};
use crate::keyfob::bit_period_index;
use crate::utils::consts::{
    ADDRESS_FIELDS, ADDRESS_FIRST_BIT, FIELD_REPEAT_BITS, FIELD_STRIDE_BITS,
    ONE_SLOT_BIT, PACKET_SYMBOLS, SWITCH_FIELDS, SWITCH_FIRST_BIT,
    SYMBOL_SPAN_BITS, ZERO_SLOT_BIT,
};

/// Check the packet's fixed redundancy: every symbol's zero slot must
/// sit at or below the reference and its one slot above it. Transmitters
/// cut off mid-packet often enough that this is worth the extra reads.
pub fn validate_payload(
    view: &SampleView,
    center: usize,
    samples_per_bit: f32,
    reference: f32,
) -> Result<bool, WindowUnderrun> {
    for k in 0..PACKET_SYMBOLS {
        let zero = view.get(bit_period_index(
            center,
            samples_per_bit,
            ZERO_SLOT_BIT + SYMBOL_SPAN_BITS * k,
        ))?;
        if zero > reference {
            return Ok(false);
        }
        let one = view.get(bit_period_index(
            center,
            samples_per_bit,
            ONE_SLOT_BIT + SYMBOL_SPAN_BITS * k,
        ))?;
        if one <= reference {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Slice the validated payload into its address and switch fields.
///
/// Each field is carried twice, three bit-periods apart; the two slices
/// form a 2-bit code. Address fields read code 3 (both high) as clear,
/// switch fields read code 1 (low then high) as clear; every other code
/// sets the field's bit.
pub fn slice_fields(
    view: &SampleView,
    center: usize,
    samples_per_bit: f32,
    reference: f32,
) -> Result<(u16, u8), WindowUnderrun> {
    let read_code = |first_bit: usize| -> Result<u8, WindowUnderrun> {
        let a = view.get(bit_period_index(center, samples_per_bit, first_bit))?
            > reference;
        let b = view.get(bit_period_index(
            center,
            samples_per_bit,
            first_bit + FIELD_REPEAT_BITS,
        ))? > reference;
        Ok(((a as u8) << 1) | (b as u8))
    };

    let mut address = 0u16;
    for j in 0..ADDRESS_FIELDS {
        let code = read_code(ADDRESS_FIRST_BIT + FIELD_STRIDE_BITS * j)?;
        if code != 0b11 {
            address |= 1 << j;
        }
    }

    let mut switches = 0u8;
    for j in 0..SWITCH_FIELDS {
        let code = read_code(SWITCH_FIRST_BIT + FIELD_STRIDE_BITS * j)?;
        if code != 0b01 {
            switches |= 1 << j;
        }
    }

    Ok((address, switches))
}
