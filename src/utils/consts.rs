/// Log level default (overridable via RUST_LOG)
pub const LOG_LEVEL: &str = "info";

// ============================================================================
// Keyfob packet format
//
// These are contracts of the transmitter's wire format, not tunables.
// ============================================================================

/// Fixed bit pattern sent ahead of every packet
pub const PREAMBLE_PATTERN: [bool; 13] = [
    true, false, true, true, false, false, true, false, true, true, false,
    false, true,
];

/// Redundantly coded data symbols per packet
pub const PACKET_SYMBOLS: usize = 36;

/// Bit-periods per symbol: zero slot, data chip, one slot
pub const SYMBOL_SPAN_BITS: usize = 3;

/// Bit-period offset of the first symbol's zero slot (always low on air)
pub const ZERO_SLOT_BIT: usize = 13;

/// Bit-period offset of the first symbol's one slot (always high on air)
pub const ONE_SLOT_BIT: usize = 15;

/// Address fields carried per packet, one data bit each
pub const ADDRESS_FIELDS: usize = 10;

/// Switch-state fields carried per packet
pub const SWITCH_FIELDS: usize = 8;

/// Bit-period offset of the first address data chip
pub const ADDRESS_FIRST_BIT: usize = 14;

/// Bit-period offset of the first switch data chip
pub const SWITCH_FIRST_BIT: usize = 74;

/// Bit-periods between successive fields (each field spans two symbols)
pub const FIELD_STRIDE_BITS: usize = 6;

/// Bit-periods between the two copies of one field
pub const FIELD_REPEAT_BITS: usize = 3;

/// Total bits actually modulated per packet (preamble + symbols)
pub const PACKET_BITS: usize =
    PREAMBLE_PATTERN.len() + PACKET_SYMBOLS * SYMBOL_SPAN_BITS;

/// Nominal packet span in bit-periods, used to skip past a handled candidate
pub const PACKET_SPAN_BITS: usize = 128;

/// Amplitude tolerance around the anchor peak for preamble "1" bits
pub const PREAMBLE_TOLERANCE: f32 = 0.3;

/// Lookahead the host must provide, in bit-periods at the slowest rate
pub const HISTORY_BITS: usize = 150;

// ============================================================================
// Receiver defaults
// ============================================================================

/// Default input sample rate (Hz)
pub const DEFAULT_SAMPLE_RATE: f32 = 250_000.0;

/// Default preamble detection threshold (amplitude units)
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Slowest transmitter symbol rate the search will consider
pub const DEFAULT_BITRATE_MIN: f32 = 2200.0;

/// Fastest transmitter symbol rate the search will consider
pub const DEFAULT_BITRATE_MAX: f32 = 2600.0;

/// Symbol rate the search starts from on a cold decoder
pub const DEFAULT_BITRATE_NOMINAL: f32 = 2400.0;

/// Symbol-rate search grid spacing
pub const DEFAULT_BITRATE_STEP: f32 = 20.0;
