use tracing::{debug, info, warn};

use crate::dsp::window::{SampleView, WindowUnderrun};
use crate::keyfob::clock::{self, BitClock};
use crate::keyfob::config::{DecoderConfig, HalfPeak, RefLevel};
use crate::keyfob::record::{DecodedRecord, RecordSink};
use crate::keyfob::{bit_period_index, preamble, slicer};
use crate::utils::consts::PACKET_SPAN_BITS;

/// Streaming keyfob receiver.
///
/// Samples are pushed in arbitrarily sized chunks; the decoder keeps the
/// lookback and lookahead it needs internally and hands every validated
/// packet to the caller's sink. The scan position only ever moves
/// forward, and the symbol clock adapts across successful decodes while
/// staying untouched by rejected candidates.
pub struct KeyfobDecoder {
    config: DecoderConfig,
    clock: BitClock,
    ref_level: Box<dyn RefLevel>,

    buffer: Vec<f32>,
    /// Next buffer index to examine
    scan_pos: usize,
    /// Absolute samples already dropped ahead of `buffer[0]`
    consumed: u64,
}

impl KeyfobDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        let nominal = config
            .bitrate_nominal
            .clamp(config.bitrate_min, config.bitrate_max);
        let clock = BitClock::new(config.sample_rate, nominal);
        Self {
            config,
            clock,
            ref_level: Box::new(HalfPeak),
            buffer: Vec::new(),
            scan_pos: 0,
            consumed: 0,
        }
    }

    /// Swap the reference-level policy (defaults to half the peak).
    pub fn with_ref_level(mut self, policy: Box<dyn RefLevel>) -> Self {
        self.ref_level = policy;
        self
    }

    /// The currently committed symbol clock.
    pub fn clock(&self) -> &BitClock {
        &self.clock
    }

    /// Absolute position of the scan pointer in the overall stream.
    pub fn stream_position(&self) -> u64 {
        self.consumed + self.scan_pos.min(self.buffer.len()) as u64
    }

    /// Feed the next chunk of envelope samples, pushing any decoded
    /// packets into `sink`. Samples the scan has fully passed are
    /// dropped; anything a pending candidate might still need is kept
    /// until more lookahead arrives.
    pub fn process_samples(
        &mut self,
        samples: &[f32],
        sink: &mut impl RecordSink,
    ) {
        self.buffer.extend_from_slice(samples);
        self.scan(false, sink);
        self.compact();
    }

    /// Declare end of stream: finish scanning whatever is buffered and
    /// drop candidates that would need samples past the end.
    pub fn finish(&mut self, sink: &mut impl RecordSink) {
        self.scan(true, sink);
        self.consumed += self.buffer.len() as u64;
        self.buffer.clear();
        self.scan_pos = 0;
    }

    fn scan(&mut self, draining: bool, sink: &mut impl RecordSink) {
        while self.scan_pos < self.buffer.len() {
            match self.scan_step(sink) {
                Ok(advance) => self.scan_pos += advance,
                Err(underrun) if underrun.index < 0 => {
                    // lookback the stream never had; skip the sample
                    warn!(
                        "candidate at stream position {} needs history \
                         before the stream start, dropping it",
                        self.stream_position()
                    );
                    self.scan_pos += 1;
                }
                Err(_) if draining => {
                    // stream is over, the candidate can never complete
                    self.scan_pos = self.buffer.len();
                }
                Err(_) => break, // wait for more samples
            }
        }
    }

    /// Examine one scan position. Returns how far to advance, or a
    /// `WindowUnderrun` when the buffered lookahead is not enough to
    /// settle the candidate either way.
    fn scan_step(
        &mut self,
        sink: &mut impl RecordSink,
    ) -> Result<usize, WindowUnderrun> {
        let view = SampleView::new(&self.buffer);
        let index = self.scan_pos;

        let Some(peak) = preamble::detect_at(
            &view,
            index,
            self.config.threshold,
            self.clock.samples_per_bit,
        )?
        else {
            return Ok(1);
        };
        debug!(
            "preamble match at stream position {} (peak {:.3})",
            self.consumed + index as u64,
            peak
        );

        let Some(center) =
            clock::track_bit_center(&view, index, self.clock.samples_per_bit)?
        else {
            debug!("early-late gate never locked, dropping candidate");
            return Ok(1);
        };

        let candidate =
            clock::estimate_bitrate(&view, center, &self.clock, &self.config)?;

        let reference = self.ref_level.reference(view.get(center as isize)?);

        if !slicer::validate_payload(
            &view,
            center,
            candidate.samples_per_bit,
            reference,
        )? {
            debug!(
                "payload failed validation at rate {:.0}, skipping one \
                 packet span",
                candidate.bitrate
            );
            // the tentative rate dies with the candidate; skip using the
            // committed clock
            return Ok(self.packet_advance(index, center, &self.clock));
        }

        let (address, switches) = slicer::slice_fields(
            &view,
            center,
            candidate.samples_per_bit,
            reference,
        )?;

        // only now does the adaptive clock move
        self.clock = candidate;

        info!(
            "keyfob packet: address={:#06x} switches={:#04x} ref={:.3} \
             bitrate={:.0}",
            address, switches, reference, self.clock.bitrate
        );
        sink.accept(DecodedRecord {
            reference_level: reference,
            address,
            switches,
        });

        Ok(self.packet_advance(index, center, &self.clock))
    }

    /// Advance from the anchor past the whole packet.
    fn packet_advance(
        &self,
        index: usize,
        center: usize,
        clock: &BitClock,
    ) -> usize {
        let span =
            bit_period_index(center, clock.samples_per_bit, PACKET_SPAN_BITS)
                as usize;
        span - index
    }

    fn compact(&mut self) {
        let lookback = self.config.max_chip_width() + 2;
        if self.scan_pos > lookback {
            let drain = (self.scan_pos - lookback).min(self.buffer.len());
            self.buffer.drain(..drain);
            self.scan_pos -= drain;
            self.consumed += drain as u64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyfob::encode::KeyfobEncoder;
    use crate::utils::consts::DEFAULT_SAMPLE_RATE;

    fn decode_all(signal: &[f32]) -> Vec<DecodedRecord> {
        let mut decoder = KeyfobDecoder::new(DecoderConfig::default());
        let mut records = Vec::new();
        decoder.process_samples(signal, &mut records);
        decoder.finish(&mut records);
        records
    }

    fn burst(address: u16, switches: u8, bitrate: f32) -> Vec<f32> {
        KeyfobEncoder::new(DEFAULT_SAMPLE_RATE, bitrate, 1.0)
            .encode_burst(address, switches, 4, 40)
    }

    #[test]
    fn test_round_trip_at_nominal_rate() {
        let records = decode_all(&burst(0x155, 0x0F, 2400.0));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].address, 0x155);
        assert_eq!(records[0].switches, 0x0F);
        // half-peak reference within 10 % of amplitude / 2
        assert!((records[0].reference_level - 0.5).abs() < 0.05);
    }

    #[test]
    fn test_round_trip_across_acquisition_band() {
        // cold-start acquisition reaches two grid steps around nominal
        for bitrate in [2360.0f32, 2380.0, 2400.0, 2420.0, 2440.0] {
            let mut decoder = KeyfobDecoder::new(DecoderConfig::default());
            let mut records = Vec::new();
            decoder.process_samples(&burst(0x2AA, 0x81, bitrate), &mut records);
            decoder.finish(&mut records);
            assert_eq!(records.len(), 1, "no decode at {bitrate}");
            assert_eq!(records[0].address, 0x2AA);
            assert_eq!(records[0].switches, 0x81);
            assert_eq!(decoder.clock().bitrate, bitrate);
        }
    }

    #[test]
    fn test_chunked_feed_matches_whole_feed() {
        let mut signal = burst(0x155, 0x0F, 2380.0);
        signal.extend(burst(0x0AB, 0x11, 2360.0));
        let whole = decode_all(&signal);
        assert_eq!(whole.len(), 2);

        for chunk_size in [17usize, 997, 65_536] {
            let mut decoder = KeyfobDecoder::new(DecoderConfig::default());
            let mut records = Vec::new();
            for chunk in signal.chunks(chunk_size) {
                decoder.process_samples(chunk, &mut records);
            }
            decoder.finish(&mut records);
            assert_eq!(records, whole, "chunk size {chunk_size}");
        }
    }

    #[test]
    fn test_clock_tracks_drifting_transmitter() {
        // consecutive packets step the rate 40 Hz at a time down to the
        // bottom of the range; the adaptive clock follows the whole way
        let mut signal = Vec::new();
        let mut bitrate = 2400.0f32;
        let mut expected = Vec::new();
        while bitrate >= 2200.0 {
            signal.extend(burst(0x155, 0x0F, bitrate));
            expected.push(bitrate);
            bitrate -= 40.0;
        }
        let mut decoder = KeyfobDecoder::new(DecoderConfig::default());
        let mut records = Vec::new();
        for chunk in signal.chunks(10_000) {
            decoder.process_samples(chunk, &mut records);
        }
        decoder.finish(&mut records);
        assert_eq!(records.len(), expected.len());
        assert!(records.iter().all(|r| r.address == 0x155));
        assert_eq!(decoder.clock().bitrate, 2200.0);
    }

    #[test]
    fn test_survives_additive_noise() {
        let mut signal = burst(0x155, 0x0F, 2400.0);
        for sample in signal.iter_mut() {
            *sample += (rand::random::<f32>() - 0.5) * 0.1;
        }
        let records = decode_all(&signal);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].address, 0x155);
        assert_eq!(records[0].switches, 0x0F);
    }

    #[test]
    fn test_silence_emits_nothing() {
        let records = decode_all(&vec![0.0f32; 50_000]);
        assert!(records.is_empty());
    }

    #[test]
    fn test_constant_carrier_emits_nothing() {
        // always above threshold but never a preamble
        let records = decode_all(&vec![0.9f32; 50_000]);
        assert!(records.is_empty());
    }

    #[test]
    fn test_truncated_packet_emits_nothing() {
        let full = KeyfobEncoder::new(DEFAULT_SAMPLE_RATE, 2400.0, 1.0)
            .encode_burst(0x155, 0x0F, 4, 0);
        let records = decode_all(&full[..full.len() / 2]);
        assert!(records.is_empty());
    }

    #[test]
    fn test_pulse_at_stream_start_is_recovered() {
        // no lead-in at all: the first candidate lacks lookback and is
        // dropped, but the packet still decodes once the gate can run
        let signal = KeyfobEncoder::new(DEFAULT_SAMPLE_RATE, 2400.0, 1.0)
            .encode_burst(0x31, 0x02, 0, 40);
        let records = decode_all(&signal);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].address, 0x31);
    }

    #[test]
    fn test_scan_position_is_monotonic() {
        let signal = burst(0x155, 0x0F, 2400.0);
        let mut decoder = KeyfobDecoder::new(DecoderConfig::default());
        let mut records = Vec::new();
        let mut last = 0u64;
        for chunk in signal.chunks(1000) {
            decoder.process_samples(chunk, &mut records);
            let position = decoder.stream_position();
            assert!(position >= last);
            last = position;
        }
    }
}
