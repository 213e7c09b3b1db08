use serde::{Deserialize, Serialize};
use tracing::warn;

/// One decoded keyfob transmission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecodedRecord {
    /// Reference level the payload was validated against
    pub reference_level: f32,
    /// 10-bit transmitter address
    pub address: u16,
    /// 8-bit switch states
    pub switches: u8,
}

/// Downstream consumer of decoded records. Delivery is fire-and-forget:
/// the decoder never waits on the sink.
pub trait RecordSink {
    fn accept(&mut self, record: DecodedRecord);
}

impl RecordSink for Vec<DecodedRecord> {
    fn accept(&mut self, record: DecodedRecord) {
        self.push(record);
    }
}

impl RecordSink for crossbeam_channel::Sender<DecodedRecord> {
    fn accept(&mut self, record: DecodedRecord) {
        if let Err(err) = self.send(record) {
            warn!("record sink disconnected, dropping record: {}", err);
        }
    }
}
