//! Codec Port - Envelope Serialization

use crate::domain::Envelope;

/// Boxed error returned by codecs.
pub type CodecError = Box<dyn std::error::Error + Send + Sync>;

/// Turns envelopes into bytes and back.
///
/// The default is `adapters::persistence::JsonCodec`; any other format
/// works as long as `decode(encode(e)) == e`.
pub trait Codec: Send + Sync + 'static {
  fn encode(&self, envelope: &Envelope) -> Result<Vec<u8>, CodecError>;

  fn decode(&self, bytes: &[u8]) -> Result<Envelope, CodecError>;
}
