//! JSON envelope codec.

use crate::domain::Envelope;
use crate::ports::codec::{Codec, CodecError};

/// Default `Codec`: envelopes as JSON documents.
#[derive(Debug, Clone, Copy)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    pub const fn compact() -> Self {
        Self { pretty: false }
    }

    /// Indented output, easier to inspect by hand.
    pub const fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::pretty()
    }
}

impl Codec for JsonCodec {
    fn encode(&self, envelope: &Envelope) -> Result<Vec<u8>, CodecError> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(envelope)?
        } else {
            serde_json::to_vec(envelope)?
        };
        Ok(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Envelope, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::VersionTag;

    #[test]
    fn test_compact_output_has_no_newlines() {
        let envelope = Envelope::new("k", VersionTag::major(1), json!({"a": [1, 2]}));
        let bytes = JsonCodec::compact().encode(&envelope).unwrap();
        assert!(!bytes.contains(&b'\n'));
    }

    #[test]
    fn test_rejects_non_envelope_documents() {
        assert!(JsonCodec::default().decode(b"[1, 2, 3]").is_err());
        assert!(JsonCodec::default().decode(b"not json").is_err());
    }
}
