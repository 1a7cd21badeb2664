//! # GNUnet-style Base32 Encoding
//!
//! Peer identities and query keys are persisted to disk and embedded in
//! filenames using a 32-character alphabet (Crockford-style, omitting
//! `I`, `L`, `O`, `U` to avoid transcription ambiguity), distinct from
//! RFC 4648 base32.

use data_encoding::{Encoding, Specification};
use std::sync::OnceLock;

const ALPHABET: &str = "0123456789ABCDEFGHJKMNPQRSTVWXYZ";

fn encoding() -> &'static Encoding {
    static ENC: OnceLock<Encoding> = OnceLock::new();
    ENC.get_or_init(|| {
        let mut spec = Specification::new();
        spec.symbols.push_str(ALPHABET);
        spec.padding = None;
        spec.encoding().expect("static alphabet is valid")
    })
}

#[must_use]
pub fn encode(bytes: &[u8]) -> String {
    encoding().encode(bytes)
}

pub fn decode(s: &str) -> Result<Vec<u8>, data_encoding::DecodeError> {
    encoding().decode(s.as_bytes())
}

/// Parses a host-directory filename of the form `<base32(peer_id)>.<protocol>`.
#[must_use]
pub fn parse_host_filename(name: &str) -> Option<(Vec<u8>, u16)> {
    let (id_part, proto_part) = name.rsplit_once('.')?;
    let peer_bytes = decode(id_part).ok()?;
    if peer_bytes.len() != 64 {
        return None;
    }
    let protocol: u16 = proto_part.parse().ok()?;
    Some((peer_bytes, protocol))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let data = [1u8, 2, 3, 4, 250, 251, 252];
        let encoded = encode(&data);
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn filename_parses() {
        let id = [7u8; 64];
        let name = format!("{}.6", encode(&id));
        let (parsed_id, proto) = parse_host_filename(&name).unwrap();
        assert_eq!(parsed_id, id);
        assert_eq!(proto, 6);
    }

    #[test]
    fn filename_rejects_bad_protocol() {
        let id = [7u8; 64];
        let name = format!("{}.not-a-number", encode(&id));
        assert!(parse_host_filename(&name).is_none());
    }
}
