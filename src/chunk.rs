//
// fragcat - chunk.rs - PNG chunk framing: signature check, length/type/payload/crc
//
// https://www.w3.org/TR/PNG/#5DataRep
// https://www.w3.org/TR/PNG/#5CRC-algorithm
//

use std::io;
use std::io::Write;

use crate::crc32::crc32_parts;
use crate::error::{CrcMismatch, Error};

pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// True iff `bytes` begins with the 8-byte PNG file signature.
pub fn is_png(bytes: &[u8]) -> bool {
    bytes.len() >= PNG_SIGNATURE.len() && bytes[..PNG_SIGNATURE.len()] == PNG_SIGNATURE
}

/// One chunk as read off the wire: `length‖type‖payload‖crc`, with the stored
/// CRC kept verbatim. Verifying it against the payload is a separate step
/// ([`verify_crc`]) so callers can choose to treat a mismatch as non-fatal.
#[derive(Debug, Clone)]
pub struct RawChunk {
    pub type_code: [u8; 4],
    pub payload: Vec<u8>,
    pub crc: u32,
}

impl RawChunk {
    pub fn type_str(&self) -> &str {
        std::str::from_utf8(&self.type_code).unwrap_or("????")
    }
}

fn read_be32(buf: &[u8], offset: usize) -> Result<u32, Error> {
    let end = offset + 4;
    if end > buf.len() {
        return Err(Error::Truncated { needed: end, available: buf.len() });
    }
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[offset..end]);
    Ok(u32::from_be_bytes(bytes))
}

/// Decodes one chunk starting at `offset`, returning the chunk and the offset
/// of the byte immediately after it (`offset + 8 + length + 4`).
///
/// Never allocates the payload when `length == 0` (the common case for IEND).
pub fn read_chunk(buf: &[u8], offset: usize) -> Result<(RawChunk, usize), Error> {
    let length = read_be32(buf, offset)? as usize;

    let type_start = offset + 4;
    let type_end = type_start + 4;
    if type_end > buf.len() {
        return Err(Error::Truncated { needed: type_end, available: buf.len() });
    }
    let mut type_code = [0u8; 4];
    type_code.copy_from_slice(&buf[type_start..type_end]);

    let payload_start = type_end;
    let payload_end = payload_start + length;
    if payload_end > buf.len() {
        return Err(Error::Truncated { needed: payload_end, available: buf.len() });
    }
    let payload = if length == 0 {
        Vec::new()
    } else {
        buf[payload_start..payload_end].to_vec()
    };

    let crc = read_be32(buf, payload_end)?;
    let new_offset = payload_end + 4;

    Ok((RawChunk { type_code, payload, crc }, new_offset))
}

/// Checks a chunk's stored CRC against one computed over `type ‖ payload`.
pub fn verify_crc(chunk: &RawChunk) -> Result<(), CrcMismatch> {
    let computed = crc32_parts(&chunk.type_code, &chunk.payload);
    if computed == chunk.crc {
        Ok(())
    } else {
        Err(CrcMismatch { expected: chunk.crc, computed })
    }
}

/// Serializes `length (BE) ‖ type ‖ payload ‖ crc (BE)` to `sink`.
pub fn write_chunk<W: Write>(sink: &mut W, type_code: &[u8; 4], payload: &[u8]) -> io::Result<()> {
    sink.write_all(&(payload.len() as u32).to_be_bytes())?;
    sink.write_all(type_code)?;
    sink.write_all(payload)?;
    let crc = crc32_parts(type_code, payload);
    sink.write_all(&crc.to_be_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_chunk(type_code: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        write_chunk(&mut out, type_code, payload).unwrap();
        out
    }

    #[test]
    fn is_png_recognizes_signature() {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(b"more bytes follow");
        assert!(is_png(&bytes));
    }

    #[test]
    fn is_png_rejects_short_or_wrong_input() {
        assert!(!is_png(b"not a png"));
        assert!(!is_png(&PNG_SIGNATURE[..4]));
    }

    #[test]
    fn round_trips_a_chunk() {
        let encoded = encode_chunk(b"IDAT", b"01234567890123456789");
        let (chunk, new_offset) = read_chunk(&encoded, 0).unwrap();
        assert_eq!(chunk.type_code, *b"IDAT");
        assert_eq!(chunk.payload, b"01234567890123456789");
        assert_eq!(new_offset, encoded.len());
        assert!(verify_crc(&chunk).is_ok());
    }

    #[test]
    fn empty_chunk_has_no_payload_allocation_surprises() {
        let encoded = encode_chunk(b"IEND", b"");
        assert_eq!(encoded.len(), 12);
        let (chunk, _) = read_chunk(&encoded, 0).unwrap();
        assert!(chunk.payload.is_empty());
        assert_eq!(chunk.crc, 0xAE42_6082);
    }

    #[test]
    fn truncated_length_field_is_an_error() {
        let err = read_chunk(&[0, 0], 0).unwrap_err();
        assert!(matches!(err, Error::Truncated { .. }));
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let mut encoded = encode_chunk(b"IDAT", b"0123456789");
        encoded.truncate(encoded.len() - 1);
        let err = read_chunk(&encoded, 0).unwrap_err();
        assert!(matches!(err, Error::Truncated { .. }));
    }

    #[test]
    fn corrupted_crc_is_detected_but_non_fatal() {
        let mut encoded = encode_chunk(b"IDAT", b"hello");
        let last = encoded.len() - 1;
        encoded[last] ^= 0xff;
        let (chunk, _) = read_chunk(&encoded, 0).unwrap();
        let mismatch = verify_crc(&chunk).unwrap_err();
        assert_ne!(mismatch.expected, mismatch.computed);
    }

    #[test]
    fn known_one_pixel_crc_matches_reference() {
        // From a 1x1 truecolor black pixel made with gd.
        let one_pixel = b"\x08\x99\x63\x60\x60\x60\x00\x00\x00\x04\x00\x01";
        let encoded = encode_chunk(b"IDAT", one_pixel);
        assert_eq!(encoded[0..4], [0x00, 0x00, 0x00, 0x0c]);
        assert_eq!(&encoded[4..8], b"IDAT");
        assert_eq!(&encoded[8..20], &one_pixel[..]);
        assert_eq!(encoded[20..24], [0xa3, 0x0a, 0x15, 0xe3]);
    }
}
