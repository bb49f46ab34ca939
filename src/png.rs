//
// fragcat - png.rs - the three-chunk PNG assembler
//
// Composes/decomposes a PNG document that is known in advance to carry
// exactly IHDR, IDAT, IEND in that order (the shape the server emits for
// every fragment, and the shape the orchestrator emits for the final
// image). Full PNG conformance - palettes, ancillary chunks, interlacing,
// multi-IDAT streams - is out of scope; see SPEC_FULL.md Non-goals.
//

use std::io;
use std::io::Write;

use crate::chunk::{self, RawChunk};
use crate::deflate;
use crate::error::{CrcMismatch, Error};

pub const IHDR_LEN: usize = 13;

/// Color types PNG defines for non-indexed, non-interlaced use here.
pub mod color_type {
    pub const GREYSCALE: u8 = 0;
    pub const TRUECOLOR: u8 = 2;
    pub const INDEXED: u8 = 3;
    pub const GREYSCALE_ALPHA: u8 = 4;
    pub const TRUECOLOR_ALPHA: u8 = 6;
}

/// The 13-byte IHDR payload, decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IhdrData {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: u8,
    pub compression: u8,
    pub filter: u8,
    pub interlace: u8,
}

impl IhdrData {
    pub fn from_payload(payload: &[u8]) -> Result<IhdrData, Error> {
        if payload.len() != IHDR_LEN {
            return Err(Error::WrongChunk { expected: "IHDR (13-byte payload)", found: *b"IHDR" });
        }
        let width = u32::from_be_bytes(payload[0..4].try_into().unwrap());
        let height = u32::from_be_bytes(payload[4..8].try_into().unwrap());
        let ihdr = IhdrData {
            width,
            height,
            bit_depth: payload[8],
            color_type: payload[9],
            compression: payload[10],
            filter: payload[11],
            interlace: payload[12],
        };
        ihdr.validate()?;
        Ok(ihdr)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::Configuration("IHDR width/height must be nonzero".into()));
        }
        if !matches!(self.bit_depth, 1 | 2 | 4 | 8 | 16) {
            return Err(Error::Configuration(format!("invalid bit depth {}", self.bit_depth)));
        }
        if !matches!(
            self.color_type,
            color_type::GREYSCALE
                | color_type::TRUECOLOR
                | color_type::INDEXED
                | color_type::GREYSCALE_ALPHA
                | color_type::TRUECOLOR_ALPHA
        ) {
            return Err(Error::Configuration(format!("invalid color type {}", self.color_type)));
        }
        Ok(())
    }

    pub fn to_payload(&self) -> [u8; IHDR_LEN] {
        let mut out = [0u8; IHDR_LEN];
        out[0..4].copy_from_slice(&self.width.to_be_bytes());
        out[4..8].copy_from_slice(&self.height.to_be_bytes());
        out[8] = self.bit_depth;
        out[9] = self.color_type;
        out[10] = self.compression;
        out[11] = self.filter;
        out[12] = self.interlace;
        out
    }

    /// Number of channels implied by `color_type`, for RGBA-8 strips this is 4.
    pub fn channels(&self) -> u32 {
        match self.color_type {
            color_type::GREYSCALE => 1,
            color_type::TRUECOLOR => 3,
            color_type::INDEXED => 1,
            color_type::GREYSCALE_ALPHA => 2,
            color_type::TRUECOLOR_ALPHA => 4,
            _ => 0,
        }
    }
}

/// A parsed three-chunk PNG: IHDR fields, the still-compressed IDAT payload,
/// and (non-fatally) the first CRC mismatch seen while parsing, if any.
#[derive(Debug, Clone)]
pub struct SimplePng {
    pub ihdr: IhdrData,
    pub idat: Vec<u8>,
    pub first_crc_mismatch: Option<CrcMismatch>,
}

fn expect_chunk(buf: &[u8], offset: usize, expected_type: &[u8; 4], expected_name: &'static str) -> Result<(RawChunk, usize), Error> {
    let (chunk, new_offset) = chunk::read_chunk(buf, offset)?;
    if &chunk.type_code != expected_type {
        return Err(Error::WrongChunk { expected: expected_name, found: chunk.type_code });
    }
    Ok((chunk, new_offset))
}

/// Parses the 8-byte signature then exactly IHDR, IDAT, IEND in order.
/// CRC mismatches are recorded, not fatal; anything else about chunk shape
/// (wrong type, wrong order, trailing bytes, missing chunks) is `WrongChunk`
/// or `Truncated`.
pub fn parse_png(bytes: &[u8]) -> Result<SimplePng, Error> {
    if !chunk::is_png(bytes) {
        return Err(Error::NotAPng);
    }

    let mut offset = chunk::PNG_SIGNATURE.len();
    let mut first_crc_mismatch = None;
    let mut record_mismatch = |c: &RawChunk| {
        if first_crc_mismatch.is_none() {
            if let Err(mismatch) = chunk::verify_crc(c) {
                first_crc_mismatch = Some(mismatch);
            }
        }
    };

    let (ihdr_chunk, next) = expect_chunk(bytes, offset, b"IHDR", "IHDR")?;
    record_mismatch(&ihdr_chunk);
    offset = next;

    let (idat_chunk, next) = expect_chunk(bytes, offset, b"IDAT", "IDAT")?;
    record_mismatch(&idat_chunk);
    offset = next;

    let (iend_chunk, next) = expect_chunk(bytes, offset, b"IEND", "IEND")?;
    record_mismatch(&iend_chunk);
    offset = next;

    if offset != bytes.len() {
        return Err(Error::WrongChunk { expected: "end of file after IEND", found: iend_chunk.type_code });
    }

    let ihdr = IhdrData::from_payload(&ihdr_chunk.payload)?;

    Ok(SimplePng { ihdr, idat: idat_chunk.payload, first_crc_mismatch })
}

/// Emits signature ‖ IHDR ‖ IDAT ‖ IEND, each with a freshly computed CRC.
pub fn write_png<W: Write>(sink: &mut W, png: &SimplePng) -> io::Result<()> {
    sink.write_all(&chunk::PNG_SIGNATURE)?;
    chunk::write_chunk(sink, b"IHDR", &png.ihdr.to_payload())?;
    chunk::write_chunk(sink, b"IDAT", &png.idat)?;
    chunk::write_chunk(sink, b"IEND", b"")
}

/// Inflates the (zlib-wrapped) IDAT payload into raw filtered scanline bytes.
pub fn inflate_idat(idat_payload: &[u8]) -> Result<Vec<u8>, Error> {
    deflate::inflate(idat_payload)
}

/// Deflates raw scanline bytes and bundles them with `ihdr` into a fresh
/// three-chunk PNG. IHDR is supplied by the caller (the orchestrator knows
/// the final dimensions; this function doesn't infer them).
pub fn deflate_into_png(ihdr: IhdrData, raw_raster: &[u8], level: u8) -> SimplePng {
    SimplePng { ihdr, idat: deflate::deflate(raw_raster, level), first_crc_mismatch: None }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ihdr(width: u32, height: u32) -> IhdrData {
        IhdrData {
            width,
            height,
            bit_depth: 8,
            color_type: color_type::TRUECOLOR_ALPHA,
            compression: 0,
            filter: 0,
            interlace: 0,
        }
    }

    fn encode(ihdr: IhdrData, raw: &[u8]) -> Vec<u8> {
        let png = deflate_into_png(ihdr, raw, 6);
        let mut out = Vec::new();
        write_png(&mut out, &png).unwrap();
        out
    }

    // S1: a known-good 2x2 RGBA PNG parses with the expected IHDR fields.
    #[test]
    fn parses_a_well_formed_2x2_png() {
        let raw = [
            0u8, 0, 0, 0, 255, 0, 0, 0, // filter byte + row 0
            255, 255, 0, 0, 0, 255, 0, 255, // row 1 (truncated-style sample data)
        ];
        let bytes = encode(sample_ihdr(2, 2), &raw);

        let png = parse_png(&bytes).unwrap();
        assert_eq!(png.ihdr.width, 2);
        assert_eq!(png.ihdr.height, 2);
        assert_eq!(png.ihdr.color_type, color_type::TRUECOLOR_ALPHA);
        assert!(png.first_crc_mismatch.is_none());

        let restored = inflate_idat(&png.idat).unwrap();
        assert_eq!(restored, raw);
    }

    // S2: a corrupted IHDR CRC is reported but doesn't block parsing.
    #[test]
    fn corrupted_ihdr_crc_is_non_fatal() {
        let mut bytes = encode(sample_ihdr(2, 2), &[0u8; 16]);
        // The IHDR chunk's CRC is its last 4 bytes before IDAT's length field.
        let ihdr_crc_last_byte = 8 + 4 + 4 + IHDR_LEN + 3;
        bytes[ihdr_crc_last_byte] ^= 0xff;

        let png = parse_png(&bytes).unwrap();
        assert!(png.first_crc_mismatch.is_some());
        assert_eq!(png.ihdr.width, 2);
        assert_eq!(png.ihdr.height, 2);
    }

    // S3: truncating the final CRC byte is a hard parse failure.
    #[test]
    fn truncated_final_crc_is_an_error() {
        let mut bytes = encode(sample_ihdr(2, 2), &[0u8; 16]);
        bytes.truncate(bytes.len() - 1);
        let err = parse_png(&bytes).unwrap_err();
        assert!(matches!(err, Error::Truncated { .. }));
    }

    #[test]
    fn wrong_chunk_order_is_rejected() {
        // Build IHDR, IEND, IDAT (swap the last two) by hand.
        let ihdr = sample_ihdr(2, 2);
        let idat = deflate::deflate(&[0u8; 16], 6);

        let mut bytes = chunk::PNG_SIGNATURE.to_vec();
        chunk::write_chunk(&mut bytes, b"IHDR", &ihdr.to_payload()).unwrap();
        chunk::write_chunk(&mut bytes, b"IEND", b"").unwrap();
        chunk::write_chunk(&mut bytes, b"IDAT", &idat).unwrap();

        let err = parse_png(&bytes).unwrap_err();
        assert!(matches!(err, Error::WrongChunk { .. }));
    }

    #[test]
    fn trailing_bytes_after_iend_are_rejected() {
        let mut bytes = encode(sample_ihdr(2, 2), &[0u8; 16]);
        bytes.push(0);
        let err = parse_png(&bytes).unwrap_err();
        assert!(matches!(err, Error::WrongChunk { .. }));
    }

    #[test]
    fn non_png_signature_is_rejected() {
        let err = parse_png(b"not a png at all").unwrap_err();
        assert!(matches!(err, Error::NotAPng));
    }

    #[test]
    fn round_trips_byte_identical_ihdr_and_idat() {
        let bytes = encode(sample_ihdr(400, 6), &[7u8; 400 * 4 + 1]);
        let parsed = parse_png(&bytes).unwrap();
        let mut re_emitted = Vec::new();
        write_png(&mut re_emitted, &parsed).unwrap();
        assert_eq!(bytes, re_emitted);
    }
}
