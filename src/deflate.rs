//
// fragcat - deflate.rs - the deflate/inflate collaborator
//
// PNG's IDAT payload is zlib-wrapped deflate, not raw deflate: a 2-byte
// zlib header, the deflate stream, then a 4-byte Adler-32 trailer.
// miniz_oxide's `_zlib` entry points speak that framing directly.
//

use miniz_oxide::deflate::compress_to_vec_zlib;
use miniz_oxide::inflate::decompress_to_vec_zlib;

use crate::error::Error;

/// Inflates a zlib-wrapped IDAT payload back into raw scanline bytes.
pub fn inflate(src: &[u8]) -> Result<Vec<u8>, Error> {
    decompress_to_vec_zlib(src).map_err(|e| Error::CompressionError(format!("{e:?}")))
}

/// Deflates raw scanline bytes into a zlib-wrapped IDAT payload.
///
/// `level` is a miniz_oxide compression level, 0 (none) through 10 (best);
/// the orchestrator uses a fixed default but callers may tune it.
pub fn deflate(src: &[u8], level: u8) -> Vec<u8> {
    compress_to_vec_zlib(src, level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_arbitrary_bytes() {
        let original: Vec<u8> = (0u32..5000).map(|i| (i % 256) as u8).collect();
        for level in [0u8, 1, 6, 9] {
            let compressed = deflate(&original, level);
            let restored = inflate(&compressed).expect("inflate should succeed");
            assert_eq!(restored, original, "level {level} failed to round-trip");
        }
    }

    #[test]
    fn round_trips_empty_input() {
        let compressed = deflate(&[], 6);
        let restored = inflate(&compressed).unwrap();
        assert!(restored.is_empty());
    }

    #[test]
    fn garbage_input_is_a_compression_error() {
        let err = inflate(&[0xff, 0xff, 0xff, 0xff]).unwrap_err();
        assert!(matches!(err, Error::CompressionError(_)));
    }
}
