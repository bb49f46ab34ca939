//
// fragcat - raster.rs - the assembled image buffer
//
// Each strip is a handful of whole PNG scanlines (a one-byte filter tag
// followed by `width * channels` sample bytes); consumers place their strip
// at its known row offset and never touch another strip's rows. A plain
// `Mutex<Vec<u8>>` is enough: the critical section is one `copy_from_slice`,
// and worker counts stay low enough (SPEC_FULL.md caps `num_consumers` at 20)
// that lock contention never shows up next to the network I/O around it.
// Hand-rolled disjoint-slice aliasing would avoid the lock but buys safety
// risk for a speedup nothing here needs.
//

use std::sync::Mutex;

use crate::error::Error;

/// Bytes in one scanline: a leading filter-type byte plus `width * channels`
/// sample bytes.
pub fn stride(width: u32, channels: u32) -> usize {
    1 + (width as usize) * (channels as usize)
}

/// The final image's raw (decompressed, pre-filter-undo) scanline bytes,
/// addressable by absolute row.
pub struct Raster {
    width: u32,
    height: u32,
    channels: u32,
    buf: Mutex<Vec<u8>>,
}

impl Raster {
    pub fn new(width: u32, height: u32, channels: u32) -> Raster {
        let size = stride(width, channels) * height as usize;
        Raster { width, height, channels, buf: Mutex::new(vec![0u8; size]) }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Copies `scanlines` (raw bytes for `row_count` whole rows) into place
    /// starting at `first_row`. Fails closed: a strip of the wrong length or
    /// one that would run past the last row is rejected rather than
    /// truncated or wrapped.
    pub fn place(&self, first_row: u32, row_count: u32, scanlines: &[u8]) -> Result<(), Error> {
        if first_row.saturating_add(row_count) > self.height {
            return Err(Error::Resource(format!(
                "strip at row {first_row} spanning {row_count} rows exceeds raster height {}",
                self.height
            )));
        }
        let stride = stride(self.width, self.channels);
        let expected_len = stride * row_count as usize;
        if scanlines.len() != expected_len {
            return Err(Error::Configuration(format!(
                "strip has {} bytes, expected {expected_len} for {row_count} row(s) of width {}",
                scanlines.len(),
                self.width
            )));
        }

        let byte_offset = stride * first_row as usize;
        let mut buf = self.buf.lock().unwrap();
        buf[byte_offset..byte_offset + expected_len].copy_from_slice(scanlines);
        Ok(())
    }

    /// Consumes the raster, returning its raw scanline bytes for deflation.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf.into_inner().unwrap()
    }
}
