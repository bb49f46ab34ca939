//
// fragcat - crc32.rs - the CRC-32 collaborator
//
// PNG's chunk checksum is CRC-32/ISO-HDLC: polynomial 0xEDB88320 (reflected),
// initial value 0xFFFFFFFF, final XOR 0xFFFFFFFF. That's the exact algorithm
// `crc::CRC_32_ISO_HDLC` implements, and it's also what Ethernet (IEEE 802.3)
// and gzip use.
//

use crc::{Crc, CRC_32_ISO_HDLC};

static PNG_CRC: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Computes the PNG chunk checksum over `type ‖ payload`.
pub fn crc32(bytes: &[u8]) -> u32 {
    PNG_CRC.checksum(bytes)
}

/// Computes the checksum over two concatenated slices without allocating.
pub fn crc32_parts(type_code: &[u8], payload: &[u8]) -> u32 {
    let mut digest = PNG_CRC.digest();
    digest.update(type_code);
    digest.update(payload);
    digest.finalize()
}
