/// Reflected Castagnoli polynomial.
const POLY: u32 = 0x82F6_3B78;

/// CRC-32C as used by the bag-of-cells trailer.
pub fn crc32c(data: &[u8]) -> u32 {
    let mut crc = !0u32;
    for &byte in data {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (POLY & mask);
        }
    }
    !crc
}
