//! Header checksum
//!
//! CRC-32 over the CKSUM polynomial (`0x04C11DB7`), processed MSB-first with
//! a zero initial register. Unlike POSIX `cksum`, the register is neither
//! inverted nor extended with the message length: the value stored in a PDS
//! header is the raw register after the last byte.

/// CKSUM generator polynomial (non-reflected form).
pub const CKSUM_POLY: u32 = 0x04C1_1DB7;

const TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u32) << 24;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000_0000 != 0 {
                (crc << 1) ^ CKSUM_POLY
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Incremental checksum state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Checksum {
    crc: u32,
}

impl Checksum {
    pub fn new() -> Self {
        Self { crc: 0 }
    }

    pub fn update(&mut self, data: &[u8]) {
        let mut crc = self.crc;
        for &byte in data {
            let idx = ((crc >> 24) ^ byte as u32) as usize;
            crc = (crc << 8) ^ TABLE[idx];
        }
        self.crc = crc;
    }

    pub fn finalize(self) -> u32 {
        self.crc
    }
}

/// Compute the checksum of `data` in one pass.
pub fn checksum(data: &[u8]) -> u32 {
    let mut state = Checksum::new();
    state.update(data);
    state.finalize()
}
