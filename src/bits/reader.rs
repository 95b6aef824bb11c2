use crate::error::{Error, Result};
use std::io::Read;

/// Size of the byte cache between the underlying reader and the bit buffer.
const CACHE_SIZE: usize = 1024;

/// Bit-level reader for LZW streams.
///
/// GIF and .Z pack bits LSB-first within bytes: the next bit is the least
/// significant unread bit of the current byte. Up to 16 bits can be peeked
/// or consumed at a time.
///
/// The total input size is supplied at construction so that `bits_left` is
/// exact and any over-read fails with `TruncatedInput` instead of blocking
/// on the underlying reader.
pub struct BitReader<R: Read> {
    reader: R,
    /// Byte cache refilled from the underlying reader
    cache: [u8; CACHE_SIZE],
    cache_len: usize,
    cache_pos: usize,
    /// Bit accumulator, low bits are the next bits to be read
    bit_buffer: u32,
    /// Number of valid bits in `bit_buffer` (0-23)
    bits_in_buffer: u8,
    /// Bytes pulled from the underlying reader so far
    bytes_fetched: u64,
    /// Total size of the input in bytes
    total_bytes: u64,
    /// Bits handed out via `consume`
    bits_consumed: u64,
}

impl<R: Read> BitReader<R> {
    pub fn new(reader: R, total_bytes: u64) -> Self {
        Self {
            reader,
            cache: [0; CACHE_SIZE],
            cache_len: 0,
            cache_pos: 0,
            bit_buffer: 0,
            bits_in_buffer: 0,
            bytes_fetched: 0,
            total_bytes,
            bits_consumed: 0,
        }
    }

    /// Look at the next `n` bits (1-16) without consuming them.
    pub fn peek(&mut self, n: u8) -> Result<u32> {
        debug_assert!(n >= 1 && n <= 16, "peek supports 1-16 bits");

        if n as u64 > self.bits_left() {
            return Err(Error::TruncatedInput);
        }

        while self.bits_in_buffer < n {
            let byte = self.next_cached_byte()?;
            self.bit_buffer |= (byte as u32) << self.bits_in_buffer;
            self.bits_in_buffer += 8;
        }

        let mask = (1u32 << n) - 1;
        Ok(self.bit_buffer & mask)
    }

    /// Advance past `n` bits (1-16) that were previously peeked.
    pub fn consume(&mut self, n: u8) -> Result<()> {
        if self.bits_in_buffer < n {
            self.peek(n)?;
        }

        self.bit_buffer >>= n;
        self.bits_in_buffer -= n;
        self.bits_consumed += n as u64;
        Ok(())
    }

    /// Read `n` bits (1-16): `peek` then `consume`.
    pub fn get(&mut self, n: u8) -> Result<u32> {
        let result = self.peek(n)?;
        self.consume(n)?;
        Ok(result)
    }

    /// Read a full byte.
    pub fn get_byte(&mut self) -> Result<u8> {
        self.get(8).map(|v| v as u8)
    }

    /// Read a single bit.
    pub fn get_bool(&mut self) -> Result<bool> {
        Ok(self.get(1)? != 0)
    }

    /// Number of unconsumed bits remaining in the input.
    pub fn bits_left(&self) -> u64 {
        self.total_bytes * 8 - self.bits_consumed
    }

    /// True if every bit has been consumed.
    pub fn is_empty(&self) -> bool {
        self.bits_left() == 0
    }

    /// Number of whole bytes consumed so far.
    ///
    /// Callers use this at byte boundaries only (for slicing raw container
    /// headers out of the input), so the bit remainder is always zero there.
    pub fn bytes_read(&self) -> u64 {
        self.bits_consumed / 8
    }

    /// Pull one byte through the cache, refilling it when exhausted.
    fn next_cached_byte(&mut self) -> Result<u8> {
        if self.cache_pos >= self.cache_len {
            let remaining = self.total_bytes - self.bytes_fetched;
            if remaining == 0 {
                return Err(Error::TruncatedInput);
            }
            let want = (remaining as usize).min(CACHE_SIZE);
            let mut filled = 0;
            while filled == 0 {
                match self.reader.read(&mut self.cache[..want]) {
                    Ok(0) => return Err(Error::TruncatedInput),
                    Ok(n) => filled = n,
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                    Err(e) => return Err(Error::Io(e)),
                }
            }
            self.cache_len = filled;
            self.cache_pos = 0;
        }

        let byte = self.cache[self.cache_pos];
        self.cache_pos += 1;
        self.bytes_fetched += 1;
        Ok(byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(data: &[u8]) -> BitReader<&[u8]> {
        BitReader::new(data, data.len() as u64)
    }

    #[test]
    fn test_get_bits_lsb_first() {
        // 0xD3 = 11010011: LSB-first reads give 011 then 11010
        let data = [0xD3, 0xAA];
        let mut r = reader(&data);
        assert_eq!(r.get(3).unwrap(), 0b011);
        assert_eq!(r.get(5).unwrap(), 0b11010);
        assert_eq!(r.get(8).unwrap(), 0xAA);
    }

    #[test]
    fn test_peek_is_idempotent() {
        let data = [0b1010_0101];
        let mut r = reader(&data);
        assert_eq!(r.peek(4).unwrap(), 0b0101);
        assert_eq!(r.peek(4).unwrap(), 0b0101);
        assert_eq!(r.get(4).unwrap(), 0b0101);
        assert_eq!(r.get(4).unwrap(), 0b1010);
    }

    #[test]
    fn test_cross_byte_boundary() {
        let data = [0xFF, 0x00];
        let mut r = reader(&data);
        assert_eq!(r.get(12).unwrap(), 0x0FF);
        assert_eq!(r.bits_left(), 4);
    }

    #[test]
    fn test_bits_left_and_bytes_read() {
        let data = [0x12, 0x34, 0x56];
        let mut r = reader(&data);
        assert_eq!(r.bits_left(), 24);
        r.get_byte().unwrap();
        assert_eq!(r.bytes_read(), 1);
        r.get(16).unwrap();
        assert_eq!(r.bytes_read(), 3);
        assert!(r.is_empty());
    }

    #[test]
    fn test_truncated_input() {
        let data = [0xFF];
        let mut r = reader(&data);
        r.get(4).unwrap();
        assert!(matches!(r.get(5), Err(Error::TruncatedInput)));
        // the remaining 4 bits are still readable
        assert_eq!(r.get(4).unwrap(), 0x0F);
    }

    #[test]
    fn test_refill_across_cache_boundary() {
        // more than one cache line of data
        let data: Vec<u8> = (0..=255).cycle().take(3000).collect();
        let mut r = reader(&data);
        for (i, &expected) in data.iter().enumerate() {
            assert_eq!(r.get_byte().unwrap(), expected, "byte {i}");
        }
        assert!(r.is_empty());
    }

    #[test]
    fn test_short_source_fails() {
        // reader claims 4 bytes but the source only has 2
        let data = [0xAB, 0xCD];
        let mut r = BitReader::new(&data[..], 4);
        r.get(16).unwrap();
        assert!(matches!(r.get(16), Err(Error::TruncatedInput)));
    }
}
