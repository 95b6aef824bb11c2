use crate::bits::{BitReader, BitWriter};
use crate::error::{Error, Result};
use crate::lzw::{ContainerFlavor, LzwDecoder};

/// Magic bytes of a .Z file.
pub const Z_MAGIC: [u8; 2] = [0x1F, 0x9D];

/// Settings byte: block mode (clear codes allowed), required
const BLOCK_MODE: u8 = 0x80;
/// Settings byte: reserved bits, must be zero
const RESERVED_FLAGS: u8 = 0x60;
/// Settings byte: maximum code width
const CODE_SIZE_MASK: u8 = 0x1F;

/// Quick magic sniff, without parsing anything else.
pub fn is_unix_z(data: &[u8]) -> bool {
    data.len() >= 2 && data[..2] == Z_MAGIC
}

/// A parsed Unix compress (.Z) file.
///
/// The container is just the two magic bytes and a settings byte; the LZW
/// payload follows raw, with no framing and no end-of-stream code.
#[derive(Debug, Clone)]
pub struct ZFile {
    settings: u8,
    /// Decompressed contents
    pub data: Vec<u8>,
    /// Size of the original LZW payload in bits
    pub compressed_bits: u64,
}

impl ZFile {
    pub fn parse(input: &[u8]) -> Result<Self> {
        if input.len() < 3 {
            return Err(Error::TruncatedInput);
        }
        if input[..2] != Z_MAGIC {
            return Err(Error::BadZMagic(((input[0] as u16) << 8) | input[1] as u16));
        }

        let settings = input[2];
        if settings & BLOCK_MODE == 0 {
            return Err(Error::NotBlockMode(settings));
        }
        if settings & RESERVED_FLAGS != 0 {
            return Err(Error::UnknownZFlags(settings));
        }
        let max_code_size = settings & CODE_SIZE_MASK;
        if !(9..=16).contains(&max_code_size) {
            return Err(Error::UnsupportedCodeWidth(max_code_size));
        }

        let payload = &input[3..];
        if payload.is_empty() {
            // compress writes a bare header for empty input
            return Ok(Self { settings, data: Vec::new(), compressed_bits: 0 });
        }

        let mut reader = BitReader::new(payload, payload.len() as u64);
        let mut decoder =
            LzwDecoder::new(&mut reader, ContainerFlavor::UnixZ { max_code_size });
        // crude pre-allocation guess
        let data = decoder.decode(8, payload.len() * 3)?;
        let compressed_bits = decoder.compressed_bits();

        Ok(Self { settings, data, compressed_bits })
    }

    /// Maximum LZW code width from the settings byte.
    pub fn max_code_size(&self) -> u8 {
        self.settings & CODE_SIZE_MASK
    }

    pub fn flavor(&self) -> ContainerFlavor {
        ContainerFlavor::UnixZ { max_code_size: self.max_code_size() }
    }

    /// Re-assemble the file with the LZW payload replaced. The settings
    /// byte is copied from the original so the emitted stream and the
    /// header always agree.
    pub fn write_optimized(&self, bits: &BitWriter) -> Vec<u8> {
        let mut out = Vec::with_capacity(3 + bits.to_bytes().len());
        out.extend_from_slice(&Z_MAGIC);
        out.push(self.settings);
        out.extend_from_slice(&bits.to_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn z_header(max_bits: u8) -> Vec<u8> {
        vec![0x1F, 0x9D, BLOCK_MODE | max_bits]
    }

    #[test]
    fn test_parse_simple_stream() {
        // 9-bit tokens: 'a', 'b', 257 ("ab")
        let mut bits = BitWriter::new();
        bits.write_bits(b'a' as u32, 9);
        bits.write_bits(b'b' as u32, 9);
        bits.write_bits(257, 9);

        let mut file = z_header(16);
        file.extend_from_slice(&bits.to_bytes());

        let z = ZFile::parse(&file).unwrap();
        assert_eq!(z.data, b"abab");
        assert_eq!(z.max_code_size(), 16);
    }

    #[test]
    fn test_parse_empty_payload() {
        let z = ZFile::parse(&z_header(16)).unwrap();
        assert!(z.data.is_empty());
    }

    #[test]
    fn test_bad_magic() {
        let data = [0x1F, 0x8B, 0x90];
        assert!(matches!(ZFile::parse(&data), Err(Error::BadZMagic(0x1F8B))));
    }

    #[test]
    fn test_not_block_mode() {
        let data = [0x1F, 0x9D, 0x10];
        assert!(matches!(ZFile::parse(&data), Err(Error::NotBlockMode(0x10))));
    }

    #[test]
    fn test_reserved_flags() {
        let data = [0x1F, 0x9D, BLOCK_MODE | 0x20 | 16];
        assert!(matches!(ZFile::parse(&data), Err(Error::UnknownZFlags(_))));
    }

    #[test]
    fn test_unsupported_code_width() {
        let data = [0x1F, 0x9D, BLOCK_MODE | 5];
        assert!(matches!(ZFile::parse(&data), Err(Error::UnsupportedCodeWidth(5))));
    }

    #[test]
    fn test_write_optimized_header() {
        let z = ZFile::parse(&z_header(16)).unwrap();
        let out = z.write_optimized(&BitWriter::new());
        assert_eq!(out, z_header(16));
    }

    #[test]
    fn test_is_unix_z() {
        assert!(is_unix_z(&[0x1F, 0x9D, 0x90]));
        assert!(!is_unix_z(&[0x1F, 0x8B, 0x90]));
        assert!(!is_unix_z(b"GIF89a"));
    }
}
