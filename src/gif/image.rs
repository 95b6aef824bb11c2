use crate::bits::{BitReader, BitWriter};
use crate::error::{Error, Result};
use crate::lzw::{ContainerFlavor, LzwDecoder};

const EXTENSION_INTRODUCER: u8 = 0x21;
const IMAGE_SEPARATOR: u8 = 0x2C;
const TRAILER: u8 = 0x3B;
const GRAPHIC_CONTROL_LABEL: u8 = 0xF9;

/// One image of a GIF file: its decoded index stream plus everything needed
/// to write it back unchanged except for the LZW payload.
#[derive(Debug, Clone)]
pub struct GifFrame {
    /// Extension blocks, image descriptor and local palette, verbatim
    pub raw_header: Vec<u8>,
    /// The frame's LZW minimum code size
    pub code_size: u8,
    /// Decoded palette indices, in file (pass) order for interlaced frames
    pub pixels: Vec<u8>,
    pub offset_left: u16,
    pub offset_top: u16,
    pub width: u16,
    pub height: u16,
    pub interlaced: bool,
    pub local_palette_len: usize,
    /// Extension blocks preceding this frame, as (label, data)
    pub extensions: Vec<(u8, Vec<u8>)>,
    /// Size of the frame's original LZW payload in bits
    pub compressed_bits: u64,
    /// Offset of the descriptor's packed byte within `raw_header`
    pub(crate) packed_byte_offset: usize,
}

/// A parsed GIF file.
///
/// Everything outside the LZW payloads (signature, logical screen
/// descriptor, palettes, extension blocks, image descriptors, trailer) is
/// kept as raw byte slices and copied through verbatim on write; only the
/// per-frame LZW payload is replaced.
#[derive(Debug, Clone)]
pub struct GifImage {
    raw_header: Vec<u8>,
    raw_trailer: Vec<u8>,
    pub width: u16,
    pub height: u16,
    /// Bits per pixel implied by the global color table size field
    pub color_depth: u8,
    pub global_palette_len: usize,
    pub background_color: u8,
    animated: bool,
    frames: Vec<GifFrame>,
}

impl GifImage {
    /// Parse a complete GIF file and decode every frame's index stream.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut input = BitReader::new(data, data.len() as u64);

        // signature and version
        let mut signature = [0u8; 3];
        for byte in &mut signature {
            *byte = input.get_byte()?;
        }
        if &signature != b"GIF" {
            return Err(Error::BadGifSignature);
        }
        let mut version = [0u8; 3];
        for byte in &mut version {
            *byte = input.get_byte()?;
        }
        if version[0] != b'8' || (version[1] != b'7' && version[1] != b'9') || version[2] != b'a' {
            return Err(Error::BadGifVersion(version));
        }

        // logical screen descriptor
        let width = get_word(&mut input)?;
        let height = get_word(&mut input)?;
        let color_depth = input.get(3)? as u8 + 1;
        let _sorted = input.get_bool()?;
        input.get(3)?; // color resolution
        let has_global_palette = input.get_bool()?;
        let global_palette_len = if has_global_palette { 1usize << color_depth } else { 0 };
        let background_color = input.get_byte()?;
        let _aspect_ratio = input.get_byte()?;

        // palette entries travel inside the raw header slice
        for _ in 0..3 * global_palette_len {
            input.get_byte()?;
        }

        let header_len = input.bytes_read() as usize;
        let raw_header = data[..header_len].to_vec();

        let mut animated = false;
        let mut frames = Vec::new();

        loop {
            let frame_start = input.bytes_read() as usize;
            if input.peek(8)? as u8 == TRAILER {
                break;
            }

            // extension blocks
            let mut extensions = Vec::new();
            while input.peek(8)? as u8 == EXTENSION_INTRODUCER {
                input.consume(8)?;
                let label = input.get_byte()?;
                if label == GRAPHIC_CONTROL_LABEL {
                    animated = true;
                }

                let mut payload = Vec::new();
                loop {
                    let length = input.get_byte()?;
                    if length == 0 {
                        break;
                    }
                    for _ in 0..length {
                        payload.push(input.get_byte()?);
                    }
                }
                extensions.push((label, payload));
            }

            // image descriptor
            let introducer = input.get_byte()?;
            if introducer != IMAGE_SEPARATOR {
                return Err(Error::BadImageDescriptor(introducer));
            }
            let offset_left = get_word(&mut input)?;
            let offset_top = get_word(&mut input)?;
            let frame_width = get_word(&mut input)?;
            let frame_height = get_word(&mut input)?;

            let packed_byte_offset = input.bytes_read() as usize - frame_start;
            let local_size_bits = input.get(3)? as u8 + 1;
            input.get(2)?; // reserved
            let _local_sorted = input.get_bool()?;
            let interlaced = input.get_bool()?;
            let has_local_palette = input.get_bool()?;
            let local_palette_len = if has_local_palette { 1usize << local_size_bits } else { 0 };
            for _ in 0..3 * local_palette_len {
                input.get_byte()?;
            }

            let header_end = input.bytes_read() as usize;
            let raw_frame_header = data[frame_start..header_end].to_vec();

            // the LZW payload
            let code_size = input.get_byte()?;
            if !(2..=8).contains(&code_size) {
                return Err(Error::Unsupported(format!(
                    "LZW minimum code size {code_size} out of range"
                )));
            }
            let mut decoder = LzwDecoder::new(&mut input, ContainerFlavor::Gif);
            let pixels =
                decoder.decode(code_size, frame_width as usize * frame_height as usize)?;
            let compressed_bits = decoder.compressed_bits();
            if pixels.is_empty() {
                return Err(Error::TruncatedInput);
            }

            frames.push(GifFrame {
                raw_header: raw_frame_header,
                code_size,
                pixels,
                offset_left,
                offset_top,
                width: frame_width,
                height: frame_height,
                interlaced,
                local_palette_len,
                extensions,
                compressed_bits,
                packed_byte_offset,
            });
        }

        if frames.is_empty() {
            return Err(Error::TruncatedInput);
        }

        let raw_trailer = vec![input.get_byte()?];
        if !input.is_empty() {
            return Err(Error::Unsupported("trailing data after GIF trailer".into()));
        }

        Ok(Self {
            raw_header,
            raw_trailer,
            width,
            height,
            color_depth,
            global_palette_len,
            background_color,
            animated,
            frames,
        })
    }

    pub fn frames(&self) -> &[GifFrame] {
        &self.frames
    }

    pub(crate) fn frames_mut(&mut self) -> &mut [GifFrame] {
        &mut self.frames
    }

    pub fn is_animated(&self) -> bool {
        self.animated
    }

    /// Size of the original file's LZW payloads, in bits.
    pub fn total_lzw_bits(&self) -> u64 {
        self.frames.iter().map(|frame| frame.compressed_bits).sum()
    }

    /// Re-assemble the file with each frame's LZW payload replaced.
    ///
    /// `frames_bits` carries one replacement bitstream per frame; headers
    /// and the trailer are copied from the original byte-for-byte, and each
    /// payload is wrapped in sub-blocks of up to 255 bytes followed by the
    /// zero-length terminator.
    pub fn write_optimized(&self, frames_bits: &[BitWriter]) -> Vec<u8> {
        debug_assert_eq!(frames_bits.len(), self.frames.len());

        let mut out = self.raw_header.clone();
        for (frame, bits) in self.frames.iter().zip(frames_bits) {
            out.extend_from_slice(&frame.raw_header);
            out.push(frame.code_size);

            for chunk in bits.to_bytes().chunks(255) {
                out.push(chunk.len() as u8);
                out.extend_from_slice(chunk);
            }
            out.push(0);
        }
        out.extend_from_slice(&self.raw_trailer);
        out
    }
}

/// Read 16 bits, little endian.
fn get_word<R: std::io::Read>(input: &mut BitReader<R>) -> Result<u16> {
    let low = input.get_byte()? as u16;
    let high = input.get_byte()? as u16;
    Ok(low | (high << 8))
}
