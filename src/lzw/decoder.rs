use super::ContainerFlavor;
use crate::bits::BitReader;
use crate::error::{Error, Result};
use std::io::Read;

/// Marker for "literal, no parent code".
const NO_PREVIOUS: u32 = u32::MAX;

/// Marker for ".Z has no end-of-stream code".
const NO_END_OF_STREAM: u32 = u32::MAX;

/// A decoder dictionary entry. The entry expands to the expansion of
/// `previous` followed by `last`; literals have no `previous` and length 1.
#[derive(Clone, Copy)]
struct BackReference {
    previous: u32,
    last: u8,
    length: u32,
}

/// Decodes an LZW token stream into the index stream the encoder must
/// reproduce.
///
/// For GIF the payload is wrapped in sub-blocks (a length byte followed by
/// up to 255 data bytes, terminated by a zero length); tokens are read
/// across sub-block boundaries low-order bits first. For .Z the payload is
/// raw and the decoder stops when the input runs out of whole tokens.
pub struct LzwDecoder<'a, R: Read> {
    input: &'a mut BitReader<R>,
    flavor: ContainerFlavor,
    /// GIF only: unread bits in the current sub-block
    bits_left_in_sub_block: u32,
    /// True number of compressed payload bits, for statistics
    compressed_bits: u64,
}

impl<'a, R: Read> LzwDecoder<'a, R> {
    pub fn new(input: &'a mut BitReader<R>, flavor: ContainerFlavor) -> Self {
        Self { input, flavor, bits_left_in_sub_block: 0, compressed_bits: 0 }
    }

    /// Number of payload bits consumed by `decode`, excluding trailing
    /// padding.
    pub fn compressed_bits(&self) -> u64 {
        self.compressed_bits
    }

    /// Decode one LZW payload. `expected_len` is a pre-allocation hint only.
    pub fn decode(&mut self, min_code_size: u8, expected_len: usize) -> Result<Vec<u8>> {
        let is_gif = self.flavor.is_gif();
        let max_code_size = self.flavor.max_code_size();

        let clear = 1u32 << min_code_size;
        let end_of_stream = if is_gif { clear + 1 } else { NO_END_OF_STREAM };
        let max_color = clear - 1;
        let max_token = 1u32 << max_code_size;

        let mut lut: Vec<BackReference> = Vec::with_capacity(max_token as usize);
        for i in 0..=max_color {
            lut.push(BackReference { previous: NO_PREVIOUS, last: i as u8, length: 1 });
        }
        // placeholders for the reserved codes, never expanded
        let reserved = if is_gif { 2 } else { 1 };
        for _ in 0..reserved {
            lut.push(BackReference { previous: NO_PREVIOUS, last: 0, length: 0 });
        }

        let mut code_size = min_code_size + 1;
        self.bits_left_in_sub_block = 0;

        let mut bytes = Vec::with_capacity(expected_len);

        // pass through the first token
        let mut token = self.get_lzw_bits(code_size)?;
        while token == clear {
            token = self.get_lzw_bits(code_size)?;
        }
        if token >= lut.len() as u32 {
            return Err(Error::InvalidToken { token, dict_size: lut.len() as u32, position: 0 });
        }
        if token != end_of_stream {
            bytes.push(token as u8);
        }

        let mut num_tokens_block: u32 = 1;

        while token != end_of_stream {
            // one more bit per code?
            if lut.len() as u32 == 1 << code_size && code_size < max_code_size {
                code_size += 1;
            }

            // .Z has no end-of-stream code: stop when no whole token is left
            if !is_gif && code_size as u64 > self.input.bits_left() {
                break;
            }

            let prev_token = token;
            token = self.get_lzw_bits(code_size)?;
            if token > lut.len() as u32 {
                return Err(Error::InvalidToken {
                    token,
                    dict_size: lut.len() as u32,
                    position: bytes.len() as u64,
                });
            }

            num_tokens_block += 1;

            // dictionary restart?
            let mut reset = false;
            while token == clear {
                if is_gif {
                    lut.truncate(clear as usize + 2);
                } else {
                    lut.truncate(clear as usize + 1);

                    // the stream continues at the next byte boundary, and a
                    // block's token count must be a multiple of 8
                    if self.compressed_bits % 8 != 0 {
                        let skip = 8 - (self.compressed_bits % 8) as u8;
                        self.get_lzw_bits(skip)?;
                    }
                    let gap = (8 - (num_tokens_block & 7)) & 7;
                    for _ in 0..gap {
                        self.input.get(code_size)?;
                    }
                }

                code_size = min_code_size + 1;

                // fetch the first token of the new block
                token = self.get_lzw_bits(code_size)?;
                num_tokens_block = 1;

                if token > max_color {
                    return Err(Error::InvalidToken {
                        token,
                        dict_size: lut.len() as u32,
                        position: bytes.len() as u64,
                    });
                }
                bytes.push(token as u8);
                reset = true;
            }
            if reset {
                continue;
            }

            if token == end_of_stream {
                break;
            }

            let mut add = BackReference {
                previous: prev_token,
                last: 0,
                length: lut[prev_token as usize].length + 1,
            };
            let pos = bytes.len();

            if token >= lut.len() as u32 {
                // the KwKwK case: the token being defined right now.
                // output and add previous + first byte of previous
                if token != lut.len() as u32 || lut.len() as u32 >= max_token {
                    return Err(Error::InvalidToken {
                        token,
                        dict_size: lut.len() as u32,
                        position: bytes.len() as u64,
                    });
                }
                expand(&lut, prev_token, &mut bytes);
                add.last = bytes[pos];
                bytes.push(add.last);
            } else {
                expand(&lut, token, &mut bytes);
                add.last = bytes[pos];
            }

            // a full dictionary without a clear code freezes; keep decoding
            // with the existing entries
            if (lut.len() as u32) < max_token {
                lut.push(add);
            }
        }

        // skip bits left over in the current sub-block
        let mut unused = self.bits_left_in_sub_block;
        let skipped = unused as u64;
        while unused > 8 {
            self.get_lzw_bits(8)?;
            unused -= 8;
        }
        if unused > 0 {
            self.get_lzw_bits(unused as u8)?;
        }
        self.compressed_bits -= skipped;

        // GIF: a zero-length sub-block must follow
        if is_gif && self.input.get_byte()? != 0 {
            return Err(Error::BadRestartFraming);
        }

        Ok(bytes)
    }

    /// Read bits from the LZW payload, unwrapping GIF sub-block framing.
    ///
    /// When a read crosses a sub-block boundary, the remaining bits of the
    /// current sub-block form the low-order part and bits of the following
    /// sub-block(s) the high-order part.
    fn get_lzw_bits(&mut self, num_bits: u8) -> Result<u32> {
        if num_bits == 0 {
            return Ok(0);
        }
        self.compressed_bits += num_bits as u64;

        // .Z has no framing, just read the bits
        if !self.flavor.is_gif() {
            return self.input.get(num_bits);
        }

        let mut result = 0u32;
        let mut shift = 0u8;
        let mut need = num_bits;
        loop {
            if need as u32 <= self.bits_left_in_sub_block {
                result |= self.input.get(need)? << shift;
                self.bits_left_in_sub_block -= need as u32;
                return Ok(result);
            }

            // drain the current sub-block into the low-order bits
            if self.bits_left_in_sub_block > 0 {
                let have = self.bits_left_in_sub_block as u8;
                result |= self.input.get(have)? << shift;
                shift += have;
                need -= have;
                self.bits_left_in_sub_block = 0;
            }

            let length = self.input.get_byte()?;
            if length == 0 {
                // the payload ended mid-token
                return Err(Error::TruncatedInput);
            }
            self.bits_left_in_sub_block = 8 * length as u32;
        }
    }
}

/// Append the expansion of `code` to `out` by walking the parent links,
/// filling the destination right-to-left.
fn expand(lut: &[BackReference], code: u32, out: &mut Vec<u8>) {
    let entry = lut[code as usize];
    if entry.length == 1 {
        out.push(entry.last);
        return;
    }

    out.resize(out.len() + entry.length as usize, 0);
    let mut pos = out.len();
    let mut code = code;
    let mut remaining = entry.length;
    while remaining > 0 {
        let e = &lut[code as usize];
        pos -= 1;
        out[pos] = e.last;
        code = e.previous;
        remaining -= 1;
    }
}
