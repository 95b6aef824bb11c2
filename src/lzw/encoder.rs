use super::dictionary::{ChildTable, UNKNOWN};
use super::ContainerFlavor;
use crate::bits::BitWriter;
use crate::error::{Error, Result};

/// Knobs for one optimization run.
#[derive(Clone, Debug)]
pub struct OptimizerSettings {
    /// Bits per LZW code before the variable widening starts
    pub min_code_size: u8,
    /// For compatibility: the first code sent to the output is a clear code
    pub start_with_clear_code: bool,

    /// If true only greedy matches are considered
    pub greedy: bool,
    /// Minimum greedy match length for which non-greedy search is attempted
    pub min_non_greedy_match: u32,
    /// Minimum number of bytes a non-greedy split must gain
    pub min_improvement: u32,

    /// A block stops growing once the dictionary reaches this size (0 = off)
    pub max_dictionary: u32,
    /// A block stops growing after this many tokens (0 = off)
    pub max_tokens: u32,
    /// Allow non-greedy search inside runs of a single byte value
    pub split_runs: bool,

    /// Granularity of eligible block-start offsets
    pub alignment: u32,

    /// Skip cost bookkeeping (final emission pass only)
    pub read_only_best: bool,
    /// Skip re-evaluation of offsets whose stored plan used no non-greedy
    /// matches (second pass of the two-phase mode)
    pub avoid_non_greedy_again: bool,
}

/// Summary of one block along the planned shortest path.
#[derive(Clone, Copy, Debug)]
pub struct BlockPlan {
    /// Start offset in the index stream
    pub offset: usize,
    /// Uncompressed bytes covered
    pub length: u32,
    /// Estimated compressed bits, including the closing code
    pub bits: u32,
    /// LZW tokens
    pub tokens: u32,
    /// Non-greedy choices made
    pub nongreedy: u32,
    /// True if the block boundary truncated the final match
    pub partial: bool,
}

/// The plan found for one eligible block-start offset: the best block
/// starting there, given the already-known cost of everything after it.
#[derive(Clone, Copy, Default)]
struct BestBlock {
    /// Uncompressed bytes consumed by this block
    length: u32,
    /// Bits emitted by this block alone, including the closing code
    bits: u32,
    /// `bits` plus the total of all following blocks; 0 = no plan yet
    total_bits: u64,
    /// LZW tokens in this block
    tokens: u32,
    /// Non-greedy choices made in this block
    nongreedy: u32,
    /// True if the final match was truncated at the block boundary
    partial: bool,
}

/// Re-encodes an index stream as LZW, choosing dictionary-restart points
/// that minimize the total compressed bit count.
///
/// `optimize_partial` evaluates (or, in the emission pass, replays) a
/// single block; calling it for every aligned offset in decreasing order
/// fills the shortest-path table, after which `optimize` walks the chain
/// of best blocks and emits the final bitstream.
pub struct LzwEncoder<'a> {
    data: &'a [u8],
    flavor: ContainerFlavor,
    dictionary: ChildTable,
    dict_size: u32,
    /// Absolute dictionary limit, `1 << max_code_len`
    dict_ceiling: u32,
    max_code_len: u8,
    best: Vec<BestBlock>,
}

impl<'a> LzwEncoder<'a> {
    pub fn new(data: &'a [u8], flavor: ContainerFlavor) -> Self {
        let max_code_len = flavor.max_code_size();
        let dict_ceiling = flavor.max_dictionary();
        Self {
            data,
            flavor,
            dictionary: ChildTable::new(dict_ceiling),
            dict_size: 0,
            dict_ceiling,
            max_code_len,
            best: Vec::new(),
        }
    }

    /// Total compressed bits of the best plan starting at offset 0, without
    /// the optional clear-code prefix.
    pub fn planned_bits(&self) -> Option<u64> {
        match self.best.first() {
            Some(cell) if cell.total_bits > 0 => Some(cell.total_bits),
            _ => None,
        }
    }

    /// Length of the longest dictionary match starting at `from`, capped at
    /// `max_length`. At least 1: every single byte is a dictionary entry.
    fn find_match(&self, from: usize, max_length: usize) -> usize {
        let mut code = self.data[from] as u32;
        for length in 1..max_length {
            code = self.dictionary.child(code, self.data[from + length]);
            if code == UNKNOWN {
                return length;
            }
        }
        max_length
    }

    /// Return the code for `data[from..from + length]` and extend the
    /// dictionary with that string plus the following byte.
    fn add_code(&mut self, from: usize, length: usize) -> u32 {
        // the walk cannot leave the table: every prefix of a match reported
        // by find_match has a code
        let mut code = self.data[from] as u32;
        for offset in from + 1..from + length {
            code = self.dictionary.child(code, self.data[offset]);
        }

        if from + length < self.data.len() && self.dict_size < self.dict_ceiling {
            // keep an existing link: with non-greedy parsing the same string
            // can be added twice and the earliest code must win
            self.dictionary.link(code, self.data[from + length], self.dict_size);
            self.dict_size += 1;
        }

        code
    }

    /// Width of the closing clear / end-of-stream code.
    ///
    /// The decoder widens its codes when its table reaches a power of two.
    /// Mid-stream its table holds one entry less than ours (it adds entries
    /// one token later); on the final token of the input our side skips the
    /// add and the counts agree.
    fn close_code_width(&self, at_end_of_input: bool) -> u8 {
        let decoder_entries =
            if at_end_of_input { self.dict_size } else { self.dict_size - 1 };
        min_bits(decoder_entries).min(self.max_code_len)
    }

    /// Evaluate (or emit) a single block starting at `from`.
    ///
    /// Simulates encoding forward from `from`; after each token, if the
    /// current end offset is aligned (or the end of the input), computes the
    /// cost of closing the block there plus the already-known cost of the
    /// rest, and relaxes the shortest-path cell for `from`. Iterating `from`
    /// in decreasing order makes every successor cost available when needed.
    ///
    /// With `emit` set the same token sequence is written to the returned
    /// bitstream, including the closing clear / end-of-stream code and, for
    /// .Z, the restart padding.
    pub fn optimize_partial(
        &mut self,
        from: usize,
        max_length: usize,
        emit: bool,
        is_final: bool,
        settings: &OptimizerSettings,
    ) -> Result<BitWriter> {
        let alignment = settings.alignment.max(1) as usize;
        if self.best.is_empty() {
            self.best = vec![BestBlock::default(); self.data.len() / alignment + 2];
        }

        let mut length = self.data.len() - from;
        if max_length != 0 && length > max_length {
            length = max_length;
        }

        let mut result = if emit { BitWriter::with_capacity(length) } else { BitWriter::new() };

        if from % alignment != 0 {
            return Err(Error::Internal(format!(
                "block start {from} is not aligned to {alignment}"
            )));
        }
        let from_aligned = from / alignment;

        // second pass of the two-phase mode: nothing to gain where the
        // non-greedy pass made no non-greedy choices
        if settings.greedy
            && settings.avoid_non_greedy_again
            && !emit
            && self.best[from_aligned].nongreedy == 0
            && self.best[from_aligned].length > 0
        {
            return Ok(result);
        }

        let is_gif = self.flavor.is_gif();
        let clear = 1u32 << settings.min_code_size;
        let end_of_stream = clear + 1;

        self.dictionary.reset();
        self.dict_size = if is_gif { clear + 2 } else { clear + 1 };

        let mut num_bits: u32 = 0;
        let mut num_tokens: u32 = 0;
        let mut num_non_greedy: u32 = 0;
        // bytes of the current match not yet consumed
        let mut match_length: usize = 0;
        let mut code_size = min_bits(self.dict_size);

        let last_pos = from + length - 1;
        for i in from..=last_pos {
            let num_bytes = i - from + 1;

            // ----- match finding -----
            if match_length == 0 {
                // oversized blocks rarely compress better, and some broken
                // decoders choke on a full dictionary
                if settings.max_dictionary > 0 && self.dict_size >= settings.max_dictionary {
                    break;
                }
                if settings.max_tokens > 0 && num_tokens >= settings.max_tokens {
                    break;
                }

                let remaining = length + from - i;
                match_length = self.find_match(i, remaining);

                let mut try_non_greedy = !settings.greedy;
                if match_length == 1 || (match_length as u32) < settings.min_non_greedy_match {
                    try_non_greedy = false;
                }
                // pointless close to the end of the input
                if i + match_length + 4 >= self.data.len() {
                    try_non_greedy = false;
                }

                // don't split long runs of the same byte
                if try_non_greedy && !settings.split_runs {
                    let last_match_byte = match_length - 1;
                    let mut all_same = self.data[i] == self.data[i + last_match_byte];
                    let mut scan = 1;
                    while scan + 1 < last_match_byte && all_same {
                        all_same = self.data[i] == self.data[i + scan];
                        scan += 1;
                    }
                    if all_same {
                        try_non_greedy = false;
                    }
                }

                // flexible parsing: a shorter match now can enable a longer
                // match right after
                if try_non_greedy {
                    let second = self.find_match(i + match_length, remaining - match_length);
                    let mut best_sum = match_length + second;
                    let at_least = best_sum + settings.min_improvement as usize;

                    let mut choice = match_length;
                    for shorter in (1..match_length).rev() {
                        let next = self.find_match(i + shorter, remaining - shorter);
                        let sum = shorter + next;
                        if sum >= at_least && sum > best_sum {
                            best_sum = sum;
                            choice = shorter;
                        }
                    }

                    if choice < match_length {
                        match_length = choice;
                        num_non_greedy += 1;
                    }
                }

                // ----- LZW code generation -----

                // one more bit per code once the dictionary crosses a power
                // of two
                if self.dict_size < self.dict_ceiling {
                    let threshold = self.dict_size - 1;
                    if threshold & (threshold - 1) == 0 && code_size < self.max_code_len {
                        code_size += 1;
                        // .Z: the first token is still 9 bits wide
                        if !is_gif && threshold == 256 {
                            code_size -= 1;
                        }
                    }
                }

                let code = self.add_code(i, match_length);
                if emit {
                    result.write_bits(code, code_size);
                }

                num_bits += code_size as u32;
                num_tokens += 1;
            }

            // consume one byte of the current match
            match_length -= 1;

            // ----- cost evaluation -----

            if settings.read_only_best {
                continue;
            }

            let is_last_byte = i + 1 == self.data.len();
            let next = i + 1;
            let next_aligned =
                if alignment > 1 { (next + alignment - 1) / alignment } else { next };
            // no plan for the remainder means this end point is unusable
            if !is_last_byte && self.best[next_aligned].total_bits == 0 {
                continue;
            }
            // only aligned end points may become block boundaries
            if alignment > 1 && num_bytes % alignment != 0 && !is_last_byte {
                continue;
            }

            // closing the block here costs one clear / end-of-stream code at
            // the width the decoder will read it with. The decoder's table
            // trails ours by one entry, except at the end of the input where
            // it catches up.
            let mut close_bits = self.close_code_width(is_last_byte) as u32;

            if !is_gif {
                // .Z restarts are only attempted at the full code width;
                // the realignment rules are not well-defined otherwise
                if !is_last_byte && code_size < 16 {
                    continue;
                }

                // no end-of-stream token in the .Z format
                if is_last_byte {
                    close_bits = 0;
                }

                // fill the last byte
                if num_bits % 8 != 0 {
                    close_bits += 8 - num_bits % 8;
                }

                // a restart is followed by zero tokens until the block holds
                // a multiple of 8
                if !is_last_byte {
                    let tokens_plus_clear = num_tokens + 1;
                    let gap = (8 - (tokens_plus_clear & 7)) & 7;
                    close_bits += code_size as u32 * gap;
                }
            }

            let is_partial = match_length > 0;
            let true_bits = num_bits + close_bits;
            let total_bits = true_bits as u64 + self.best[next_aligned].total_bits;

            // relax the cell; on equal cost the longer block wins, fewer
            // restarts decode faster
            let best = &mut self.best[from_aligned];
            if best.total_bits == 0 || best.total_bits >= total_bits {
                best.bits = true_bits;
                best.total_bits = total_bits;
                best.length = num_bytes as u32;
                best.tokens = num_tokens;
                best.partial = is_partial;
                best.nongreedy = num_non_greedy;
            }
        }

        if emit {
            // close the block: clear mid-stream, end-of-stream at the end
            code_size = self.close_code_width(is_final);
            if is_gif {
                result.write_bits(if is_final { end_of_stream } else { clear }, code_size);
            } else {
                if !is_final {
                    result.write_bits(clear, code_size);
                    num_tokens += 1;
                }

                while result.bit_len() % 8 != 0 {
                    result.write_bit(false);
                }

                if !is_final {
                    if code_size != 16 {
                        return Err(Error::Internal(format!(
                            "dictionary restart requires 16-bit codes, current width is {code_size}"
                        )));
                    }
                    // same formulas as the decoder's restart realignment
                    let gap = (8 - (num_tokens & 7)) & 7;
                    let num_zeros = code_size as u32 * gap / 8;
                    for _ in 0..8 * num_zeros {
                        result.write_bit(false);
                    }
                }
            }
        }

        Ok(result)
    }

    /// The chain of blocks along the shortest path found by repeated
    /// `optimize_partial` calls.
    pub fn planned_blocks(&self, alignment: u32) -> Result<Vec<BlockPlan>> {
        let alignment = alignment.max(1) as usize;

        let mut pos = 0usize;
        let mut plans = Vec::new();
        while pos < self.data.len() {
            let cell = self.best.get(pos / alignment).copied().unwrap_or_default();
            if cell.length == 0 {
                return Err(Error::Internal(format!(
                    "no feasible block at offset {pos}; choose a smaller alignment or a higher token limit"
                )));
            }
            plans.push(BlockPlan {
                offset: pos,
                length: cell.length,
                bits: cell.bits,
                tokens: cell.tokens,
                nongreedy: cell.nongreedy,
                partial: cell.partial,
            });
            pos += cell.length as usize;
        }
        Ok(plans)
    }

    /// Walk the shortest path found by repeated `optimize_partial` calls
    /// and emit the bitstream along it.
    pub fn optimize(&mut self, settings: &OptimizerSettings) -> Result<BitWriter> {
        let restarts: Vec<usize> = self
            .planned_blocks(settings.alignment)?
            .iter()
            .map(|plan| plan.offset + plan.length as usize)
            .collect();
        self.merge(&restarts, settings)
    }

    /// Emit the bitstream for known block boundaries.
    pub fn merge(&mut self, restarts: &[usize], settings: &OptimizerSettings) -> Result<BitWriter> {
        let mut result = BitWriter::with_capacity(self.data.len());

        if settings.start_with_clear_code && self.flavor.is_gif() {
            result.write_bits(1u32 << settings.min_code_size, settings.min_code_size + 1);
        }

        if restarts.is_empty() {
            return Ok(result);
        }
        let mut restarts = restarts.to_vec();
        if restarts[restarts.len() - 1] < self.data.len() {
            restarts.push(self.data.len());
        }

        let alignment = settings.alignment.max(1) as usize;
        let mut local = settings.clone();
        local.read_only_best = true;

        let mut pos = 0usize;
        for (index, &end) in restarts.iter().enumerate() {
            // a leading zero entry is just a block-start marker; entries
            // that don't advance carry no block
            if end <= pos {
                continue;
            }
            let is_final = index == restarts.len() - 1;
            let block_length = end - pos;

            // emission shortcut: where the plan made no non-greedy choices,
            // greedy replay produces the identical token sequence
            if !self.best.is_empty() {
                local.greedy = self.best[pos / alignment].nongreedy == 0;
                if local.greedy {
                    local.avoid_non_greedy_again = true;
                }
            }

            let block = self.optimize_partial(pos, block_length, true, is_final, &local)?;
            if block.is_empty() && block_length > 0 {
                return Err(Error::Internal(format!(
                    "emitted block at offset {pos} (length {block_length}) is empty"
                )));
            }
            result.extend(&block);

            pos = end;
        }

        Ok(result)
    }
}

/// Minimum number of bits needed to represent `value`.
fn min_bits(value: u32) -> u8 {
    if value == 0 {
        1
    } else {
        (32 - value.leading_zeros()) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::BitReader;
    use crate::lzw::LzwDecoder;

    fn gif_settings(min_code_size: u8) -> OptimizerSettings {
        OptimizerSettings {
            min_code_size,
            start_with_clear_code: true,
            greedy: true,
            min_non_greedy_match: 2,
            min_improvement: 1,
            max_dictionary: 0,
            max_tokens: 20_000,
            split_runs: false,
            alignment: 1,
            read_only_best: false,
            avoid_non_greedy_again: false,
        }
    }

    /// Run the full pipeline: DP over all offsets, then emission.
    fn optimize_gif(data: &[u8], settings: &OptimizerSettings) -> (BitWriter, u64) {
        let mut encoder = LzwEncoder::new(data, ContainerFlavor::Gif);
        for i in (0..data.len()).rev() {
            if i % settings.alignment.max(1) as usize != 0 {
                continue;
            }
            encoder.optimize_partial(i, 0, false, true, settings).unwrap();
        }
        let planned = encoder.planned_bits().unwrap();
        (encoder.optimize(settings).unwrap(), planned)
    }

    /// Decode an emitted GIF bitstream (wrapped in one big sub-block run).
    fn decode_payload(bits: &BitWriter, min_code_size: u8) -> Vec<u8> {
        let mut payload = Vec::new();
        for chunk in bits.to_bytes().chunks(255) {
            payload.push(chunk.len() as u8);
            payload.extend_from_slice(chunk);
        }
        payload.push(0);

        let mut input = BitReader::new(payload.as_slice(), payload.len() as u64);
        let mut decoder = LzwDecoder::new(&mut input, ContainerFlavor::Gif);
        decoder.decode(min_code_size, 1024).unwrap()
    }

    #[test]
    fn test_single_color_image() {
        // 100 zero pixels at min code size 2: clear(4)@3, then 0@3, 6@3,
        // 7@3, 8..11@4 ... growing runs of zeros, then eos
        let data = [0u8; 100];
        let settings = gif_settings(2);
        let (bits, planned) = optimize_gif(&data, &settings);

        // token widths: 4x3 + 8x4 + 4x5 bits
        assert_eq!(bits.bit_len(), 64);
        assert_eq!(planned + 3, bits.bit_len() as u64); // prefix clear code

        // spot-check the leading tokens
        let bytes = bits.to_bytes();
        let mut reader = BitReader::new(bytes.as_slice(), bytes.len() as u64);
        assert_eq!(reader.get(3).unwrap(), 4); // clear
        assert_eq!(reader.get(3).unwrap(), 0); // "0"
        assert_eq!(reader.get(3).unwrap(), 6); // "00"
        assert_eq!(reader.get(3).unwrap(), 7); // "000"
        assert_eq!(reader.get(4).unwrap(), 8); // "0000"

        assert_eq!(decode_payload(&bits, 2), data);
    }

    #[test]
    fn test_alternating_pixels() {
        // 0,1,0,1,... of length 16: greedy is already optimal, the payload
        // is deterministic: 9 tokens, 4x3 + 5x4 = 32 bits
        let data: Vec<u8> = (0..16).map(|i| i & 1).collect();
        let settings = gif_settings(2);
        let (bits, _) = optimize_gif(&data, &settings);

        assert_eq!(bits.bit_len(), 32);
        assert_eq!(decode_payload(&bits, 2), data);

        // non-greedy search cannot improve on greedy here
        let mut nongreedy = settings.clone();
        nongreedy.greedy = false;
        let (bits2, _) = optimize_gif(&data, &nongreedy);
        assert_eq!(bits2.bit_len(), 32);
    }

    #[test]
    fn test_close_code_widens_with_the_decoder_table() {
        // after "0", "1" and "01" the decoder's table holds exactly 8
        // entries, so it reads the end-of-stream code 4 bits wide
        let data = [0u8, 1, 0, 1];
        let settings = gif_settings(2);
        let (bits, _) = optimize_gif(&data, &settings);
        assert_eq!(bits.bit_len(), 3 + 3 * 3 + 4);
        assert_eq!(decode_payload(&bits, 2), data);
    }

    #[test]
    fn test_roundtrip_mixed_data() {
        let data: Vec<u8> = b"the quick brown fox jumps over the lazy dog, the lazy dog sleeps"
            .iter()
            .map(|&b| b & 0x3F)
            .collect();
        let settings = gif_settings(6);
        let (bits, _) = optimize_gif(&data, &settings);
        assert_eq!(decode_payload(&bits, 6), data);
    }

    #[test]
    fn test_roundtrip_nongreedy() {
        // patterned data where flexible parsing has room to work
        let mut data = Vec::new();
        for _ in 0..12 {
            data.extend_from_slice(&[1, 2, 3, 1, 2, 1, 2, 3, 3, 2, 1]);
        }
        let mut settings = gif_settings(2);
        settings.greedy = false;

        let (bits, _) = optimize_gif(&data, &settings);
        assert_eq!(decode_payload(&bits, 2), data);

        // and never worse than greedy
        let (greedy_bits, _) = optimize_gif(&data, &gif_settings(2));
        assert!(bits.bit_len() <= greedy_bits.bit_len());
    }

    #[test]
    fn test_emitted_bits_match_planned_cost() {
        let data: Vec<u8> = (0u32..600).map(|i| ((i * 7) % 13) as u8).collect();
        let settings = gif_settings(4);
        let (bits, planned) = optimize_gif(&data, &settings);
        // the plan excludes only the prefix clear code
        assert_eq!(bits.bit_len() as u64, planned + (settings.min_code_size as u64 + 1));
    }

    #[test]
    fn test_finer_alignment_is_never_worse() {
        let data: Vec<u8> = (0u32..800).map(|i| ((i * 31 + i / 7) % 16) as u8).collect();

        let mut fine = gif_settings(4);
        fine.alignment = 1;
        let (_, planned_fine) = optimize_gif(&data, &fine);

        let mut coarse = gif_settings(4);
        coarse.alignment = 16;
        let (_, planned_coarse) = optimize_gif(&data, &coarse);

        assert!(planned_fine <= planned_coarse);
    }

    #[test]
    fn test_two_phase_matches_single_phase() {
        let mut data = Vec::new();
        for i in 0u32..40 {
            data.extend_from_slice(&[(i % 4) as u8, ((i + 1) % 4) as u8, (i % 3) as u8]);
        }

        let mut single = gif_settings(2);
        single.greedy = false;
        let (bits_single, _) = optimize_gif(&data, &single);

        // phase 1 non-greedy, phase 2 greedy re-estimate per offset
        let mut encoder = LzwEncoder::new(&data, ContainerFlavor::Gif);
        let mut phase = single.clone();
        phase.avoid_non_greedy_again = true;
        for i in (0..data.len()).rev() {
            encoder.optimize_partial(i, 0, false, true, &phase).unwrap();
            let mut greedy_pass = phase.clone();
            greedy_pass.greedy = true;
            encoder.optimize_partial(i, 0, false, true, &greedy_pass).unwrap();
        }
        let bits_two_phase = encoder.optimize(&phase).unwrap();

        assert!(bits_two_phase.bit_len() <= bits_single.bit_len());
        assert_eq!(decode_payload(&bits_two_phase, 2), data);
    }

    #[test]
    fn test_merge_with_user_boundaries() {
        let data: Vec<u8> = (0..200).map(|i| (i % 7) as u8).collect();
        let mut settings = gif_settings(3);
        settings.max_tokens = 0;

        let mut encoder = LzwEncoder::new(&data, ContainerFlavor::Gif);
        let bits = encoder.merge(&[0, 80, 200], &settings).unwrap();
        assert_eq!(decode_payload(&bits, 3), data);
    }

    #[test]
    fn test_unaligned_start_is_internal_error() {
        let data = [0u8; 32];
        let mut settings = gif_settings(2);
        settings.alignment = 8;
        let mut encoder = LzwEncoder::new(&data, ContainerFlavor::Gif);
        assert!(matches!(
            encoder.optimize_partial(3, 0, false, true, &settings),
            Err(Error::Internal(_))
        ));
    }

    #[test]
    fn test_z_single_block_roundtrip() {
        let data = vec![b'A'; 4096];
        let settings = OptimizerSettings {
            min_code_size: 8,
            start_with_clear_code: false,
            greedy: true,
            min_non_greedy_match: 2,
            min_improvement: 1,
            max_dictionary: 0,
            max_tokens: 100_000,
            split_runs: false,
            alignment: 1,
            read_only_best: false,
            avoid_non_greedy_again: false,
        };

        let flavor = ContainerFlavor::UnixZ { max_code_size: 16 };
        let mut encoder = LzwEncoder::new(&data, flavor);
        for i in (0..data.len()).rev() {
            encoder.optimize_partial(i, 0, false, true, &settings).unwrap();
        }
        let bits = encoder.optimize(&settings).unwrap();
        assert_eq!(bits.bit_len() % 8, 0);

        let payload = bits.to_bytes();
        let mut input = BitReader::new(payload.as_slice(), payload.len() as u64);
        let mut decoder = LzwDecoder::new(&mut input, flavor);
        assert_eq!(decoder.decode(8, data.len()).unwrap(), data);
    }

    #[test]
    fn test_z_restart_below_full_width_is_rejected() {
        // forcing a restart while codes are still 9 bits wide must surface
        // as an internal error, not a corrupt stream
        let data = vec![b'A'; 64];
        let settings = OptimizerSettings {
            min_code_size: 8,
            start_with_clear_code: false,
            greedy: true,
            min_non_greedy_match: 2,
            min_improvement: 1,
            max_dictionary: 0,
            max_tokens: 0,
            split_runs: false,
            alignment: 1,
            read_only_best: true,
            avoid_non_greedy_again: false,
        };
        let mut encoder = LzwEncoder::new(&data, ContainerFlavor::UnixZ { max_code_size: 16 });
        assert!(matches!(
            encoder.merge(&[0, 32, 64], &settings),
            Err(Error::Internal(_))
        ));
    }

    #[test]
    fn test_min_bits() {
        assert_eq!(min_bits(0), 1);
        assert_eq!(min_bits(1), 1);
        assert_eq!(min_bits(2), 2);
        assert_eq!(min_bits(5), 3);
        assert_eq!(min_bits(255), 8);
        assert_eq!(min_bits(256), 9);
        assert_eq!(min_bits(4095), 12);
    }
}
