pub mod bits;
pub mod error;
pub mod gif;
pub mod lzw;
pub mod recompress;
pub mod unixz;

pub use error::{Error, Result};
pub use gif::{is_gif, GifImage};
pub use lzw::{BlockPlan, ContainerFlavor, LzwDecoder, LzwEncoder, OptimizerSettings};
pub use recompress::{GifRecompressor, ParallelGifRecompressor, ZRecompressor};
pub use unixz::{is_unix_z, ZFile};

use std::io::{Read, Write};

/// Configuration for a recompression run.
#[derive(Clone, Debug)]
pub struct RecompressConfig {
    /// Granularity of eligible block-start offsets (1 = best compression)
    pub alignment: u32,
    /// Greedy match search only (non-greedy search is slower but smaller)
    pub greedy: bool,
    /// Minimum greedy match length for which non-greedy search runs
    pub min_non_greedy_match: u32,
    /// Minimum number of bytes a non-greedy split must gain
    pub min_improvement: u32,
    /// A block stops growing once the dictionary reaches this size (0 = off)
    pub max_dictionary: u32,
    /// Maximum tokens per block (None = 20000 for GIF, 100000 for .Z)
    pub max_tokens: Option<u32>,
    /// Allow non-greedy search inside single-byte runs
    pub split_runs: bool,
    /// Start each GIF payload with a clear code (de-facto convention)
    pub start_with_clear_code: bool,
    /// Two-phase mode: a non-greedy pass, then a greedy re-estimate that
    /// skips offsets where non-greedy search found nothing
    pub two_phase: bool,
    /// Worker threads for animated GIFs (0 = auto, 1 = single-threaded)
    pub num_threads: usize,
    /// De-interlace single-frame GIFs before encoding
    pub deinterlace: bool,
    /// Fixed restart offsets instead of the shortest-path search
    pub boundaries: Option<Vec<usize>>,
}

impl Default for RecompressConfig {
    fn default() -> Self {
        Self {
            alignment: 1,
            greedy: true,
            min_non_greedy_match: 2,
            min_improvement: 1,
            max_dictionary: 0,
            max_tokens: None,
            split_runs: false,
            start_with_clear_code: true,
            two_phase: false,
            num_threads: 1,
            deinterlace: false,
            boundaries: None,
        }
    }
}

impl RecompressConfig {
    /// Per-payload optimizer settings for the given flavor and code size.
    pub fn optimizer_settings(
        &self,
        min_code_size: u8,
        flavor: ContainerFlavor,
    ) -> OptimizerSettings {
        let max_tokens = self.max_tokens.unwrap_or(match flavor {
            ContainerFlavor::Gif => 20_000,
            ContainerFlavor::UnixZ { .. } => 100_000,
        });

        // GIF-sized dictionary limits make no sense for the 16-bit format
        let mut max_dictionary = self.max_dictionary;
        if !flavor.is_gif() && (max_dictionary == 4096 || max_dictionary == 4093) {
            max_dictionary = 65_536;
        }

        OptimizerSettings {
            min_code_size,
            start_with_clear_code: self.start_with_clear_code && flavor.is_gif(),
            greedy: self.greedy,
            min_non_greedy_match: self.min_non_greedy_match,
            min_improvement: self.min_improvement,
            max_dictionary,
            max_tokens,
            split_runs: self.split_runs,
            alignment: self.alignment.max(1),
            read_only_best: false,
            avoid_non_greedy_again: self.two_phase,
        }
    }
}

/// Statistics from a recompression run.
#[derive(Clone, Debug, Default)]
pub struct RecompressStats {
    pub input_bytes: u64,
    pub output_bytes: u64,
    pub frames: u64,
    /// LZW blocks (dictionary restarts plus one) across all frames
    pub blocks: u64,
    /// Size of the input's LZW payloads, in bits
    pub lzw_bits_in: u64,
    /// Size of the replacement LZW payloads, in bits
    pub lzw_bits_out: u64,
}

/// Trait for the complete recompression operation.
pub trait Recompress {
    /// Read a complete file from `input` and write the recompressed file to
    /// `output`.
    fn recompress<R: Read, W: Write>(&mut self, input: R, output: W) -> Result<RecompressStats>;
}
