use crate::bits::BitWriter;
use crate::error::{Error, Result};
use crate::gif::GifImage;
use crate::lzw::{ContainerFlavor, LzwEncoder};
use crate::unixz::ZFile;
use crate::{Recompress, RecompressConfig, RecompressStats};
use std::io::{Read, Write};

/// Optimize one index stream end-to-end: fill the shortest-path table by
/// evaluating every aligned offset in decreasing order, then emit the
/// bitstream along the best chain of blocks. Also returns the number of
/// blocks emitted.
pub(crate) fn optimize_stream(
    data: &[u8],
    min_code_size: u8,
    flavor: ContainerFlavor,
    config: &RecompressConfig,
) -> Result<(BitWriter, u64)> {
    let mut encoder = LzwEncoder::new(data, flavor);
    let mut settings = config.optimizer_settings(min_code_size, flavor);

    if let Some(bounds) = &config.boundaries {
        // fixed restarts: skip the search, and drop the block limits that
        // could otherwise truncate a user-chosen block
        let mut restarts: Vec<usize> =
            bounds.iter().copied().filter(|&end| end > 0 && end <= data.len()).collect();
        if restarts.last() != Some(&data.len()) {
            restarts.push(data.len());
        }
        settings.max_tokens = 0;
        settings.max_dictionary = 0;
        let blocks = restarts.len() as u64;
        let bits = encoder.merge(&restarts, &settings)?;
        return Ok((bits, blocks));
    }

    let alignment = settings.alignment.max(1) as usize;
    for offset in (0..data.len()).rev() {
        if offset % alignment != 0 {
            continue;
        }
        encoder.optimize_partial(offset, 0, false, true, &settings)?;

        // two-phase mode: re-estimate with greedy parsing, skipping offsets
        // where the non-greedy pass made no non-greedy choices
        if config.two_phase && !settings.greedy {
            let mut greedy_pass = settings.clone();
            greedy_pass.greedy = true;
            encoder.optimize_partial(offset, 0, false, true, &greedy_pass)?;
        }
    }

    let blocks = encoder.planned_blocks(settings.alignment)?.len() as u64;
    let bits = encoder.optimize(&settings)?;
    Ok((bits, blocks))
}

/// Single-threaded GIF recompressor.
pub struct GifRecompressor {
    config: RecompressConfig,
}

impl GifRecompressor {
    pub fn new(config: RecompressConfig) -> Self {
        Self { config }
    }
}

impl Recompress for GifRecompressor {
    fn recompress<R: Read, W: Write>(&mut self, mut input: R, mut output: W) -> Result<RecompressStats> {
        let mut raw = Vec::new();
        input.read_to_end(&mut raw)?;

        let mut image = GifImage::parse(&raw)?;
        if self.config.deinterlace {
            image.set_interlacing(false)?;
        }
        if image.frames().len() > 1 && self.config.boundaries.is_some() {
            return Err(Error::Unsupported(
                "user-defined block boundaries are not supported for animated GIFs".into(),
            ));
        }

        let mut frames_bits = Vec::with_capacity(image.frames().len());
        let mut blocks = 0;
        for frame in image.frames() {
            let (bits, frame_blocks) = optimize_stream(
                &frame.pixels,
                frame.code_size,
                ContainerFlavor::Gif,
                &self.config,
            )?;
            frames_bits.push(bits);
            blocks += frame_blocks;
        }

        let out = image.write_optimized(&frames_bits);
        output.write_all(&out)?;

        Ok(RecompressStats {
            input_bytes: raw.len() as u64,
            output_bytes: out.len() as u64,
            frames: image.frames().len() as u64,
            blocks,
            lzw_bits_in: image.total_lzw_bits(),
            lzw_bits_out: frames_bits.iter().map(|bits| bits.bit_len() as u64).sum(),
        })
    }
}

/// Unix compress (.Z) recompressor.
pub struct ZRecompressor {
    config: RecompressConfig,
}

impl ZRecompressor {
    pub fn new(config: RecompressConfig) -> Self {
        Self { config }
    }
}

impl Recompress for ZRecompressor {
    fn recompress<R: Read, W: Write>(&mut self, mut input: R, mut output: W) -> Result<RecompressStats> {
        let mut raw = Vec::new();
        input.read_to_end(&mut raw)?;

        if self.config.boundaries.is_some() {
            return Err(Error::Unsupported(
                "user-defined block boundaries are not supported for .Z files".into(),
            ));
        }

        let zfile = ZFile::parse(&raw)?;
        let (bits, blocks) = optimize_stream(&zfile.data, 8, zfile.flavor(), &self.config)?;

        let out = zfile.write_optimized(&bits);
        output.write_all(&out)?;

        Ok(RecompressStats {
            input_bytes: raw.len() as u64,
            output_bytes: out.len() as u64,
            frames: 1,
            blocks,
            lzw_bits_in: zfile.compressed_bits,
            lzw_bits_out: bits.bit_len() as u64,
        })
    }
}
