//! Frame-parallel GIF recompression.
//!
//! Frames share no dictionary state, so an animated GIF can be optimized
//! one frame per worker. The main thread parses and decodes, workers run
//! the shortest-path optimizer, and results are reassembled in frame order.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use crossbeam::channel::{bounded, Receiver, Sender};

use super::single::{optimize_stream, GifRecompressor};
use crate::bits::BitWriter;
use crate::error::{Error, Result};
use crate::gif::GifImage;
use crate::lzw::ContainerFlavor;
use crate::{Recompress, RecompressConfig, RecompressStats};

/// A job for optimizing a single frame
struct FrameJob<'a> {
    index: usize,
    pixels: &'a [u8],
    code_size: u8,
}

/// Parallel GIF recompressor
pub struct ParallelGifRecompressor {
    config: RecompressConfig,
}

impl ParallelGifRecompressor {
    pub fn new(config: RecompressConfig) -> Self {
        Self { config }
    }

    fn effective_threads(&self) -> usize {
        match self.config.num_threads {
            0 => num_cpus::get().clamp(1, 32),
            n => n.clamp(1, 32),
        }
    }
}

impl Recompress for ParallelGifRecompressor {
    fn recompress<R: Read, W: Write>(&mut self, input: R, output: W) -> Result<RecompressStats> {
        let num_threads = self.effective_threads();

        // one worker adds nothing over the single-threaded implementation
        if num_threads == 1 {
            let mut single = GifRecompressor::new(self.config.clone());
            return single.recompress(input, output);
        }

        self.recompress_parallel(input, output, num_threads)
    }
}

impl ParallelGifRecompressor {
    fn recompress_parallel<R: Read, W: Write>(
        &mut self,
        mut input: R,
        mut output: W,
        num_threads: usize,
    ) -> Result<RecompressStats> {
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

        let workers = num_threads.min(image.frames().len()).max(1);
        let config = &self.config;
        let frames = image.frames();

        let results: Result<BTreeMap<usize, (BitWriter, u64)>> = crossbeam::scope(|scope| {
            let (job_tx, job_rx): (Sender<FrameJob>, Receiver<FrameJob>) = bounded(frames.len());
            let (result_tx, result_rx) =
                bounded::<(usize, Result<(BitWriter, u64)>)>(frames.len());

            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move |_| {
                    while let Ok(job) = job_rx.recv() {
                        let bits = optimize_stream(
                            job.pixels,
                            job.code_size,
                            ContainerFlavor::Gif,
                            config,
                        );
                        if result_tx.send((job.index, bits)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(job_rx);
            drop(result_tx);

            for (index, frame) in frames.iter().enumerate() {
                let job = FrameJob { index, pixels: &frame.pixels, code_size: frame.code_size };
                if job_tx.send(job).is_err() {
                    return Err(Error::Internal("workers disconnected".to_string()));
                }
            }
            drop(job_tx);

            let mut collected = BTreeMap::new();
            while collected.len() < frames.len() {
                match result_rx.recv() {
                    Ok((index, bits)) => {
                        collected.insert(index, bits?);
                    }
                    Err(_) => {
                        return Err(Error::Internal("result channel disconnected".to_string()));
                    }
                }
            }
            Ok(collected)
        })
        .map_err(|_| Error::Internal("worker thread panicked".to_string()))?;

        let results = results?;
        let mut frames_bits = Vec::with_capacity(results.len());
        let mut blocks = 0;
        for (bits, frame_blocks) in results.into_values() {
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Two-frame GIF, both frames alternating pixels
    fn animated_gif() -> Vec<u8> {
        let mut bits = BitWriter::new();
        bits.write_bits(4, 3); // clear
        bits.write_bits(0, 3);
        bits.write_bits(1, 3);
        bits.write_bits(6, 3);
        bits.write_bits(5, 4); // eos

        let payload = bits.to_bytes();
        let mut out = Vec::new();
        out.extend_from_slice(b"GIF89a");
        out.extend_from_slice(&[2, 0, 2, 0, 0, 0, 0]);
        for _ in 0..2 {
            out.extend_from_slice(&[0x21, 0xF9, 4, 0, 0, 0, 0, 0]); // graphic control
            out.push(0x2C);
            out.extend_from_slice(&[0, 0, 0, 0, 2, 0, 2, 0, 0]);
            out.push(2);
            out.push(payload.len() as u8);
            out.extend_from_slice(&payload);
            out.push(0);
        }
        out.push(0x3B);
        out
    }

    #[test]
    fn test_parallel_matches_single() {
        let input = animated_gif();

        let mut single_out = Vec::new();
        GifRecompressor::new(RecompressConfig::default())
            .recompress(Cursor::new(&input), &mut single_out)
            .unwrap();

        let mut parallel_out = Vec::new();
        let config = RecompressConfig { num_threads: 2, ..Default::default() };
        ParallelGifRecompressor::new(config)
            .recompress(Cursor::new(&input), &mut parallel_out)
            .unwrap();

        assert_eq!(single_out, parallel_out);
    }

    #[test]
    fn test_effective_threads() {
        let config = RecompressConfig { num_threads: 0, ..Default::default() };
        let recompressor = ParallelGifRecompressor::new(config);
        let threads = recompressor.effective_threads();
        assert!(threads >= 1);
        assert!(threads <= 32);

        let config = RecompressConfig { num_threads: 100, ..Default::default() };
        assert_eq!(ParallelGifRecompressor::new(config).effective_threads(), 32);
    }
}
