use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use relzw::{
    is_unix_z, GifImage, GifRecompressor, ParallelGifRecompressor, Recompress, RecompressConfig,
    RecompressStats, ZFile, ZRecompressor,
};

#[derive(Parser, Debug)]
#[command(name = "relzw")]
#[command(about = "Losslessly recompress GIF and Unix .Z files by optimal LZW block splitting")]
#[command(version)]
struct Args {
    /// Input file
    input: PathBuf,

    /// Output file (not needed with --info)
    #[arg(required_unless_present = "info")]
    output: Option<PathBuf>,

    /// Blocks may start at multiples of this offset (1 = best compression,
    /// larger values are faster)
    #[arg(short, long, default_value = "1")]
    alignment: u32,

    /// Enable non-greedy match search; the value is the minimum match
    /// length considered for splitting (at least 2)
    #[arg(short = 'n', long, value_name = "LEN")]
    nongreedy: Option<u32>,

    /// Minimum number of bytes a non-greedy match must save
    #[arg(short = 'm', long, default_value = "1", value_name = "BYTES")]
    min_improvement: u32,

    /// Maximum dictionary size a block may grow to (0 = no limit)
    #[arg(short = 'd', long, default_value = "0", value_name = "SIZE")]
    dictionary: u32,

    /// Maximum tokens per block (default: 20000 for GIF, 100000 for .Z;
    /// 0 = no limit)
    #[arg(short = 't', long, value_name = "COUNT")]
    max_tokens: Option<u32>,

    /// Favor compatibility with faulty decoders (greedy search, dictionary
    /// capped at 4093, leading clear code)
    #[arg(short = 'c', long)]
    compatible: bool,

    /// Non-greedy search plus a greedy re-estimate pass; typically the best
    /// results at reasonable speed
    #[arg(short = 'p', long)]
    prettygood: bool,

    /// Allow non-greedy matching inside runs of a single byte value
    #[arg(short = 'r', long, requires = "nongreedy")]
    split_runs: bool,

    /// Ensure the output is not interlaced (single-frame GIFs only)
    #[arg(short = 'l', long)]
    deinterlace: bool,

    /// Input and output are Unix .Z files instead of GIF
    #[arg(short = 'Z', long)]
    unix_z: bool,

    /// Comma-separated ascending list of fixed restart offsets, bypassing
    /// the optimizer (e.g. -u 500,2000,9000)
    #[arg(short = 'u', long, value_name = "LIST")]
    boundaries: Option<String>,

    /// Skip the initial clear code and start immediately with data
    #[arg(short = 'y', long)]
    immediate: bool,

    /// Worker threads for animated GIFs (0 = auto)
    #[arg(short = 'j', long, default_value = "1")]
    threads: usize,

    /// Analyze the internal structure of the input and exit
    #[arg(short, long)]
    info: bool,

    /// Overwrite the output file if it already exists
    #[arg(short, long)]
    force: bool,

    /// Compare input and output file sizes when finished
    #[arg(short, long, conflicts_with = "quiet")]
    summary: bool,

    /// Show detailed statistics
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // format detection: flag, extension, then magic sniffing
    let is_z = args.unix_z
        || args.input.extension().is_some_and(|ext| ext == "Z")
        || sniff_z(&args.input).unwrap_or(false);

    if args.info {
        return run_info_mode(&args, is_z);
    }

    let output_path = args.output.as_ref().expect("output required when not in info mode");
    if args.input == *output_path {
        return Err("input and output cannot be the same file".into());
    }
    if !args.force && output_path.exists() {
        return Err(format!(
            "'{}' already exists, use --force to overwrite it",
            output_path.display()
        )
        .into());
    }

    let config = build_config(&args)?;

    let input = BufReader::new(File::open(&args.input)?);
    let mut output = BufWriter::new(File::create(output_path)?);

    let start = Instant::now();
    let stats = if is_z {
        ZRecompressor::new(config).recompress(input, &mut output)?
    } else if config.num_threads == 1 {
        GifRecompressor::new(config).recompress(input, &mut output)?
    } else {
        ParallelGifRecompressor::new(config).recompress(input, &mut output)?
    };
    output.flush()?;
    let elapsed = start.elapsed();

    if args.verbose {
        print_stats(&stats, elapsed);
    }
    if args.summary {
        print_summary(&args.input, output_path, &stats, elapsed);
    }

    Ok(())
}

fn build_config(args: &Args) -> Result<RecompressConfig, Box<dyn std::error::Error>> {
    let mut config = RecompressConfig {
        alignment: args.alignment.max(1),
        min_improvement: args.min_improvement.max(1),
        max_dictionary: args.dictionary,
        max_tokens: args.max_tokens,
        split_runs: args.split_runs,
        start_with_clear_code: !args.immediate,
        num_threads: args.threads,
        deinterlace: args.deinterlace,
        ..Default::default()
    };

    if let Some(min_match) = args.nongreedy {
        if min_match < 2 {
            return Err("--nongreedy cannot be less than 2".into());
        }
        config.greedy = false;
        config.min_non_greedy_match = min_match;
    }

    if args.prettygood {
        config.greedy = false;
        config.two_phase = true;
        if config.max_dictionary == 0 {
            config.max_dictionary = 4096;
        }
    }

    if args.compatible {
        config.greedy = true;
        config.start_with_clear_code = true;
        config.max_dictionary = 4093;
    }

    if let Some(list) = &args.boundaries {
        let mut boundaries = Vec::new();
        for part in list.split(',') {
            boundaries.push(part.trim().parse::<usize>().map_err(|_| {
                format!("--boundaries: '{part}' is not a number")
            })?);
        }
        if boundaries.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err("--boundaries must be a strictly ascending list".into());
        }
        config.boundaries = Some(boundaries);
    }

    Ok(config)
}

/// Read the first two bytes and check for the .Z magic.
fn sniff_z(path: &PathBuf) -> io::Result<bool> {
    let mut file = File::open(path)?;
    let mut magic = [0u8; 2];
    match file.read_exact(&mut magic) {
        Ok(()) => Ok(is_unix_z(&magic)),
        Err(_) => Ok(false),
    }
}

fn run_info_mode(args: &Args, is_z: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut raw = Vec::new();
    BufReader::new(File::open(&args.input)?).read_to_end(&mut raw)?;

    if is_z {
        let zfile = ZFile::parse(&raw)?;
        println!("File: {}", args.input.display());
        println!("Format: Unix compress (.Z)");
        println!("Max code width: {} bits", zfile.max_code_size());
        println!("Compressed size: {} bytes", raw.len());
        println!("Uncompressed size: {} bytes", zfile.data.len());
        println!("LZW payload: {} bits", zfile.compressed_bits);
        if !zfile.data.is_empty() {
            println!(
                "Bits per byte: {:.3}",
                zfile.compressed_bits as f64 / zfile.data.len() as f64
            );
        }
        return Ok(());
    }

    let image = GifImage::parse(&raw)?;
    println!("File: {}", args.input.display());
    println!("Format: GIF");
    println!("Screen: {}x{}", image.width, image.height);
    println!("Global palette: {} entries", image.global_palette_len);
    println!("Animated: {}", if image.is_animated() { "yes" } else { "no" });
    println!("Frames: {}", image.frames().len());
    for (index, frame) in image.frames().iter().enumerate() {
        println!(
            "  frame {}: {}x{} at {},{}{}{}, code size {}, {} pixels, {} LZW bits ({:.3} bits/pixel)",
            index + 1,
            frame.width,
            frame.height,
            frame.offset_left,
            frame.offset_top,
            if frame.interlaced { ", interlaced" } else { "" },
            if frame.local_palette_len > 0 { ", local palette" } else { "" },
            frame.code_size,
            frame.pixels.len(),
            frame.compressed_bits,
            frame.compressed_bits as f64 / frame.pixels.len().max(1) as f64,
        );
    }
    Ok(())
}

fn print_stats(stats: &RecompressStats, elapsed: std::time::Duration) {
    eprintln!("Recompression complete:");
    eprintln!("  Input bytes:      {}", stats.input_bytes);
    eprintln!("  Output bytes:     {}", stats.output_bytes);
    eprintln!("  Frames:           {}", stats.frames);
    eprintln!("  LZW blocks:       {}", stats.blocks);
    eprintln!("  LZW bits in:      {}", stats.lzw_bits_in);
    eprintln!("  LZW bits out:     {}", stats.lzw_bits_out);
    eprintln!("  Time:             {:.2?}", elapsed);
}

fn print_summary(
    input: &PathBuf,
    output: &PathBuf,
    stats: &RecompressStats,
    elapsed: std::time::Duration,
) {
    let before = stats.input_bytes as i64;
    let now = stats.output_bytes as i64;
    let diff = before - now;

    if diff == 0 {
        eprintln!(
            "no optimization found for '{}', same size as before ({} bytes).",
            input.display(),
            now
        );
    } else if diff > 0 {
        eprintln!(
            "'{}' is {} bytes smaller than '{}' ({} vs {} bytes) => you saved {:.3}%.",
            output.display(),
            diff,
            input.display(),
            now,
            before,
            diff as f64 * 100.0 / before as f64
        );
    } else {
        eprintln!(
            "'{}' is {} bytes larger than '{}' ({} vs {} bytes). \
             More aggressive settings (-a 1, -n 2) may help.",
            output.display(),
            -diff,
            input.display(),
            now,
            before
        );
    }
    eprintln!("Finished after {:.2?}.", elapsed);
}
