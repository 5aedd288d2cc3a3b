use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};

use dct_watermark::{
    default_output_path, ChannelMode, FilterType, ProcessResult, WatermarkEngine,
    WatermarkOptions, DEFAULT_ALPHA, DEFAULT_BLOCK_SIZE,
};

#[derive(Parser)]
#[command(
    name = "dct-watermark",
    about = "Embed and extract image watermarks via block DCT coefficient blending",
    version,
    after_help = "Use the same --alpha and --block-size for embed and extract.\n\n\
                  NOTE: Extraction is blind and assumes the input was produced by `embed`.\n\
                  Save watermarked images losslessly (PNG); JPEG re-encoding destroys the mark."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Embed a watermark image into a host image
    Embed {
        /// Host image file
        host: PathBuf,

        /// Watermark image file
        watermark: PathBuf,

        /// Output file (default: {name}_watermarked.png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        params: Params,
    },

    /// Extract a watermark from a watermarked image or directory
    Extract {
        /// Watermarked image file or directory
        input: PathBuf,

        /// Output file or directory (default: {name}_extracted.png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        params: Params,
    },
}

#[derive(Args)]
struct Params {
    /// Blend strength (0.0-1.0, exclusive of 0)
    #[arg(short, long, default_value_t = DEFAULT_ALPHA)]
    alpha: f64,

    /// Block side in pixels
    #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: u32,

    /// Transform R, G and B independently instead of broadcasting red
    #[arg(long)]
    per_channel: bool,

    /// Filter used to scale the watermark to the host
    #[arg(long, value_enum, default_value_t = Filter::Triangle)]
    filter: Filter,
}

#[derive(Clone, Copy, ValueEnum)]
enum Filter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<Filter> for FilterType {
    fn from(f: Filter) -> Self {
        match f {
            Filter::Nearest => FilterType::Nearest,
            Filter::Triangle => FilterType::Triangle,
            Filter::CatmullRom => FilterType::CatmullRom,
            Filter::Gaussian => FilterType::Gaussian,
            Filter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl Params {
    fn options(&self) -> WatermarkOptions {
        WatermarkOptions {
            alpha: self.alpha,
            block_size: self.block_size,
            channel_mode: if self.per_channel {
                ChannelMode::PerChannel
            } else {
                ChannelMode::Broadcast
            },
            filter: self.filter.into(),
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn build_engine(params: &Params) -> WatermarkEngine {
    match WatermarkEngine::new(params.options()) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn require_exists(path: &Path) {
    if !path.exists() {
        eprintln!("Error: Input path does not exist: {}", path.display());
        process::exit(1);
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let results = match &cli.command {
        Command::Embed {
            host,
            watermark,
            output,
            params,
        } => {
            require_exists(host);
            require_exists(watermark);
            let engine = build_engine(params);
            let output_path = output
                .clone()
                .unwrap_or_else(|| default_output_path(host, "watermarked"));
            vec![engine.embed_file(host, watermark, &output_path)]
        }
        Command::Extract {
            input,
            output,
            params,
        } => {
            require_exists(input);
            let engine = build_engine(params);
            if input.is_dir() {
                let Some(output_dir) = output else {
                    eprintln!("Error: Output directory is required for batch processing");
                    eprintln!("Usage: dct-watermark extract <input_dir> -o <output_dir>");
                    process::exit(1);
                };
                engine.extract_directory(input, output_dir)
            } else {
                let output_path = output
                    .clone()
                    .unwrap_or_else(|| default_output_path(input, "extracted"));
                vec![engine.extract_file(input, &output_path)]
            }
        }
    };

    let mut success_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, cli.verbose, cli.quiet);
        if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !cli.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {success_count}");
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_result(result: &ProcessResult, verbose: bool, quiet: bool) {
    if quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.success {
        match &result.output {
            Some(out) => eprintln!("[OK] {filename} -> {}", out.display()),
            None => eprintln!("[OK] {filename}"),
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }

    if verbose && !result.message.is_empty() {
        eprintln!("  -> {}", result.message);
    }
}
