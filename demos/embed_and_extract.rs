//! Embed a watermark into an image, then extract it again.
//!
//! Usage:
//! ```sh
//! cargo run --example embed_and_extract -- host.png mark.png
//! ```

use std::env;
use std::path::Path;
use std::process;

use dct_watermark::{default_output_path, WatermarkEngine, WatermarkOptions};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <host> <watermark>", args[0]);
        process::exit(1);
    }

    let host = Path::new(&args[1]);
    let watermark = Path::new(&args[2]);
    let marked = default_output_path(host, "watermarked");
    let recovered = default_output_path(host, "extracted");

    let engine =
        WatermarkEngine::new(WatermarkOptions::default()).expect("default options are valid");

    for result in [
        engine.embed_file(host, watermark, &marked),
        engine.extract_file(&marked, &recovered),
    ] {
        if result.success {
            println!("Done: {} -> {}", result.message, result.output.unwrap_or_default().display());
        } else {
            eprintln!("Error: {}", result.message);
            process::exit(1);
        }
    }
}
