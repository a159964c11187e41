use anyhow::{Context, Result};
use clap::Parser;
use htmldocx::{Converter, Options};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input HTML file (a fragment or a full document).
    input: PathBuf,

    /// Output .docx path. Defaults to the input path with a .docx extension.
    output: Option<PathBuf>,

    /// Repair malformed markup with a full HTML parse before converting.
    #[arg(long)]
    repair: bool,

    /// Insert placeholders instead of downloading http(s) images.
    #[arg(long)]
    no_remote_images: bool,

    /// Directory relative image paths resolve against (default: the input's directory).
    #[arg(long)]
    image_root: Option<PathBuf>,

    /// Log dropped content and image fallbacks.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let converter = Converter::new(Options {
        fetch_remote_images: !args.no_remote_images,
        image_root: args.image_root,
        repair: args.repair,
        ..Default::default()
    });
    let out = converter
        .convert_file(&args.input, args.output.as_deref())
        .with_context(|| format!("convert {}", args.input.display()))?;

    log::info!("wrote {}", out.display());
    Ok(())
}
