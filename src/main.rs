use clap::{Args, Parser, Subcommand};
use optimize_assets::config::{self, AssetsConfig, ImagesConfig, OptimizeConfig};
use optimize_assets::{output, process};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "optimize")]
#[command(about = "Batch raster image optimizer with density fan-out")]
#[command(long_about = "\
Batch raster image optimizer with density fan-out

Every raster source (.jpg .jpeg .png .webp .avif .gif .tiff) found under the
input directory is re-encoded into each target format, at every pixel density
from the origin density down to 1:

  hero.png    --origin-density 2 -f avif -f webp
    → hero@2x.avif  hero@1x.avif  hero@2x.webp  hero@1x.webp

Files named like `name@2x.avif` are outputs and are never used as sources.
A `~<digits>` suffix marks a breakpoint variant: hero~768.png belongs to the
logical image `hero` and produces hero~768@2x.avif, ...

The `assets` command also records per-image sizes (in density-independent
pixels) in <shared>/data.json, keeping every other field of that document.

Run 'optimize gen-config' to generate a documented optimize.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./optimize.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Optimize a directory of images
    Images(ImagesArgs),
    /// Optimize <public>/images and record sizes in <shared>/data.json
    Assets(AssetsArgs),
    /// Print a stock optimize.toml with all options documented
    GenConfig,
}

/// Flags shared by both optimizing commands.
#[derive(Args, Clone)]
struct EncodeArgs {
    /// Pixel density of the source images (0 = no @Nx suffixes)
    #[arg(short = 'd', long)]
    origin_density: Option<u32>,

    /// Output format; repeat for several (avif, webp, png, jpeg, gif, tiff)
    #[arg(short = 'f', long = "target-formats", num_args = 1..)]
    target_formats: Vec<String>,

    /// Lossy encoding quality (1-100)
    #[arg(short, long)]
    quality: Option<u32>,
}

#[derive(Args, Clone)]
struct ImagesArgs {
    /// Directory searched recursively for source images
    #[arg(short, long)]
    input_directory: Option<PathBuf>,

    /// Directory derivatives are written to (default: the input directory)
    #[arg(short, long)]
    output_directory: Option<PathBuf>,

    /// Delete each source after its derivatives are written
    #[arg(short, long)]
    remove_origin: bool,

    #[command(flatten)]
    encode: EncodeArgs,
}

#[derive(Args, Clone)]
struct AssetsArgs {
    /// Public asset root; images are read from and written to <public>/images
    #[arg(short, long)]
    public_directory: Option<PathBuf>,

    /// Shared directory holding data.json
    #[arg(short, long)]
    shared_directory: Option<PathBuf>,

    /// Keep source images after their derivatives are written
    #[arg(long)]
    keep_origin: bool,

    /// Do not read or write data.json
    #[arg(long)]
    no_meta_data: bool,

    #[command(flatten)]
    encode: EncodeArgs,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Images(args) => {
            let mut config = load_config(cli.config.as_deref())?;
            apply_images_args(&mut config.images, &args);
            config.validate()?;

            let images = &config.images;
            run_batch(&images.input_dir(), &images.output_dir(), images.run_config(), None)?;
        }
        Command::Assets(args) => {
            let mut config = load_config(cli.config.as_deref())?;
            apply_assets_args(&mut config.assets, &args);
            config.validate()?;

            let assets = &config.assets;
            let images_dir = assets.images_dir();
            let metadata_path = assets.metadata_path();
            run_batch(&images_dir, &images_dir, assets.run_config(), Some(&metadata_path))?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr so progress output on stdout stays clean.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(explicit: Option<&Path>) -> Result<OptimizeConfig, config::ConfigError> {
    match explicit {
        Some(path) => config::load_config_file(path),
        None => config::load_config(Path::new(".")),
    }
}

fn apply_encode_args(
    encode: &EncodeArgs,
    origin_density: &mut u32,
    target_formats: &mut Vec<String>,
    quality: &mut u32,
) {
    if let Some(d) = encode.origin_density {
        *origin_density = d;
    }
    if !encode.target_formats.is_empty() {
        *target_formats = encode.target_formats.clone();
    }
    if let Some(q) = encode.quality {
        *quality = q;
    }
}

fn apply_images_args(images: &mut ImagesConfig, args: &ImagesArgs) {
    if let Some(input) = &args.input_directory {
        images.input_directory = input.to_string_lossy().into_owned();
    }
    if let Some(output) = &args.output_directory {
        images.output_directory = Some(output.to_string_lossy().into_owned());
    }
    if args.remove_origin {
        images.remove_origin = true;
    }
    apply_encode_args(
        &args.encode,
        &mut images.origin_density,
        &mut images.target_formats,
        &mut images.quality,
    );
}

fn apply_assets_args(assets: &mut AssetsConfig, args: &AssetsArgs) {
    if let Some(public) = &args.public_directory {
        assets.public_directory = public.to_string_lossy().into_owned();
    }
    if let Some(shared) = &args.shared_directory {
        assets.shared_directory = shared.to_string_lossy().into_owned();
    }
    if args.keep_origin {
        assets.remove_origin = false;
    }
    if args.no_meta_data {
        assets.add_meta_data = false;
    }
    apply_encode_args(
        &args.encode,
        &mut assets.origin_density,
        &mut assets.target_formats,
        &mut assets.quality,
    );
}

/// Run one batch with a printer thread rendering progress as it arrives.
fn run_batch(
    input: &Path,
    output_dir: &Path,
    run_config: optimize_assets::types::RunConfig,
    metadata_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::print_process_event(&event);
        }
    });
    let result = process::process(input, output_dir, &run_config, metadata_path, Some(tx));
    printer
        .join()
        .map_err(|_| "progress printer thread panicked")?;

    let report = result?;
    output::print_report(&report);
    Ok(())
}
