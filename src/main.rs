use clap::{Parser, ValueEnum};
use failure::Error;
use medianstack::{remove_moving_objects_with, AlphaPolicy, Format, StackOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Removes moving objects from a burst of aligned photos (PNG or JPEG).
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Input images, or directories to read images from
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Where to write the result; the extension picks the format
    #[arg(short, long)]
    output: PathBuf,
    /// How the output alpha channel is produced
    #[arg(long, value_enum, default_value_t = AlphaArg::FirstFrame)]
    alpha: AlphaArg,
    /// JPEG output quality
    #[arg(long, default_value_t = 75, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,
    /// Number of stacking threads (defaults to one per core)
    #[arg(short = 'j', long)]
    threads: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum AlphaArg {
    FirstFrame,
    Median,
}

impl From<AlphaArg> for AlphaPolicy {
    fn from(arg: AlphaArg) -> Self {
        match arg {
            AlphaArg::FirstFrame => AlphaPolicy::FirstFrame,
            AlphaArg::Median => AlphaPolicy::Median,
        }
    }
}

/// Named files are kept as-is; files found inside directories are kept only
/// when their extension is a supported image format.
fn paths_to_read(images: &mut Vec<PathBuf>, path: impl AsRef<Path>) -> Result<(), Error> {
    let path = path.as_ref();
    if path.is_dir() {
        read_dir_images(images, path)
    } else {
        images.push(path.to_owned());
        Ok(())
    }
}

fn read_dir_images(images: &mut Vec<PathBuf>, dir: &Path) -> Result<(), Error> {
    let mut entries = dir
        .read_dir()?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort();
    for entry in entries {
        if entry.is_dir() {
            read_dir_images(images, &entry)?;
        } else if Format::from_path(&entry).is_ok() {
            images.push(entry);
        } else {
            debug!("Skipping {}", entry.display());
        }
    }
    Ok(())
}

// a previous run's result may sit inside an input directory
fn skip_output(images: &mut Vec<PathBuf>, output: &Path) {
    images.retain(|path| {
        let same = path == output;
        if same {
            debug!("Skipping output file {}", path.display());
        }
        !same
    });
}

fn go(cli: Cli) -> Result<(), Error> {
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }
    info!("Running with {} threads", rayon::current_num_threads());
    let mut image_paths = Vec::new();
    for input in &cli.inputs {
        paths_to_read(&mut image_paths, input)?;
    }
    skip_output(&mut image_paths, &cli.output);
    info!("Stacking {} images into {}", image_paths.len(), cli.output.display());
    let options = StackOptions {
        alpha: cli.alpha.into(),
        jpeg_quality: cli.quality,
    };
    remove_moving_objects_with(&image_paths, &cli.output, &options)?;
    Ok(())
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    go(Cli::parse())
}
