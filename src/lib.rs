//! Removes moving objects from a burst of aligned photographs by taking the
//! per-channel median of every pixel position across all frames.

pub mod alg;
pub mod error;
pub mod image;
pub mod imgio;
pub mod pixel;
pub mod stack;

pub use crate::{
    error::{Result, StackError},
    image::Image,
    imgio::Format,
    pixel::Pixel,
    stack::{AlphaPolicy, MIN_FRAMES},
};
use std::path::Path;
use tracing::info;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackOptions {
    pub alpha: AlphaPolicy,
    pub jpeg_quality: u8,
}

impl Default for StackOptions {
    fn default() -> Self {
        Self {
            alpha: AlphaPolicy::default(),
            jpeg_quality: imgio::DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Reads every image in `sources`, median-stacks them and writes the result to
/// `sink`. The output format follows the sink's extension.
pub fn remove_moving_objects<P: AsRef<Path>>(
    sources: &[P],
    sink: impl AsRef<Path>,
) -> Result<()> {
    remove_moving_objects_with(sources, sink, &StackOptions::default())
}

pub fn remove_moving_objects_with<P: AsRef<Path>>(
    sources: &[P],
    sink: impl AsRef<Path>,
    options: &StackOptions,
) -> Result<()> {
    let sink = sink.as_ref();
    Format::from_path(sink)?;
    let images = sources
        .iter()
        .map(imgio::load)
        .collect::<Result<Vec<_>>>()?;
    let stacked = stack::stack_with(&images, options.alpha, alg::median_pixel)?;
    drop(images);
    imgio::save(sink, &stacked, options.jpeg_quality)?;
    info!("Saved {}", sink.display());
    Ok(())
}
