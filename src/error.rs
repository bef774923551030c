use failure::Fail;
use std::{io, path::Path};

pub type Result<T> = std::result::Result<T, StackError>;

#[derive(Debug, Fail)]
pub enum StackError {
    #[fail(display = "unknown image type: {}", path)]
    UnknownFormat { path: String },
    #[fail(display = "error accessing {}: {}", path, cause)]
    Io {
        path: String,
        #[fail(cause)]
        cause: io::Error,
    },
    #[fail(display = "error decoding {}: {}", path, reason)]
    Decode { path: String, reason: String },
    #[fail(display = "error encoding {}: {}", path, reason)]
    Encode { path: String, reason: String },
    #[fail(
        display = "image {} has size {:?}, expected {:?} (all images must share width and height)",
        index, found, expected
    )]
    DimensionMismatch {
        index: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[fail(
        display = "not enough images to remove moving objects: got {}, need at least {}",
        found, required
    )]
    InsufficientFrames { found: usize, required: usize },
}

impl StackError {
    pub(crate) fn io(path: &Path, cause: io::Error) -> Self {
        StackError::Io {
            path: path.display().to_string(),
            cause,
        }
    }
}
