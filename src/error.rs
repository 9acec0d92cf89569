use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, RecognitionError>;

#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    #[error("reference library is empty, nothing to search for")]
    EmptyLibrary,

    #[error("library directory not found: {0}")]
    LibraryNotFound(PathBuf),

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported descriptor cache: element size {elem_size}, element type {elem_type}")]
    CacheFormat { elem_size: u64, elem_type: u64 },
}
