pub mod config;
pub mod data_loader;
pub mod error;
pub mod extractor;
pub mod features;
pub mod geometry;
pub mod io;
pub mod library;
pub mod matcher;
pub mod presence;
pub mod recognition;
pub mod timer;
pub mod types;

pub use error::{RecognitionError, Result};
