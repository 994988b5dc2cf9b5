//! Loader type definitions.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::MatcherError;
use crate::error::ModelError;

#[derive(Error, Debug)]
pub enum LoaderError {
    /// Error when the root path is missing or not a directory
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    /// Error when the configured patterns cannot be compiled
    #[error(transparent)]
    Matcher(#[from] MatcherError),
    /// Error when the package tree rejects an entry
    #[error(transparent)]
    Model(#[from] ModelError),
}
