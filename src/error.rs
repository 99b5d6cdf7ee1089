//! Error handling for framestream
//!
//! This module defines the crate-level error type and a Result alias.
//! Graph and node failures live in [`crate::pipeline::PipelineError`];
//! item source failures live in [`crate::source::ImportError`]. Both
//! convert into [`FrameStreamError`] with `?`.

use crate::pipeline::PipelineError;
use crate::source::ImportError;
use thiserror::Error;

/// Main error type for framestream operations
#[derive(Error, Debug)]
pub enum FrameStreamError {
    /// Errors raised by the pipeline graph or one of its nodes
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Errors raised by an item source
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to the execution device registry
    #[error("Device error: {0}")]
    Device(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<FrameStreamError>,
    },
}

impl FrameStreamError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        FrameStreamError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

impl From<toml::de::Error> for FrameStreamError {
    fn from(err: toml::de::Error) -> Self {
        FrameStreamError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for FrameStreamError {
    fn from(err: toml::ser::Error) -> Self {
        FrameStreamError::Serialization(err.to_string())
    }
}

/// Result type alias for framestream operations
pub type Result<T> = std::result::Result<T, FrameStreamError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<FrameStreamError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}
