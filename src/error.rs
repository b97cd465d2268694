//! Error handling for pixelgraph
//!
//! This module defines the crate-level error type and a Result alias used by
//! everything outside the graph core (configuration, documents, image I/O).
//! The graph core itself reports through [`GraphError`], which converts into
//! [`PixelGraphError`].

use crate::capture::CaptureError;
use crate::graph::GraphError;
use thiserror::Error;

/// Main error type for pixelgraph operations
#[derive(Error, Debug)]
pub enum PixelGraphError {
    /// Graph mutation was rejected
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Capture producer could not be started
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Image decoding/encoding errors
    #[error("Image error: {0}")]
    Image(String),

    /// Script operator failed to load
    #[error("Script error: {0}")]
    Script(String),

    /// Graph document errors
    #[error("Document error: {0}")]
    Document(String),

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
        source: Box<PixelGraphError>,
    },
}

impl PixelGraphError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PixelGraphError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for pixelgraph operations
pub type Result<T> = std::result::Result<T, PixelGraphError>;

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
    E: Into<PixelGraphError>,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PixelGraphError::Config("node_capacity must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: node_capacity must be positive"
        );
    }

    #[test]
    fn test_error_with_context() {
        let err = PixelGraphError::Image("bad header".to_string());
        let with_ctx = err.with_context("Failed to load source");
        assert!(with_ctx.to_string().contains("Failed to load source"));
        assert!(with_ctx.to_string().contains("bad header"));
    }

    #[test]
    fn test_graph_error_context() {
        let res: std::result::Result<(), GraphError> = Err(GraphError::NodeTableFull { capacity: 4 });
        let err = res.context("Restoring document").unwrap_err();
        assert!(err.to_string().starts_with("Restoring document"));
    }
}
