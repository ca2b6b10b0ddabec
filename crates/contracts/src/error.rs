//! Layered error definitions
//!
//! Categorized by source: catalogue / expression / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum BroadcastError {
    // ===== Catalogue Errors =====
    /// Catalogue parse error
    #[error("catalogue parse error: {message}")]
    CatalogueParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Catalogue validation error
    #[error("catalogue validation error at '{field}': {message}")]
    CatalogueValidation { field: String, message: String },

    // ===== Expression Errors =====
    /// Expression template error, tied to the item it came from
    #[error("invalid expression for '{destination}/{item}': {message}")]
    Expression {
        destination: String,
        item: String,
        message: String,
    },

    // ===== Sink Errors =====
    /// Sink send error
    #[error("sink '{sink_name}' send error: {message}")]
    SinkSend { sink_name: String, message: String },

    /// Sink connection error
    #[error("sink '{sink_name}' connection error: {message}")]
    SinkConnection { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl BroadcastError {
    /// Create catalogue parse error
    pub fn catalogue_parse(message: impl Into<String>) -> Self {
        Self::CatalogueParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create catalogue parse error with an underlying cause
    pub fn catalogue_parse_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::CatalogueParse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create catalogue validation error
    pub fn catalogue_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CatalogueValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create expression error
    pub fn expression(
        destination: impl Into<String>,
        item: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Expression {
            destination: destination.into(),
            item: item.into(),
            message: message.into(),
        }
    }

    /// Create sink send error
    pub fn sink_send(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkSend {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create sink connection error
    pub fn sink_connection(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkConnection {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}
