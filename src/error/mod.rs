use std::fmt::Display;
use thiserror::Error;

pub mod codes;

pub use codes::{describe_error_code, ErrorCode};

use crate::collector::CollectorError;
use crate::enrichment::EnrichmentError;
use crate::geometry::GeometryError;
use crate::storage::StorageError;
use crate::tiling::TilingError;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// The unified error type for the area processing pipeline
#[derive(Error, Debug)]
pub enum AgroError {
    #[error("[E{code:04}] Configuration error: {message}")]
    Config {
        code: u16,
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Geometry error: {message}")]
    Geometry {
        code: u16,
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Tiling error: {message}")]
    Tiling {
        code: u16,
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Collection error: {message}")]
    Collection {
        code: u16,
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Enrichment error: {message}")]
    Enrichment {
        code: u16,
        message: String,
        area_id: Option<String>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Storage error: {message}")]
    Storage {
        code: u16,
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Validation error: {message}")]
    Validation {
        code: u16,
        message: String,
        field: Option<String>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] {message}")]
    Other {
        code: u16,
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },
}

impl AgroError {
    /// Create a configuration error with default code
    pub fn config(message: impl Into<String>) -> Self {
        Self::config_with_code(ErrorCode::CONFIG_GENERIC, message)
    }

    /// Create a configuration error with specific code
    pub fn config_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Config {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn geometry_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Geometry {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn tiling_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Tiling {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn collection_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Collection {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create an enrichment error tied to an area
    pub fn enrichment_with_code(
        code: u16,
        message: impl Into<String>,
        area_id: Option<String>,
    ) -> Self {
        Self::Enrichment {
            code,
            message: message.into(),
            area_id,
            source: None,
        }
    }

    /// Create a storage error with default code
    pub fn storage(message: impl Into<String>) -> Self {
        Self::storage_with_code(ErrorCode::STORAGE_GENERIC, message)
    }

    pub fn storage_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Storage {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create a validation error with default code
    pub fn validation(message: impl Into<String>) -> Self {
        Self::validation_with_code(ErrorCode::VALIDATION_GENERIC, message, None)
    }

    /// Create a validation error with specific code and field
    pub fn validation_with_code(
        code: u16,
        message: impl Into<String>,
        field: Option<String>,
    ) -> Self {
        Self::Validation {
            code,
            message: message.into(),
            field,
            source: None,
        }
    }

    /// Create a generic other error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            code: ErrorCode::OTHER_GENERIC,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error to this error
    pub fn with_source(mut self, source: impl Into<BoxedSource>) -> Self {
        match &mut self {
            Self::Config { source: src, .. }
            | Self::Geometry { source: src, .. }
            | Self::Tiling { source: src, .. }
            | Self::Collection { source: src, .. }
            | Self::Enrichment { source: src, .. }
            | Self::Storage { source: src, .. }
            | Self::Validation { source: src, .. }
            | Self::Other { source: src, .. } => {
                *src = Some(source.into());
            }
        }
        self
    }

    /// Add context to the error message
    pub fn with_context(mut self, context: impl Display) -> Self {
        match &mut self {
            Self::Config { message, .. }
            | Self::Geometry { message, .. }
            | Self::Tiling { message, .. }
            | Self::Collection { message, .. }
            | Self::Enrichment { message, .. }
            | Self::Storage { message, .. }
            | Self::Validation { message, .. }
            | Self::Other { message, .. } => {
                *message = format!("{}: {}", message, context);
            }
        }
        self
    }

    /// Get the error code
    pub fn code(&self) -> u16 {
        match self {
            Self::Config { code, .. }
            | Self::Geometry { code, .. }
            | Self::Tiling { code, .. }
            | Self::Collection { code, .. }
            | Self::Enrichment { code, .. }
            | Self::Storage { code, .. }
            | Self::Validation { code, .. }
            | Self::Other { code, .. } => *code,
        }
    }

    /// Whether the request was rejected before any state was created.
    pub fn is_input_rejection(&self) -> bool {
        matches!(
            self,
            Self::Geometry { .. } | Self::Tiling { .. } | Self::Validation { .. }
        )
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Config { message, .. } => format!("Configuration problem: {}", message),
            Self::Geometry { message, .. } => format!("Invalid polygon: {}", message),
            Self::Tiling { message, .. } => format!("Polygon could not be tiled: {}", message),
            Self::Collection { message, .. } => format!("Variable collection failed: {}", message),
            Self::Enrichment {
                message, area_id, ..
            } => match area_id {
                Some(id) => format!("Enrichment of area {} failed: {}", id, message),
                None => format!("Enrichment failed: {}", message),
            },
            Self::Storage { message, .. } => format!("Storage error: {}", message),
            Self::Validation { message, field, .. } => match field {
                Some(f) => format!("Validation error for '{}': {}", f, message),
                None => format!("Validation error: {}", message),
            },
            Self::Other { message, .. } => message.clone(),
        }
    }
}

/// Type alias for Results using AgroError
pub type Result<T> = std::result::Result<T, AgroError>;

impl From<GeometryError> for AgroError {
    fn from(err: GeometryError) -> Self {
        AgroError::geometry_with_code(err.code(), err.to_string())
    }
}

impl From<TilingError> for AgroError {
    fn from(err: TilingError) -> Self {
        match err {
            TilingError::Geometry(inner) => AgroError::from(inner),
            other => AgroError::tiling_with_code(other.code(), other.to_string()),
        }
    }
}

impl From<CollectorError> for AgroError {
    fn from(err: CollectorError) -> Self {
        AgroError::collection_with_code(ErrorCode::COLLECTION_PROVIDER_SET, err.to_string())
    }
}

impl From<EnrichmentError> for AgroError {
    fn from(err: EnrichmentError) -> Self {
        AgroError::enrichment_with_code(err.code(), err.to_string(), None)
    }
}

impl From<StorageError> for AgroError {
    fn from(err: StorageError) -> Self {
        let code = match &err {
            StorageError::NotFound(_) => ErrorCode::STORAGE_NOT_FOUND,
            StorageError::Conflict(_) => ErrorCode::STORAGE_CONFLICT,
        };
        AgroError::storage_with_code(code, err.to_string()).with_source(err)
    }
}

impl From<toml::de::Error> for AgroError {
    fn from(err: toml::de::Error) -> Self {
        AgroError::config_with_code(ErrorCode::CONFIG_INVALID_TOML, "Invalid TOML syntax")
            .with_source(err)
    }
}
