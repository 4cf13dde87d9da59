//! Error types for dbp-core

use thiserror::Error;

/// Core error type for dbpatch
#[derive(Error, Debug)]
pub enum CoreError {
    /// P001: Patch file name does not follow `X.Y.Z....sql`
    #[error("[P001] File name: {file_name} Could not determine the {segment} number. .sql files must be in the format X.Y.Z.{{maybe more stuff}}.sql")]
    NamingConvention { file_name: String, segment: String },

    /// P002: The `<environment>` block is not well-formed markup
    #[error("[P002] Environment block is not well-formed XML: {message}")]
    MarkupSyntax { message: String },

    /// P003: The markup root is not `<environment>`
    #[error("[P003] The root node of the xml must be 'environment', found '{found}'")]
    RootNodeMissing { found: String },

    /// P004: An environment child contains nested markup
    #[error("[P004] The xml node: {node} can not have any children.")]
    NestedNode { node: String },

    /// P005: The leading row-count directive could not be decoded
    #[error("[P005] Invalid row-count directive: {message}")]
    DirectiveDecode { message: String },

    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Failed to parse configuration file
    #[error("[C002] Failed to parse config: {message}")]
    ConfigParse { message: String },

    /// C003: Invalid configuration value
    #[error("[C003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C004: IO error
    #[error("[C004] IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
