//! Type system errors

use thiserror::Error;

/// Result alias used throughout the type system
pub type TypeSystemResult<T> = Result<T, TypeSystemError>;

/// Errors that can occur while building or querying a type universe
#[derive(Debug, Error)]
pub enum TypeSystemError {
    /// Type reference that does not name any known definition
    #[error("Undefined type: {name}")]
    UndefinedType {
        /// Full name that was not found
        name: String,
    },

    /// Two definitions with the same full name
    #[error("Duplicate type definition: {name}")]
    DuplicateType {
        /// Full name defined twice
        name: String,
    },

    /// Invalid type argument count for a generic instantiation
    #[error("Invalid type argument count for {name}: expected {expected}, got {actual}")]
    InvalidTypeArgCount {
        /// Generic type definition
        name: String,
        /// Expected count
        expected: usize,
        /// Actual count
        actual: usize,
    },

    /// Generic parameter index outside the declaring type's parameter list
    #[error("Generic parameter {index} is out of range in {owner}")]
    GenericParameterOutOfRange {
        /// Type whose member uses the parameter
        owner: String,
        /// Offending index
        index: usize,
    },

    /// Property accessor that does not match a method of the declaring type
    #[error("Accessor {accessor} of property {property} not found on {owner}")]
    MissingAccessor {
        /// Declaring type
        owner: String,
        /// Property name
        property: String,
        /// Accessor method name
        accessor: String,
    },

    /// Serialized metadata could not be decoded
    #[error("Malformed metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}
