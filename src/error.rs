//! Errors raised by the package model.

use thiserror::Error;

/// Broad classification of [`ModelError`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An id, path or index does not resolve to an existing element.
    NotFound,
    /// The operation would break a structural invariant.
    InvalidOperation,
}

/// Errors raised by [`Structure`](crate::model::Structure),
/// [`Comment`](crate::model::Comment) and [`Package`](crate::model::Package) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// No entity with the given id in the container.
    #[error("{}No such entity: {id}", container_prefix(.container.as_deref()))]
    NoSuchEntity {
        /// Id of the structure that was searched, when it is known.
        container: Option<String>,
        /// Entity id that was looked up.
        id: String,
    },

    /// No structure (blob, structure or entity list) with the given id.
    #[error("No such structure: {0}")]
    NoSuchStructure(String),

    /// No sub-package with the given id.
    #[error("No such package: {0}")]
    NoSuchPackage(String),

    /// Neither a package nor a structure with the given id.
    #[error("No such element: {0}")]
    NoSuchElement(String),

    /// Positional access past the end of a structure.
    #[error("Index {index} out of range for structure of length {len}")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Length of the structure at the time of access.
        len: usize,
    },

    /// Stub registration on a package created with `lazy = false`.
    #[error("Package '{0}' is not lazy; stubs cannot be registered")]
    NotLazy(String),

    /// A comment was added as a child of another comment.
    #[error("Cannot add a comment to a comment")]
    NestedComment,

    /// [`Structure::process`](crate::model::Structure::process) was called without a callback.
    #[error("process callback function not specified")]
    MissingProcessCallback,

    /// The element resolved by a path holds no entities (a package or a blob).
    #[error("Element '{0}' does not hold entities")]
    NotAnEntityContainer(String),
}

impl ModelError {
    /// Returns the broad classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NoSuchEntity { .. }
            | Self::NoSuchStructure(_)
            | Self::NoSuchPackage(_)
            | Self::NoSuchElement(_)
            | Self::IndexOutOfRange { .. } => ErrorKind::NotFound,
            Self::NotLazy(_)
            | Self::NestedComment
            | Self::MissingProcessCallback
            | Self::NotAnEntityContainer(_) => ErrorKind::InvalidOperation,
        }
    }

    /// Shorthand for a [`ModelError::NoSuchEntity`] without container id.
    pub(crate) fn no_such_entity(id: &str) -> Self {
        Self::NoSuchEntity { container: None, id: id.to_owned() }
    }
}

/// Formats the `[container] ` prefix of entity errors.
fn container_prefix(container: Option<&str>) -> String {
    container.map_or_else(String::new, |c| format!("[{c}] "))
}
