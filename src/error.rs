//! Error types for the layout engine.
//!
//! Every variant is fatal for the document being generated: the engine has no
//! partial-failure mode, so the first error aborts `generate`.

use thiserror::Error;

use crate::control::{ControlId, ControlKind};

/// The unified error type returned by all public folio API functions.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// A container refused a child (its `can_add` check failed), or a row is
    /// already owned by another table.
    #[error("{child} is not permitted inside {parent} (child position {position})")]
    StructuralViolation {
        parent: ControlKind,
        child: ControlKind,
        position: usize,
    },

    /// A leaf control was handed a child it cannot host.
    #[error("{control} cannot host children (attempted to add {child})")]
    UnsupportedChild {
        control: ControlKind,
        child: ControlKind,
    },

    /// Box parameters were given to a control that has no box.
    #[error("{control} does not take box parameters")]
    UnsupportedLayout { control: ControlKind },

    /// A table row was laid out on its own instead of through its table.
    #[error("table row {row} can only be laid out by its owning table")]
    DetachedRow { row: ControlId },

    /// `remove` was called with an id that is not a child of the container.
    #[error("{parent} has no child with id {id}")]
    UnknownChild { parent: ControlKind, id: ControlId },

    /// A length, thickness, or column-length string failed to parse.
    #[error("invalid length: {0}")]
    InvalidLength(String),

    /// Page setup that cannot produce a document.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The JSON document description failed to parse.
    #[error("failed to parse document description: {0}")]
    Description(#[from] serde_json::Error),

    /// The PDF or PNG backend failed.
    #[error("render error: {0}")]
    Render(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LayoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_violation_names_both_kinds() {
        let err = LayoutError::StructuralViolation {
            parent: ControlKind::Table,
            child: ControlKind::TextBlock,
            position: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("Table"), "{msg}");
        assert!(msg.contains("TextBlock"), "{msg}");
        assert!(msg.contains('2'), "{msg}");
    }

    #[test]
    fn json_errors_convert() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: LayoutError = json_err.into();
        assert!(matches!(err, LayoutError::Description(_)));
    }
}
