//! Error types for the copy engine and member accessors.

use thiserror::Error;

/// Result type alias for copy operations.
pub type Result<T> = std::result::Result<T, CopyError>;

/// Errors raised while cloning or copying object graphs.
///
/// Only failures that make the requested operation itself impossible surface
/// through this type. Faults confined to a single member are absorbed,
/// logged, and recorded on the [`CopyReport`](crate::copy::CopyReport).
#[derive(Error, Debug)]
pub enum CopyError {
    /// Target type has neither a copy constructor nor a default constructor.
    #[error("no usable constructor registered for `{type_name}`")]
    NoConstructor {
        /// Type that could not be instantiated.
        type_name: &'static str,
    },

    /// `copy_into` invoked with differing runtime types.
    #[error("cannot copy `{source_type}` into `{target}`: runtime types differ")]
    TypeMismatch {
        /// Type of the copy target.
        target: &'static str,
        /// Type of the copy source.
        source_type: &'static str,
    },

    /// `copy_into` invoked with an absent target or source.
    #[error("{side} of copy_into is absent")]
    AbsentArgument {
        /// Which argument was absent.
        side: &'static str,
    },

    /// An absent value cannot be stored in a non-optional slot.
    #[error("cannot store an absent value in non-optional `{type_name}`")]
    AbsentValue {
        /// Type of the slot that rejected the absent value.
        type_name: &'static str,
    },

    /// The type does not accept appended elements.
    #[error("`{type_name}` does not accept appended elements")]
    NotEnumerable {
        /// Type that rejected the element.
        type_name: &'static str,
    },

    /// The type does not accept whole-value assignment.
    #[error("`{type_name}` does not accept whole-value assignment")]
    NotAssignable {
        /// Type that rejected the assignment.
        type_name: &'static str,
    },

    /// A value produced during copying did not match the destination type.
    #[error("copied value is not a `{type_name}`")]
    ValueMismatch {
        /// Expected destination type.
        type_name: &'static str,
    },

    /// A member accessor failed.
    #[error("member access failed: {0}")]
    Access(#[from] AccessFault),
}

/// A member accessor fault: the getter or setter for a single member failed.
///
/// Faults are absorbed per member — the surrounding comparison or copy
/// continues with the remaining members.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct AccessFault {
    reason: String,
}

impl AccessFault {
    /// Create a fault with a human-readable reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CopyError::NoConstructor { type_name: "Widget" };
        assert!(err.to_string().contains("Widget"));

        let err = CopyError::TypeMismatch {
            target: "Order",
            source_type: "Invoice",
        };
        assert!(err.to_string().contains("Order"));
        assert!(err.to_string().contains("Invoice"));

        let err = CopyError::AbsentArgument { side: "target" };
        assert!(err.to_string().contains("target"));
    }

    #[test]
    fn test_access_fault_conversion() {
        let fault = AccessFault::new("getter panicked");
        let err: CopyError = fault.clone().into();
        assert!(err.to_string().contains("getter panicked"));
        assert_eq!(fault, AccessFault::new("getter panicked"));
    }
}
