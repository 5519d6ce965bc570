//! Classification of registered types into comparison strategies.

use serde::{Deserialize, Serialize};

use crate::registry::TypeInfo;
use crate::value::Structural;

/// Comparison strategy category for a registered type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Kind {
    /// Compared by value equality.
    Simple,
    /// Compared by ordered element traversal.
    Enumerable,
    /// Compared member by member.
    Complex,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Simple => "simple",
            Kind::Enumerable => "enumerable",
            Kind::Complex => "complex",
        }
    }
}

/// Classify a type by its registered capabilities.
///
/// A type can be both Complex and Enumerable (a custom collection with extra
/// members); such types classify as `Complex` and the engines consult
/// [`TypeInfo::is_enumerable`] separately so both strategies run. A type
/// with no capabilities at all classifies as `Simple` and falls back to
/// reference identity.
pub fn classify(info: &TypeInfo) -> Kind {
    if info.is_simple() {
        Kind::Simple
    } else if info.has_members() {
        Kind::Complex
    } else if info.is_enumerable() {
        Kind::Enumerable
    } else {
        Kind::Simple
    }
}

/// Classify a value's concrete runtime type.
pub fn classify_value(value: &dyn Structural) -> Kind {
    classify(value.type_info())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Plain {
        n: i32,
    }

    crate::structural!(Plain { n });

    struct Opaque;

    crate::structural!(Opaque => |_spec| {});

    #[test]
    fn test_kind_as_str() {
        assert_eq!(Kind::Simple.as_str(), "simple");
        assert_eq!(Kind::Enumerable.as_str(), "enumerable");
        assert_eq!(Kind::Complex.as_str(), "complex");
    }

    #[test]
    fn test_classify_simple() {
        assert_eq!(classify_value(&7i32), Kind::Simple);
        assert_eq!(classify_value(&"x".to_string()), Kind::Simple);
    }

    #[test]
    fn test_classify_enumerable() {
        let items: Vec<i32> = vec![1, 2];
        assert_eq!(classify_value(&items), Kind::Enumerable);
    }

    #[test]
    fn test_classify_complex() {
        let plain = Plain { n: 1 };
        assert_eq!(classify_value(&plain), Kind::Complex);
    }

    #[test]
    fn test_classify_opaque_falls_back_to_simple() {
        let opaque = Opaque;
        assert_eq!(classify_value(&opaque), Kind::Simple);
        assert!(!opaque.type_info().is_simple());
    }
}
