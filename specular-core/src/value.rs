//! The structural value model: the [`Structural`] trait, built-in
//! implementations, and the registration macros.
//!
//! Types participate in comparison and copying by implementing `Structural`,
//! which bridges a concrete value into the engine as a trait object and
//! points at its cached [`TypeInfo`] descriptor. Host crates almost never
//! implement the trait by hand:
//!
//! - [`simple_type!`](crate::simple_type) registers a leaf type compared by
//!   native equality (`PartialEq`),
//! - [`simple_type_ordered!`](crate::simple_type_ordered) registers a leaf
//!   type compared through its ordering,
//! - [`structural!`](crate::structural) registers a complex type and
//!   describes its members.
//!
//! Custom collections that are both complex and enumerable implement the
//! trait manually, overriding the element methods next to a member
//! description.

use std::any::Any;

use crate::error::CopyError;
use crate::registry::{self, TypeInfo};

/// A value that participates in structural comparison and copying.
///
/// Most methods have defaults; wrappers (`Option`, `Box`) override the
/// absence and unwrap hooks, enumerable types override the element methods.
pub trait Structural: Any {
    /// Cached descriptor for the concrete runtime type.
    fn type_info(&self) -> &'static TypeInfo;

    /// Bridge to [`Any`] for downcasting.
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Whether this value is an absent wrapper (`Option::None`).
    fn is_absent(&self) -> bool {
        false
    }

    /// The wrapped inner value, for transparent wrappers.
    fn unwrap_value(&self) -> Option<&dyn Structural> {
        None
    }

    fn unwrap_value_mut(&mut self) -> Option<&mut dyn Structural> {
        None
    }

    /// Reset a wrapper to its absent form. Returns `false` when the type has
    /// no absent form.
    fn make_absent(&mut self) -> bool {
        false
    }

    /// An absent replica of this wrapper — the clone of `None`.
    fn empty_clone(&self) -> Option<Box<dyn Structural>> {
        None
    }

    /// Rebuild this wrapper around a cloned inner value.
    fn wrap_value(&self, _inner: Box<dyn Structural>) -> Option<Box<dyn Structural>> {
        None
    }

    /// Replace the whole value. Supported by simple types and wrappers.
    fn assign_value(&mut self, _value: Box<dyn Structural>) -> Result<(), CopyError> {
        Err(CopyError::NotAssignable {
            type_name: self.type_info().name(),
        })
    }

    /// Ordered element walk, for enumerable types.
    fn elements(&self) -> Option<Vec<&dyn Structural>> {
        None
    }

    /// Append capability used by the copier for enumerable targets.
    fn append_element(&mut self, _element: Box<dyn Structural>) -> Result<(), CopyError> {
        Err(CopyError::NotEnumerable {
            type_name: self.type_info().name(),
        })
    }

    /// Remove all elements ahead of an in-place enumerable copy.
    fn clear_elements(&mut self) {}
}

/// Whether two references denote the same object identity.
///
/// The address alone is not enough: a struct's first member shares the
/// struct's address, so identity also requires the same concrete type.
/// Vtable pointers are not compared — codegen may merge or duplicate them.
pub fn same_object(a: &dyn Structural, b: &dyn Structural) -> bool {
    std::ptr::addr_eq(a as *const dyn Structural, b as *const dyn Structural)
        && a.as_any().type_id() == b.as_any().type_id()
}

/// Unwrap transparent wrappers until a plain or absent value remains.
pub(crate) fn resolve(value: &dyn Structural) -> &dyn Structural {
    let mut current = value;
    while let Some(inner) = current.unwrap_value() {
        current = inner;
    }
    current
}

/// Downcast-assign a boxed value into a typed slot.
pub fn assign_downcast<T: Structural>(
    slot: &mut T,
    value: Box<dyn Structural>,
) -> Result<(), CopyError> {
    match value.into_any().downcast::<T>() {
        Ok(boxed) => {
            *slot = *boxed;
            Ok(())
        }
        Err(_) => Err(CopyError::ValueMismatch {
            type_name: std::any::type_name::<T>(),
        }),
    }
}

/// Register leaf types compared by native equality (`PartialEq`).
///
/// The types must be `PartialEq + Clone + Debug`. Values are treated as
/// immutable: the copier clones them by value instead of traversing them.
///
/// ```
/// #[derive(Clone, Debug, PartialEq)]
/// enum Color {
///     Red,
///     Green,
/// }
///
/// specular_core::simple_type!(Color);
///
/// assert!(specular_core::is_equal(&Color::Red, &Color::Red));
/// assert!(!specular_core::is_equal(&Color::Red, &Color::Green));
/// ```
#[macro_export]
macro_rules! simple_type {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::Structural for $ty {
            fn type_info(&self) -> &'static $crate::TypeInfo {
                $crate::registry::descriptor_of::<Self>(|spec| {
                    spec.simple();
                })
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
                self
            }

            fn assign_value(
                &mut self,
                value: ::std::boxed::Box<dyn $crate::Structural>,
            ) -> ::std::result::Result<(), $crate::CopyError> {
                $crate::value::assign_downcast(self, value)
            }
        }
    )+};
}

/// Register leaf types compared through their ordering.
///
/// The fallback for types without a usable equality operator: two values are
/// equal when `partial_cmp` returns `Ordering::Equal`. An incomparable pair
/// is reported as unequal, never as an error.
#[macro_export]
macro_rules! simple_type_ordered {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::Structural for $ty {
            fn type_info(&self) -> &'static $crate::TypeInfo {
                $crate::registry::descriptor_of::<Self>(|spec| {
                    spec.simple_by_ordering();
                })
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
                self
            }

            fn assign_value(
                &mut self,
                value: ::std::boxed::Box<dyn $crate::Structural>,
            ) -> ::std::result::Result<(), $crate::CopyError> {
                $crate::value::assign_downcast(self, value)
            }
        }
    )+};
}

/// Register a complex type and describe its members.
///
/// The shorthand arm lists read-write fields and uses `Default` as the
/// constructor:
///
/// ```
/// #[derive(Default)]
/// struct Tag {
///     label: String,
///     weight: u32,
/// }
///
/// specular_core::structural!(Tag { label, weight });
///
/// let a = Tag { label: "x".to_string(), weight: 1 };
/// let b = Tag { label: "x".to_string(), weight: 1 };
/// assert!(specular_core::is_equal(&a, &b));
/// ```
///
/// The closure arm hands the full [`TypeBuilder`](crate::TypeBuilder) over
/// for excluded members, computed members, read-only members, and custom
/// constructors:
///
/// ```
/// struct Sensor {
///     id: String,
///     cached_reading: f64,
/// }
///
/// specular_core::structural!(Sensor => |spec| {
///     spec.field("id", |s| &s.id, |s| &mut s.id);
///     spec.field_excluded("cached_reading", |s| &s.cached_reading, |s| &mut s.cached_reading);
///     spec.constructor(|| Sensor { id: String::new(), cached_reading: 0.0 });
/// });
/// ```
#[macro_export]
macro_rules! structural {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        $crate::structural!($ty => |spec| {
            $(
                spec.field(stringify!($field), |v| &v.$field, |v| &mut v.$field);
            )*
            spec.default_constructor();
        });
    };
    ($ty:ty => |$spec:ident| $body:block) => {
        impl $crate::Structural for $ty {
            fn type_info(&self) -> &'static $crate::TypeInfo {
                $crate::registry::descriptor_of::<Self>(|$spec: &mut $crate::TypeBuilder<Self>| $body)
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
                self
            }

            fn assign_value(
                &mut self,
                value: ::std::boxed::Box<dyn $crate::Structural>,
            ) -> ::std::result::Result<(), $crate::CopyError> {
                $crate::value::assign_downcast(self, value)
            }
        }
    };
}

crate::simple_type!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String
);

crate::simple_type!(
    chrono::NaiveDate,
    chrono::NaiveTime,
    chrono::NaiveDateTime,
    chrono::DateTime<chrono::Utc>,
    chrono::DateTime<chrono::FixedOffset>,
    chrono::TimeDelta,
    std::time::Duration,
);

impl<T: Structural> Structural for Option<T> {
    fn type_info(&self) -> &'static TypeInfo {
        registry::descriptor_of::<Self>(|spec| {
            spec.constructor(|| None::<T>);
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn is_absent(&self) -> bool {
        self.is_none()
    }

    fn unwrap_value(&self) -> Option<&dyn Structural> {
        self.as_ref().map(|inner| inner as &dyn Structural)
    }

    fn unwrap_value_mut(&mut self) -> Option<&mut dyn Structural> {
        self.as_mut().map(|inner| inner as &mut dyn Structural)
    }

    fn make_absent(&mut self) -> bool {
        *self = None;
        true
    }

    fn empty_clone(&self) -> Option<Box<dyn Structural>> {
        Some(Box::new(None::<T>))
    }

    fn wrap_value(&self, inner: Box<dyn Structural>) -> Option<Box<dyn Structural>> {
        inner
            .into_any()
            .downcast::<T>()
            .ok()
            .map(|boxed| Box::new(Some(*boxed)) as Box<dyn Structural>)
    }

    fn assign_value(&mut self, value: Box<dyn Structural>) -> Result<(), CopyError> {
        // Accept either a whole Option or a bare inner value.
        let value = match value.into_any().downcast::<Self>() {
            Ok(whole) => {
                *self = *whole;
                return Ok(());
            }
            Err(value) => value,
        };
        match value.downcast::<T>() {
            Ok(inner) => {
                *self = Some(*inner);
                Ok(())
            }
            Err(_) => Err(CopyError::ValueMismatch {
                type_name: std::any::type_name::<Self>(),
            }),
        }
    }
}

impl<T: Structural> Structural for Box<T> {
    fn type_info(&self) -> &'static TypeInfo {
        (**self).type_info()
    }

    fn as_any(&self) -> &dyn Any {
        (**self).as_any()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        (**self).as_any_mut()
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        (*self).into_any()
    }

    fn unwrap_value(&self) -> Option<&dyn Structural> {
        Some(&**self)
    }

    fn unwrap_value_mut(&mut self) -> Option<&mut dyn Structural> {
        Some(&mut **self)
    }

    fn wrap_value(&self, inner: Box<dyn Structural>) -> Option<Box<dyn Structural>> {
        inner
            .into_any()
            .downcast::<T>()
            .ok()
            .map(|boxed| Box::new(boxed) as Box<dyn Structural>)
    }

    fn assign_value(&mut self, value: Box<dyn Structural>) -> Result<(), CopyError> {
        (**self).assign_value(value)
    }
}

impl<T: Structural> Structural for Vec<T> {
    fn type_info(&self) -> &'static TypeInfo {
        registry::descriptor_of::<Self>(|spec| {
            spec.enumerable();
            spec.constructor(Vec::new);
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn elements(&self) -> Option<Vec<&dyn Structural>> {
        Some(self.iter().map(|element| element as &dyn Structural).collect())
    }

    fn append_element(&mut self, element: Box<dyn Structural>) -> Result<(), CopyError> {
        match element.into_any().downcast::<T>() {
            Ok(boxed) => {
                self.push(*boxed);
                Ok(())
            }
            Err(_) => Err(CopyError::ValueMismatch {
                type_name: std::any::type_name::<T>(),
            }),
        }
    }

    fn clear_elements(&mut self) {
        self.clear();
    }

    fn assign_value(&mut self, value: Box<dyn Structural>) -> Result<(), CopyError> {
        assign_downcast(self, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_object_identity() {
        let a = 7i32;
        let b = 7i32;
        let dyn_a: &dyn Structural = &a;
        assert!(same_object(dyn_a, dyn_a));
        assert!(!same_object(&a, &b));
    }

    #[test]
    fn test_first_member_is_not_its_container() {
        #[derive(Default)]
        struct Shell {
            core: i32,
        }

        crate::structural!(Shell { core });

        // The first field shares the struct's address; identity must still
        // tell them apart.
        let shell = Shell { core: 1 };
        assert!(!same_object(&shell.core, &shell));
    }

    #[test]
    fn test_simple_leaf_descriptor() {
        let value = 42i32;
        let info = value.type_info();
        assert!(info.is_simple());
        assert!(!info.is_enumerable());
        assert!(!info.has_members());
    }

    #[test]
    fn test_option_absence() {
        let mut present: Option<i32> = Some(3);
        let absent: Option<i32> = None;

        assert!(!Structural::is_absent(&present));
        assert!(Structural::is_absent(&absent));
        assert!(present.unwrap_value().is_some());
        assert!(absent.unwrap_value().is_none());

        assert!(present.make_absent());
        assert!(Structural::is_absent(&present));
    }

    #[test]
    fn test_option_empty_clone_and_wrap() {
        let source: Option<i32> = Some(5);

        let empty = source.empty_clone().expect("option has an absent form");
        assert!(empty.is_absent());

        let wrapped = source
            .wrap_value(Box::new(9i32))
            .expect("option rewraps its inner type");
        assert!(!wrapped.is_absent());
        let wrapped = wrapped
            .into_any()
            .downcast::<Option<i32>>()
            .expect("wrapped value is an Option<i32>");
        assert_eq!(*wrapped, Some(9));
    }

    #[test]
    fn test_resolve_unwraps_nested_wrappers() {
        let value: Option<Box<i32>> = Some(Box::new(11));
        let resolved = resolve(&value);
        assert_eq!(resolved.as_any().downcast_ref::<i32>(), Some(&11));

        let absent: Option<Box<i32>> = None;
        assert!(resolve(&absent).is_absent());
    }

    #[test]
    fn test_vec_elements_and_append() {
        let mut items: Vec<i32> = vec![1, 2];

        let elements = items.elements().expect("vec is enumerable");
        assert_eq!(elements.len(), 2);

        items
            .append_element(Box::new(3i32))
            .expect("matching element type appends");
        assert_eq!(items, vec![1, 2, 3]);

        let err = items
            .append_element(Box::new("nope".to_string()))
            .expect_err("mismatched element type is rejected");
        assert!(err.to_string().contains("i32"));

        items.clear_elements();
        assert!(items.is_empty());
    }

    #[test]
    fn test_assign_downcast() {
        let mut slot = 1i32;
        assign_downcast(&mut slot, Box::new(8i32)).expect("matching type assigns");
        assert_eq!(slot, 8);

        let err = assign_downcast(&mut slot, Box::new(false)).expect_err("mismatch is rejected");
        assert!(err.to_string().contains("i32"));
    }

    #[test]
    fn test_box_delegates_to_inner() {
        let boxed: Box<i32> = Box::new(4);
        assert!(boxed.type_info().is_simple());
        assert_eq!(resolve(&boxed).as_any().downcast_ref::<i32>(), Some(&4));
    }
}
