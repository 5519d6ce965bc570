//! Specular — structural comparison and deep copy for registered object
//! graphs.
//!
//! Given two registered object graphs, [`compare`] determines structural
//! equality and records every difference with its value path; [`deep_clone`]
//! and [`copy_into`] produce independent deep copies through the same
//! per-type descriptors.
//!
//! # Features
//!
//! - **Registered reflection**: types describe their members once through
//!   [`registry::descriptor_of`]; descriptors are cached process-wide and
//!   safe to populate concurrently.
//! - **Full difference reports**: comparison never stops at the first
//!   mismatch — one run surfaces every difference, each addressed by a
//!   dotted/bracketed value path such as `object.lines[2].sku`.
//! - **Deep copies**: clone through copy constructors, default constructors,
//!   and member descriptors; per-member failures are skipped and reported,
//!   not fatal.
//! - **Dual-facet collections**: a custom collection with extra members is
//!   compared and copied member-wise and element-wise.
//!
//! # Example
//!
//! ```
//! use specular_core::{clone_of, compare, DiffReport};
//!
//! #[derive(Default)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! specular_core::structural!(Point { x, y });
//!
//! let a = Point { x: 1, y: 2 };
//! let b = Point { x: 1, y: 3 };
//!
//! let mut report = DiffReport::new();
//! assert!(!compare(&a, &b, &mut report));
//! assert_eq!(report.differences[0].value_path, "object.y");
//!
//! let copy = clone_of(&a).expect("point clones cleanly");
//! assert_eq!(copy.x, 1);
//! assert_eq!(copy.y, 2);
//! ```

pub mod classify;
pub mod compare;
pub mod copy;
pub mod error;
pub mod registry;
pub mod report;
pub mod value;

pub use classify::{classify, classify_value, Kind};
pub use compare::{compare, compare_rooted, is_equal, ROOT_PATH};
pub use copy::{clone_of, copy_into, deep_clone, deep_clone_with, CopyReport};
pub use error::{AccessFault, CopyError, Result};
pub use registry::{MemberDescriptor, SimpleOps, TypeBuilder, TypeInfo};
pub use report::{DiffKind, DiffReport, DiffSummary, Difference, SkippedMember};
pub use value::{same_object, Structural};
