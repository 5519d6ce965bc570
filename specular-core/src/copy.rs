//! Structural copier: deep clones and in-place copies of registered graphs.
//!
//! Cloning prefers a registered copy constructor, then falls back to the
//! default constructor plus member-wise copying. Failures confined to a
//! single member are logged, recorded on the [`CopyReport`], and skipped;
//! only a missing constructor or a `copy_into` argument error is fatal.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::compare::ROOT_PATH;
use crate::error::{CopyError, Result};
use crate::registry::TypeInfo;
use crate::report::{element_path, member_path, SkippedMember};
use crate::value::{resolve, same_object, Structural};

/// Per-member outcomes of a copy operation.
///
/// Skipped members are recorded here so failure visibility does not depend
/// on log output alone.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CopyReport {
    /// Members and elements skipped with the reason, in traversal order.
    pub skipped: Vec<SkippedMember>,
}

impl CopyReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether every member copied cleanly.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Note a member or element that could not be copied.
    pub fn note_skipped(&mut self, value_path: impl Into<String>, reason: impl Into<String>) {
        self.skipped.push(SkippedMember {
            value_path: value_path.into(),
            reason: reason.into(),
        });
    }
}

/// Deep-clone a value, discarding per-member outcomes.
pub fn deep_clone(source: &dyn Structural) -> Result<Box<dyn Structural>> {
    let mut report = CopyReport::new();
    deep_clone_with(source, &mut report)
}

/// Deep-clone a value, recording skipped members into `report`.
pub fn deep_clone_with(
    source: &dyn Structural,
    report: &mut CopyReport,
) -> Result<Box<dyn Structural>> {
    clone_value(source, ROOT_PATH, report)
}

/// Deep-clone a typed value.
pub fn clone_of<T: Structural>(source: &T) -> Result<T> {
    let cloned = deep_clone(source)?;
    match cloned.into_any().downcast::<T>() {
        Ok(boxed) => Ok(*boxed),
        Err(_) => Err(CopyError::ValueMismatch {
            type_name: std::any::type_name::<T>(),
        }),
    }
}

/// Copy `source` into `target` member by member, without constructing a new
/// instance.
///
/// Both arguments must be present and share a runtime type; violations
/// surface immediately with no partial work. Member-level failures are
/// skipped and recorded on the returned report.
pub fn copy_into(target: &mut dyn Structural, source: &dyn Structural) -> Result<CopyReport> {
    if target.is_absent() {
        return Err(CopyError::AbsentArgument { side: "target" });
    }
    if source.is_absent() {
        return Err(CopyError::AbsentArgument { side: "source" });
    }
    let target_info = target.type_info();
    let source_info = source.type_info();
    if target_info.id() != source_info.id() {
        return Err(CopyError::TypeMismatch {
            target: target_info.name(),
            source_type: source_info.name(),
        });
    }

    let mut report = CopyReport::new();
    copy_value_into(target, source, ROOT_PATH, &mut report)?;
    Ok(report)
}

fn clone_value(
    source: &dyn Structural,
    path: &str,
    report: &mut CopyReport,
) -> Result<Box<dyn Structural>> {
    if source.is_absent() {
        return match source.empty_clone() {
            Some(empty) => Ok(empty),
            None => Err(CopyError::NoConstructor {
                type_name: source.type_info().name(),
            }),
        };
    }
    if let Some(inner) = source.unwrap_value() {
        let cloned = clone_value(inner, path, report)?;
        return match source.wrap_value(cloned) {
            Some(wrapped) => Ok(wrapped),
            None => Err(CopyError::ValueMismatch {
                type_name: source.type_info().name(),
            }),
        };
    }

    let info = source.type_info();
    if let Some(ops) = info.simple_ops() {
        // Simple values are immutable: copied by value, never traversed.
        return match ops.clone_value(source) {
            Some(cloned) => Ok(cloned),
            None => Err(CopyError::ValueMismatch {
                type_name: info.name(),
            }),
        };
    }
    if info.has_copy_constructor() {
        return match info.copy_instance(source) {
            Some(cloned) => Ok(cloned),
            None => Err(CopyError::ValueMismatch {
                type_name: info.name(),
            }),
        };
    }
    if !info.has_members() && !info.is_enumerable() {
        // An opaque type carries state the descriptors cannot see; a
        // default-constructed instance would silently drop it. Only a copy
        // constructor can reproduce such a value.
        return Err(CopyError::NoConstructor {
            type_name: info.name(),
        });
    }

    let mut target = match info.new_instance() {
        Some(target) => target,
        None => {
            return Err(CopyError::NoConstructor {
                type_name: info.name(),
            })
        }
    };
    copy_members(target.as_mut(), source, info, path, report);
    if info.is_enumerable() {
        copy_elements(target.as_mut(), source, path, report);
    }
    Ok(target)
}

fn copy_value_into(
    target: &mut dyn Structural,
    source: &dyn Structural,
    path: &str,
    report: &mut CopyReport,
) -> Result<()> {
    if source.is_absent() {
        if target.is_absent() {
            return Ok(());
        }
        if target.make_absent() {
            return Ok(());
        }
        return Err(CopyError::AbsentValue {
            type_name: target.type_info().name(),
        });
    }
    if target.is_absent() {
        // Materialize the absent target from a clone of the source, wrapper
        // shape and all.
        let cloned = clone_value(source, path, report)?;
        return target.assign_value(cloned);
    }
    let source = resolve(source);
    if let Some(inner) = target.unwrap_value_mut() {
        return copy_value_into(inner, source, path, report);
    }

    let info = target.type_info();
    let source_info = source.type_info();
    if info.id() != source_info.id() {
        return Err(CopyError::TypeMismatch {
            target: info.name(),
            source_type: source_info.name(),
        });
    }

    if info.is_simple() {
        let cloned = match info.simple_ops().and_then(|ops| ops.clone_value(source)) {
            Some(cloned) => cloned,
            None => {
                return Err(CopyError::ValueMismatch {
                    type_name: info.name(),
                })
            }
        };
        return target.assign_value(cloned);
    }

    copy_members(target, source, info, path, report);
    if info.is_enumerable() {
        target.clear_elements();
        copy_elements(target, source, path, report);
    }
    Ok(())
}

fn copy_members(
    target: &mut dyn Structural,
    source: &dyn Structural,
    info: &TypeInfo,
    path: &str,
    report: &mut CopyReport,
) {
    for member in info.members() {
        let child_path = member_path(path, member.name());
        let source_value = match member.value(source) {
            Ok(value) => value,
            Err(fault) => {
                warn!("member access failed at {}: {}", child_path, fault);
                report.note_skipped(child_path, fault.to_string());
                continue;
            }
        };
        // Same narrow guard as the comparer: a back-reference to the
        // containing object is not copied.
        if same_object(source_value, source) {
            continue;
        }

        let outcome = if member.is_writable() && !is_enumerable_value(source_value) {
            clone_value(source_value, &child_path, report)
                .and_then(|cloned| member.assign(target, cloned))
        } else {
            match member.value_mut(target) {
                Ok(target_value) => copy_value_into(target_value, source_value, &child_path, report),
                Err(fault) => Err(CopyError::Access(fault)),
            }
        };
        if let Err(error) = outcome {
            warn!("member copy failed at {}: {}", child_path, error);
            report.note_skipped(child_path, error.to_string());
        }
    }
}

fn copy_elements(
    target: &mut dyn Structural,
    source: &dyn Structural,
    path: &str,
    report: &mut CopyReport,
) {
    let items = match source.elements() {
        Some(items) => items,
        None => return,
    };
    for (index, item) in items.iter().enumerate() {
        let child_path = element_path(path, index);
        match clone_value(*item, &child_path, report) {
            Ok(cloned) => {
                if let Err(error) = target.append_element(cloned) {
                    warn!("element append failed at {}: {}", child_path, error);
                    report.note_skipped(child_path, error.to_string());
                }
            }
            Err(error) => {
                warn!("element clone failed at {}: {}", child_path, error);
                report.note_skipped(child_path, error.to_string());
            }
        }
    }
}

/// Whether a member value should be copied in place rather than reassigned:
/// enumerable values go through the element path even when the member is
/// writable.
fn is_enumerable_value(value: &dyn Structural) -> bool {
    let value = resolve(value);
    !value.is_absent() && value.type_info().is_enumerable()
}
