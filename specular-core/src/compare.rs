//! Structural comparer: recursive equality with full difference reporting.
//!
//! Comparison never stops at the first mismatch — every member and element
//! is visited so one run surfaces every difference, each addressed by its
//! value path (`object.lines[2].sku`). Member access faults skip the
//! affected member and are noted on the report; they never abort the run.

use tracing::warn;

use crate::classify::{classify, Kind};
use crate::registry::TypeInfo;
use crate::report::{element_path, member_path, DiffReport, Difference};
use crate::value::{resolve, same_object, Structural};

/// Default root segment for difference paths.
pub const ROOT_PATH: &str = "object";

/// Compare two values, discarding difference details.
pub fn is_equal(actual: &dyn Structural, expected: &dyn Structural) -> bool {
    let mut report = DiffReport::new();
    compare(actual, expected, &mut report)
}

/// Compare two values, recording every difference into `report`.
pub fn compare(actual: &dyn Structural, expected: &dyn Structural, report: &mut DiffReport) -> bool {
    compare_rooted(actual, expected, report, ROOT_PATH)
}

/// Compare two values with an explicit root path segment.
pub fn compare_rooted(
    actual: &dyn Structural,
    expected: &dyn Structural,
    report: &mut DiffReport,
    root: &str,
) -> bool {
    compare_value(actual, expected, root, report)
}

fn compare_value(
    actual: &dyn Structural,
    expected: &dyn Structural,
    path: &str,
    report: &mut DiffReport,
) -> bool {
    // Same identity also breaks simple reference cycles back to one object.
    if same_object(actual, expected) {
        return true;
    }

    let actual = resolve(actual);
    let expected = resolve(expected);
    match (actual.is_absent(), expected.is_absent()) {
        (true, true) => return true,
        (true, false) => {
            report.record(Difference::missing(path, None, Some(render(expected))));
            return false;
        }
        (false, true) => {
            report.record(Difference::missing(path, Some(render(actual)), None));
            return false;
        }
        (false, false) => {}
    }
    if same_object(actual, expected) {
        return true;
    }

    let info = actual.type_info();
    let expected_info = expected.type_info();
    if info.id() != expected_info.id() {
        report.record(Difference::type_mismatch(
            path,
            info.name(),
            expected_info.name(),
        ));
        return false;
    }

    match classify(info) {
        Kind::Simple => compare_simple(actual, expected, info, path, report),
        Kind::Complex | Kind::Enumerable => {
            let members_equal = compare_members(actual, expected, info, path, report);
            let elements_equal =
                !info.is_enumerable() || compare_elements(actual, expected, path, report);
            members_equal && elements_equal
        }
    }
}

fn compare_simple(
    actual: &dyn Structural,
    expected: &dyn Structural,
    info: &TypeInfo,
    path: &str,
    report: &mut DiffReport,
) -> bool {
    let ops = match info.simple_ops() {
        Some(ops) => ops,
        None => {
            // Last resort for opaque types: identity was already ruled out.
            report.record(
                Difference::value(path, render(actual), render(expected))
                    .with_reason("no equality mechanism registered"),
            );
            return false;
        }
    };
    match ops.equals(actual, expected) {
        Some(true) => true,
        Some(false) => {
            report.record(Difference::value(
                path,
                ops.render(actual),
                ops.render(expected),
            ));
            false
        }
        None => {
            report.record(
                Difference::value(path, ops.render(actual), ops.render(expected))
                    .with_reason("equality comparison failed"),
            );
            false
        }
    }
}

fn compare_members(
    actual: &dyn Structural,
    expected: &dyn Structural,
    info: &TypeInfo,
    path: &str,
    report: &mut DiffReport,
) -> bool {
    let mut equal = true;
    for member in info.members() {
        let child_path = member_path(path, member.name());
        let (actual_value, expected_value) = match (member.value(actual), member.value(expected)) {
            (Ok(actual_value), Ok(expected_value)) => (actual_value, expected_value),
            (Err(fault), _) | (_, Err(fault)) => {
                warn!("member access failed at {}: {}", child_path, fault);
                report.note_skipped(child_path, fault.to_string());
                continue;
            }
        };
        // Narrow guard: a member pointing back at its own container is
        // skipped; cycles through distinct objects are not detected.
        if same_object(actual_value, actual) || same_object(expected_value, expected) {
            continue;
        }
        if !compare_value(actual_value, expected_value, &child_path, report) {
            equal = false;
        }
    }
    equal
}

fn compare_elements(
    actual: &dyn Structural,
    expected: &dyn Structural,
    path: &str,
    report: &mut DiffReport,
) -> bool {
    let (actual_items, expected_items) = match (actual.elements(), expected.elements()) {
        (Some(actual_items), Some(expected_items)) => (actual_items, expected_items),
        _ => return true,
    };

    let mut equal = true;
    for (index, (actual_item, expected_item)) in actual_items
        .iter()
        .zip(expected_items.iter())
        .enumerate()
    {
        let child_path = element_path(path, index);
        if !compare_value(*actual_item, *expected_item, &child_path, report) {
            equal = false;
        }
    }
    if actual_items.len() != expected_items.len() {
        report.record(Difference::element_count(
            path,
            actual_items.len(),
            expected_items.len(),
        ));
        equal = false;
    }
    equal
}

fn render(value: &dyn Structural) -> String {
    let value = resolve(value);
    if value.is_absent() {
        return "None".to_string();
    }
    let info = value.type_info();
    match info.simple_ops() {
        Some(ops) => ops.render(value),
        None => info.name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AccessFault;
    use crate::report::DiffKind;
    use std::any::Any;

    #[derive(Default)]
    struct Engine {
        displacement: u32,
        code: String,
    }

    crate::structural!(Engine { displacement, code });

    #[derive(Default)]
    struct Car {
        model: String,
        engine: Engine,
        plates: Vec<String>,
    }

    crate::structural!(Car { model, engine, plates });

    fn make_car() -> Car {
        Car {
            model: "K100".to_string(),
            engine: Engine {
                displacement: 1600,
                code: "B16".to_string(),
            },
            plates: vec!["AA-1".to_string(), "AA-2".to_string(), "AA-3".to_string()],
        }
    }

    #[test]
    fn test_reflexivity() {
        let car = make_car();
        assert!(is_equal(&car, &car));

        let other = make_car();
        let mut report = DiffReport::new();
        assert!(compare(&car, &other, &mut report));
        assert!(report.is_match());
    }

    #[test]
    fn test_simple_value_mismatch_at_root() {
        let mut report = DiffReport::new();
        assert!(!compare(&1i32, &2i32, &mut report));

        assert_eq!(report.len(), 1);
        let diff = &report.differences[0];
        assert_eq!(diff.kind, DiffKind::Value);
        assert_eq!(diff.value_path, "object");
        assert_eq!(diff.actual.as_deref(), Some("1"));
        assert_eq!(diff.expected.as_deref(), Some("2"));
    }

    #[test]
    fn test_type_mismatch_single_difference() {
        let mut report = DiffReport::new();
        let text = "7".to_string();
        assert!(!compare(&7i32, &text, &mut report));

        assert_eq!(report.len(), 1);
        assert_eq!(report.differences[0].kind, DiffKind::Type);
    }

    #[test]
    fn test_null_handling() {
        let none_a: Option<i32> = None;
        let none_b: Option<i32> = None;
        assert!(is_equal(&none_a, &none_b));

        let some: Option<i32> = Some(4);
        let mut report = DiffReport::new();
        assert!(!compare(&some, &none_a, &mut report));
        assert_eq!(report.len(), 1);
        assert_eq!(report.differences[0].kind, DiffKind::Missing);

        report.clear();
        assert!(!compare(&none_a, &some, &mut report));
        assert_eq!(report.len(), 1);
        assert_eq!(report.differences[0].kind, DiffKind::Missing);
    }

    #[test]
    fn test_nested_member_path() {
        let actual = make_car();
        let mut expected = make_car();
        expected.engine.code = "B18".to_string();

        let mut report = DiffReport::new();
        assert!(!compare(&actual, &expected, &mut report));

        assert_eq!(report.len(), 1);
        assert_eq!(report.differences[0].value_path, "object.engine.code");
    }

    #[test]
    fn test_element_index_path_without_dot() {
        let actual = make_car();
        let mut expected = make_car();
        expected.plates[2] = "ZZ-9".to_string();

        let mut report = DiffReport::new();
        assert!(!compare(&actual, &expected, &mut report));

        assert_eq!(report.len(), 1);
        assert_eq!(report.differences[0].value_path, "object.plates[2]");
    }

    #[test]
    fn test_element_count_mismatch_is_single_difference() {
        let actual: Vec<i32> = vec![1, 2, 3];
        let expected: Vec<i32> = vec![1, 2, 3, 4, 5];

        let mut report = DiffReport::new();
        assert!(!compare(&actual, &expected, &mut report));

        assert_eq!(report.len(), 1);
        let diff = &report.differences[0];
        assert_eq!(diff.kind, DiffKind::Count);
        assert_eq!(diff.actual.as_deref(), Some("3"));
        assert_eq!(diff.expected.as_deref(), Some("5"));
    }

    #[test]
    fn test_no_early_exit_collects_every_difference() {
        let actual = make_car();
        let mut expected = make_car();
        expected.model = "K200".to_string();
        expected.engine.displacement = 2000;
        expected.plates[0] = "BB-1".to_string();

        let mut report = DiffReport::new();
        assert!(!compare(&actual, &expected, &mut report));

        assert_eq!(
            report.paths(),
            vec!["object.model", "object.engine.displacement", "object.plates[0]"]
        );
    }

    #[derive(Default)]
    struct WithSecret {
        shown: i32,
        secret: i32,
    }

    crate::structural!(WithSecret => |spec| {
        spec.field("shown", |w| &w.shown, |w| &mut w.shown);
        spec.field_excluded("secret", |w| &w.secret, |w| &mut w.secret);
        spec.default_constructor();
    });

    #[test]
    fn test_excluded_member_never_compared() {
        let actual = WithSecret { shown: 1, secret: 10 };
        let expected = WithSecret { shown: 1, secret: 99 };

        let mut report = DiffReport::new();
        assert!(compare(&actual, &expected, &mut report));
        assert!(report.is_match());
    }

    struct Flaky {
        stable: i32,
        broken: i32,
    }

    fn broken_member(_flaky: &Flaky) -> Result<&i32, AccessFault> {
        Err(AccessFault::new("backing store unavailable"))
    }

    crate::structural!(Flaky => |spec| {
        spec.field("stable", |f| &f.stable, |f| &mut f.stable);
        spec.computed("broken", broken_member);
        spec.constructor(|| Flaky { stable: 0, broken: 0 });
    });

    #[test]
    fn test_member_fault_skips_and_continues() {
        let actual = Flaky { stable: 1, broken: 7 };
        let expected = Flaky { stable: 2, broken: 7 };
        assert_eq!(actual.broken, expected.broken);

        let mut report = DiffReport::new();
        assert!(!compare(&actual, &expected, &mut report));

        // The faulting member is skipped, the stable one still diffs.
        assert_eq!(report.len(), 1);
        assert_eq!(report.differences[0].value_path, "object.stable");
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].value_path, "object.broken");
    }

    struct SelfRef {
        tag: i32,
    }

    fn me_member(this: &SelfRef) -> Result<&SelfRef, AccessFault> {
        Ok(this)
    }

    crate::structural!(SelfRef => |spec| {
        spec.field("tag", |s| &s.tag, |s| &mut s.tag);
        spec.computed("me", me_member);
        spec.constructor(|| SelfRef { tag: 0 });
    });

    #[test]
    fn test_parent_back_reference_is_skipped() {
        let actual = SelfRef { tag: 1 };
        let expected = SelfRef { tag: 1 };

        // Without the guard this recursion would never terminate.
        assert!(is_equal(&actual, &expected));

        let unequal = SelfRef { tag: 2 };
        let mut report = DiffReport::new();
        assert!(!compare(&actual, &unequal, &mut report));
        assert_eq!(report.paths(), vec!["object.tag"]);
    }

    /// A collection that is both Complex and Enumerable.
    #[derive(Default)]
    struct Playlist {
        title: String,
        tracks: Vec<String>,
    }

    impl Structural for Playlist {
        fn type_info(&self) -> &'static TypeInfo {
            crate::registry::descriptor_of::<Self>(|spec| {
                spec.field("title", |p| &p.title, |p| &mut p.title);
                spec.enumerable();
                spec.default_constructor();
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
            Some(
                self.tracks
                    .iter()
                    .map(|track| track as &dyn Structural)
                    .collect(),
            )
        }

        fn append_element(&mut self, element: Box<dyn Structural>) -> Result<(), crate::CopyError> {
            match element.into_any().downcast::<String>() {
                Ok(track) => {
                    self.tracks.push(*track);
                    Ok(())
                }
                Err(_) => Err(crate::CopyError::ValueMismatch { type_name: "String" }),
            }
        }

        fn clear_elements(&mut self) {
            self.tracks.clear();
        }
    }

    #[test]
    fn test_dual_facet_type_compares_members_and_elements() {
        let actual = Playlist {
            title: "road".to_string(),
            tracks: vec!["one".to_string(), "two".to_string()],
        };
        let expected = Playlist {
            title: "home".to_string(),
            tracks: vec!["one".to_string(), "different".to_string()],
        };

        let mut report = DiffReport::new();
        assert!(!compare(&actual, &expected, &mut report));

        assert_eq!(report.paths(), vec!["object.title", "object[1]"]);
    }

    #[derive(Clone, Debug, PartialEq, PartialOrd)]
    struct Ranked(f64);

    crate::simple_type_ordered!(Ranked);

    #[test]
    fn test_ordering_fallback_equality() {
        assert!(is_equal(&Ranked(1.0), &Ranked(1.0)));
        assert!(!is_equal(&Ranked(1.0), &Ranked(2.0)));

        // Incomparable pair: comparison failure reads as unequal, not fatal.
        let mut report = DiffReport::new();
        assert!(!compare(&Ranked(f64::NAN), &Ranked(f64::NAN), &mut report));
        assert_eq!(report.len(), 1);
        assert!(report.differences[0].reason.is_some());
    }

    struct Opaque {
        _hidden: i32,
    }

    crate::structural!(Opaque => |_spec| {});

    #[test]
    fn test_opaque_type_falls_back_to_identity() {
        let a = Opaque { _hidden: 1 };
        let b = Opaque { _hidden: 1 };

        assert!(is_equal(&a, &a));

        let mut report = DiffReport::new();
        assert!(!compare(&a, &b, &mut report));
        assert_eq!(report.len(), 1);
        assert!(report.differences[0].reason.is_some());
    }

    #[test]
    fn test_rooted_path() {
        let mut report = DiffReport::new();
        assert!(!compare_rooted(&1i32, &2i32, &mut report, "left"));
        assert_eq!(report.differences[0].value_path, "left");
    }

    #[test]
    fn test_option_members_unwrap_transparently() {
        #[derive(Default)]
        struct Holder {
            note: Option<String>,
        }

        crate::structural!(Holder { note });

        let actual = Holder {
            note: Some("a".to_string()),
        };
        let expected = Holder {
            note: Some("b".to_string()),
        };

        let mut report = DiffReport::new();
        assert!(!compare(&actual, &expected, &mut report));
        assert_eq!(report.paths(), vec!["object.note"]);

        let absent = Holder { note: None };
        report.clear();
        assert!(!compare(&actual, &absent, &mut report));
        assert_eq!(report.differences[0].kind, DiffKind::Missing);
    }
}
