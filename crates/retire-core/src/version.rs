//! # Version Ordering
//!
//! Versions are ordered semantically, never lexically:
//!
//! 1. An optional `epoch:` prefix is compared first as an integer
//!    (absent epoch is `0`).
//! 2. The remainder is split into alternating non-digit and digit runs.
//!    Digit runs compare as integers of any length. Non-digit runs compare
//!    character by character where `~` sorts before everything (including
//!    the end of the run), letters sort before all other characters.
//! 3. A shorter run list is padded with empty runs, so a missing numeric
//!    run counts as `0` and a missing `~rc1` marker sorts *above* its
//!    presence: `1.0~rc1 < 1.0 < 1.0a < 1.0.0`.
//!
//! [`NativeComparator`] implements these rules and is the default.
//! [`DpkgComparator`] delegates to `dpkg --compare-versions` and exists
//! for cross-checking against the reference tool.

use std::cmp::Ordering;
use std::path::PathBuf;
use std::process::Command;

/// Orders two version strings.
pub trait VersionComparator: std::fmt::Debug + Send + Sync {
    /// Compare `a` against `b`.
    fn compare(&self, a: &str, b: &str) -> Ordering;
}

/// The built-in comparator implementing the ordering rules above.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeComparator;

impl VersionComparator for NativeComparator {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        compare_versions(a, b)
    }
}

/// Compare two version strings with the native ordering rules.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let (epoch_a, rest_a) = split_epoch(a);
    let (epoch_b, rest_b) = split_epoch(b);
    compare_numeric(epoch_a, epoch_b).then_with(|| compare_runs(rest_a, rest_b))
}

/// Split `N:rest` into its epoch digits and remainder.
fn split_epoch(v: &str) -> (&str, &str) {
    match v.split_once(':') {
        Some((epoch, rest)) if !epoch.is_empty() && epoch.bytes().all(|c| c.is_ascii_digit()) => {
            (epoch, rest)
        }
        _ => ("", v),
    }
}

fn compare_runs(a: &str, b: &str) -> Ordering {
    let mut a = a.as_bytes();
    let mut b = b.as_bytes();

    while !a.is_empty() || !b.is_empty() {
        let (text_a, rest_a) = split_run(a, |c| !c.is_ascii_digit());
        let (text_b, rest_b) = split_run(b, |c| !c.is_ascii_digit());
        match compare_text(text_a, text_b) {
            Ordering::Equal => {}
            other => return other,
        }

        let (num_a, rest_a) = split_run(rest_a, |c| c.is_ascii_digit());
        let (num_b, rest_b) = split_run(rest_b, |c| c.is_ascii_digit());
        let num_a = std::str::from_utf8(num_a).unwrap_or_default();
        let num_b = std::str::from_utf8(num_b).unwrap_or_default();
        match compare_numeric(num_a, num_b) {
            Ordering::Equal => {}
            other => return other,
        }

        a = rest_a;
        b = rest_b;
    }

    Ordering::Equal
}

fn split_run(s: &[u8], pred: impl Fn(u8) -> bool) -> (&[u8], &[u8]) {
    let end = s.iter().position(|&c| !pred(c)).unwrap_or(s.len());
    s.split_at(end)
}

/// Weight of one character inside a non-digit run; `None` is end-of-run.
fn weight(c: Option<u8>) -> i32 {
    match c {
        None => 0,
        Some(b'~') => -1,
        Some(c) if c.is_ascii_alphabetic() => i32::from(c),
        Some(c) => i32::from(c) + 256,
    }
}

fn compare_text(a: &[u8], b: &[u8]) -> Ordering {
    let len = a.len().max(b.len());
    for i in 0..len {
        let wa = weight(a.get(i).copied());
        let wb = weight(b.get(i).copied());
        if wa != wb {
            return wa.cmp(&wb);
        }
    }
    Ordering::Equal
}

/// Compare two digit strings as integers without parsing them, so runs
/// longer than `u64` still order correctly. An empty run is zero.
fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Comparator backed by `dpkg --compare-versions`.
///
/// If `dpkg` cannot be spawned the native ordering is used and a warning
/// is logged, so a missing tool never aborts a run.
#[derive(Debug, Clone)]
pub struct DpkgComparator {
    program: PathBuf,
}

impl DpkgComparator {
    /// Use the `dpkg` found on `PATH`.
    pub fn new() -> Self {
        Self::with_program("dpkg")
    }

    /// Use a specific `dpkg` executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn holds(&self, a: &str, op: &str, b: &str) -> std::io::Result<bool> {
        let status = Command::new(&self.program)
            .arg("--compare-versions")
            .arg(a)
            .arg(op)
            .arg(b)
            .status()?;
        Ok(status.success())
    }
}

impl Default for DpkgComparator {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionComparator for DpkgComparator {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        let outcome = self.holds(a, "lt", b).and_then(|lt| {
            if lt {
                Ok(Ordering::Less)
            } else if self.holds(a, "gt", b)? {
                Ok(Ordering::Greater)
            } else {
                Ok(Ordering::Equal)
            }
        });
        outcome.unwrap_or_else(|e| {
            tracing::warn!(
                program = %self.program.display(),
                "dpkg comparison failed, using native ordering: {e}"
            );
            compare_versions(a, b)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lt(a: &str, b: &str) {
        assert_eq!(compare_versions(a, b), Ordering::Less, "{a} < {b}");
        assert_eq!(compare_versions(b, a), Ordering::Greater, "{b} > {a}");
    }

    #[test]
    fn numeric_runs_compare_as_integers() {
        lt("1.9", "1.10");
        lt("2", "10");
        lt("1.0.9", "1.0.10");
    }

    #[test]
    fn leading_zeros_are_insignificant() {
        assert_eq!(compare_versions("1.01", "1.1"), Ordering::Equal);
        assert_eq!(compare_versions("007", "7"), Ordering::Equal);
    }

    #[test]
    fn shorter_list_is_padded() {
        lt("1.0", "1.0.1");
        lt("1", "1.0");
        assert_eq!(compare_versions("1.0", "1.0"), Ordering::Equal);
    }

    #[test]
    fn tilde_sorts_below_absence() {
        lt("1.0~rc1", "1.0");
        lt("1.0~~", "1.0~");
        lt("1.0~alpha", "1.0~beta");
    }

    #[test]
    fn letters_sort_before_other_characters() {
        lt("1.0a", "1.0+");
        lt("1.0", "1.0a");
    }

    #[test]
    fn epoch_dominates() {
        lt("9.9", "1:0.1");
        lt("1:2.0", "2:1.0");
        assert_eq!(compare_versions("0:1.0", "1.0"), Ordering::Equal);
    }

    #[test]
    fn non_numeric_epoch_is_not_an_epoch() {
        // `a:` is not an epoch, so the colon is ordinary text.
        assert_eq!(split_epoch("a:1"), ("", "a:1"));
    }

    #[test]
    fn debian_revisions() {
        lt("5.2.15-1", "5.2.15-2");
        lt("5.2.15-9", "5.2.15-10");
        lt("1.0-1", "1.0.1");
    }

    #[test]
    fn huge_numeric_runs_do_not_overflow() {
        lt("1.99999999999999999999998", "1.99999999999999999999999");
    }

    #[test]
    fn native_comparator_delegates() {
        assert_eq!(NativeComparator.compare("1.0", "2.0"), Ordering::Less);
    }

    #[test]
    fn dpkg_comparator_falls_back_when_missing() {
        let cmp = DpkgComparator::with_program("/nonexistent/dpkg-for-tests");
        assert_eq!(cmp.compare("1.0", "2.0"), Ordering::Less);
        assert_eq!(cmp.compare("2.0", "1.0"), Ordering::Greater);
    }

    proptest! {
        #[test]
        fn reflexive(v in "[0-9a-z.~+-]{0,12}") {
            prop_assert_eq!(compare_versions(&v, &v), Ordering::Equal);
        }

        #[test]
        fn antisymmetric(a in "[0-9a-z.~+:-]{0,10}", b in "[0-9a-z.~+:-]{0,10}") {
            prop_assert_eq!(compare_versions(&a, &b), compare_versions(&b, &a).reverse());
        }

        #[test]
        fn integers_order_numerically(x in 0u64..1_000_000, y in 0u64..1_000_000) {
            prop_assert_eq!(compare_versions(&x.to_string(), &y.to_string()), x.cmp(&y));
        }
    }
}
