//! # Native vs dpkg Ordering Agreement
//!
//! Checks the native comparator against `dpkg --compare-versions` on a
//! fixed vector set. When `dpkg` is not installed the live comparison is
//! skipped and only the expected orderings are asserted.

use std::cmp::Ordering;
use std::process::Command;

use retire_core::{compare_versions, DpkgComparator, VersionComparator};

/// (a, b, expected ordering of a relative to b)
const VECTORS: &[(&str, &str, Ordering)] = &[
    ("1.0", "2.0", Ordering::Less),
    ("1.10", "1.9", Ordering::Greater),
    ("1.0~rc1", "1.0", Ordering::Less),
    ("1.0", "1.0.0", Ordering::Less),
    ("1:0.1", "9.9", Ordering::Greater),
    ("2.30-1", "2.30-1", Ordering::Equal),
    ("5.2.15-1", "5.2.15-10", Ordering::Less),
    ("1.0a", "1.0", Ordering::Greater),
    ("1.0+dfsg", "1.0", Ordering::Greater),
    ("0.9~beta2", "0.9~beta10", Ordering::Less),
];

fn dpkg_available() -> bool {
    Command::new("dpkg")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[test]
fn native_matches_expected_vectors() {
    for (a, b, expected) in VECTORS {
        assert_eq!(compare_versions(a, b), *expected, "{a} vs {b}");
    }
}

#[test]
fn native_matches_dpkg_when_installed() {
    if !dpkg_available() {
        eprintln!("dpkg not installed; skipping live comparison");
        return;
    }
    let dpkg = DpkgComparator::new();
    for (a, b, _) in VECTORS {
        assert_eq!(
            compare_versions(a, b),
            dpkg.compare(a, b),
            "native and dpkg disagree on {a} vs {b}"
        );
    }
}
