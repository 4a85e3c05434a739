//! # Obsolescence Selection
//!
//! Parsed items are grouped by package name and architecture, so each
//! architecture keeps its own newest build even when another architecture
//! has moved ahead. The newest version in each group stays `Current`, the
//! rest become `Obsolete`. When two distinct
//! items carry equal versions, the one whose identifier sorts first is
//! kept, so the outcome never depends on input order.
//!
//! Items whose identifier could not be parsed are always `Obsolete`; they
//! take no part in any group.
//!
//! A live listing overrides both rules: a file the live index still
//! serves is `Current`.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use retire_core::{ItemState, PackageItem, RetireError, VersionComparator};

use crate::context::LiveSet;

/// Counts and diagnostics from one selection pass.
#[derive(Debug, Default)]
pub struct Selection {
    /// Items kept in the repository.
    pub current: usize,
    /// Items marked for retirement.
    pub obsolete: usize,
    /// Obsolete-by-version items kept because they are still live.
    pub still_live: usize,
    /// One `MalformedName` per unparsable identifier.
    pub malformed: Vec<RetireError>,
}

/// Index of the newest member of `group`; ties go to the smallest identifier.
fn newest(items: &[PackageItem], group: &[usize], cmp: &dyn VersionComparator) -> usize {
    let mut best = group[0];
    for &candidate in &group[1..] {
        let (a, b) = (&items[candidate], &items[best]);
        let ord = match (a.version(), b.version()) {
            (Some(va), Some(vb)) => cmp.compare(va, vb),
            _ => Ordering::Equal,
        };
        if ord == Ordering::Greater
            || (ord == Ordering::Equal && a.identifier() < b.identifier())
        {
            best = candidate;
        }
    }
    best
}

/// Classify every `Indexed` item as `Current` or `Obsolete`.
pub fn select(
    items: &mut [PackageItem],
    cmp: &dyn VersionComparator,
    live: Option<&LiveSet>,
) -> Result<Selection, RetireError> {
    let mut selection = Selection::default();
    let mut keep = vec![false; items.len()];

    let mut groups: BTreeMap<(&str, &str), Vec<usize>> = BTreeMap::new();
    for (i, item) in items.iter().enumerate() {
        if let Some(id) = item.package_id() {
            groups
                .entry((id.name.as_str(), id.architecture.as_str()))
                .or_default()
                .push(i);
        } else if let Some(err) = item.parse_error() {
            tracing::warn!(identifier = item.identifier(), "{err}");
            selection.malformed.push(err);
        }
    }
    for group in groups.values() {
        keep[newest(items, group, cmp)] = true;
    }

    for (item, keep) in items.iter_mut().zip(keep) {
        let still_live = !keep && live.is_some_and(|l| l.contains(item.identifier()));
        if keep || still_live {
            if still_live {
                tracing::info!(identifier = item.identifier(), "obsolete but still live, keeping");
                selection.still_live += 1;
            }
            item.transition(ItemState::Current)?;
            selection.current += 1;
        } else {
            item.transition(ItemState::Obsolete)?;
            selection.obsolete += 1;
        }
    }

    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use retire_core::NativeComparator;

    fn items(names: &[&str]) -> Vec<PackageItem> {
        names
            .iter()
            .map(|n| PackageItem::new(format!("/repo/main/{n}"), 10))
            .collect()
    }

    fn states(items: &[PackageItem]) -> Vec<(&str, ItemState)> {
        items.iter().map(|i| (i.identifier(), i.state())).collect()
    }

    #[test]
    fn newest_version_stays_current() {
        let mut v = items(&["A_1.0_amd64.pkg", "A_2.0_amd64.pkg", "B_1.0_amd64.pkg"]);
        let sel = select(&mut v, &NativeComparator, None).unwrap();
        assert_eq!(
            states(&v),
            [
                ("A_1.0_amd64.pkg", ItemState::Obsolete),
                ("A_2.0_amd64.pkg", ItemState::Current),
                ("B_1.0_amd64.pkg", ItemState::Current),
            ]
        );
        assert_eq!(sel.current, 2);
        assert_eq!(sel.obsolete, 1);
    }

    #[test]
    fn comparison_is_semantic_not_lexical() {
        let mut v = items(&["A_1.10_amd64.pkg", "A_1.9_amd64.pkg"]);
        select(&mut v, &NativeComparator, None).unwrap();
        assert_eq!(v[0].state(), ItemState::Current);
        assert_eq!(v[1].state(), ItemState::Obsolete);
    }

    #[test]
    fn equal_versions_keep_first_identifier_regardless_of_order() {
        for order in [
            ["A_1.0_amd64.pkg", "A_1.0_amd64.deb"],
            ["A_1.0_amd64.deb", "A_1.0_amd64.pkg"],
        ] {
            let mut v = items(&order);
            select(&mut v, &NativeComparator, None).unwrap();
            let current: Vec<_> = v
                .iter()
                .filter(|i| i.state() == ItemState::Current)
                .map(PackageItem::identifier)
                .collect();
            assert_eq!(current, ["A_1.0_amd64.deb"]);
        }
    }

    #[test]
    fn each_architecture_keeps_its_newest_build() {
        let mut v = items(&[
            "foo_1.5_amd64.deb",
            "foo_2.0_amd64.deb",
            "foo_1.0_arm64.deb",
            "foo_0.9_all.deb",
        ]);
        let sel = select(&mut v, &NativeComparator, None).unwrap();
        assert_eq!(
            states(&v),
            [
                ("foo_1.5_amd64.deb", ItemState::Obsolete),
                ("foo_2.0_amd64.deb", ItemState::Current),
                ("foo_1.0_arm64.deb", ItemState::Current),
                ("foo_0.9_all.deb", ItemState::Current),
            ]
        );
        assert_eq!(sel.obsolete, 1);
    }

    #[test]
    fn unparsable_items_are_always_obsolete() {
        let mut v = items(&["weirdname.pkg"]);
        let sel = select(&mut v, &NativeComparator, None).unwrap();
        assert_eq!(v[0].state(), ItemState::Obsolete);
        assert_eq!(sel.malformed.len(), 1);
        assert!(matches!(sel.malformed[0], RetireError::MalformedName { .. }));
    }

    #[test]
    fn unparsable_item_sharing_a_prefix_does_not_join_the_group() {
        let mut v = items(&["A_9.0.pkg", "A_1.0_amd64.pkg"]);
        select(&mut v, &NativeComparator, None).unwrap();
        assert_eq!(v[0].state(), ItemState::Obsolete);
        assert_eq!(v[1].state(), ItemState::Current);
    }

    #[test]
    fn live_items_are_protected() {
        let mut v = items(&["A_1.0_amd64.pkg", "A_2.0_amd64.pkg", "weirdname.pkg"]);
        let live = LiveSet::from_listing("pool/main/A_1.0_amd64.pkg\nweirdname.pkg\n");
        let sel = select(&mut v, &NativeComparator, Some(&live)).unwrap();
        assert!(v.iter().all(|i| i.state() == ItemState::Current));
        assert_eq!(sel.still_live, 2);
        assert_eq!(sel.obsolete, 0);
    }

    #[test]
    fn already_classified_items_are_rejected() {
        let mut v = items(&["A_1.0_amd64.pkg"]);
        select(&mut v, &NativeComparator, None).unwrap();
        assert!(matches!(
            select(&mut v, &NativeComparator, None),
            Err(RetireError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn exactly_one_current_per_name_and_architecture() {
        let mut v = items(&[
            "z_1.0~rc1_all.deb",
            "z_1.0_all.deb",
            "z_0.9_all.deb",
            "z_1:0.1_all.deb",
            "y_3_all.deb",
        ]);
        select(&mut v, &NativeComparator, None).unwrap();
        let z_current: Vec<_> = v
            .iter()
            .filter(|i| i.name() == "z" && i.state() == ItemState::Current)
            .map(PackageItem::identifier)
            .collect();
        assert_eq!(z_current, ["z_1:0.1_all.deb"]);
    }
}
