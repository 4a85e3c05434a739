//! # Volume Packing
//!
//! Greedy, single pass, no backtracking. Items are visited in placement
//! order (origin group, name, version, identifier) and appended to the
//! open volume while
//!
//! ```text
//! used_bytes + item_size < capacity_bytes
//! ```
//!
//! holds. The inequality is strict: a volume never reaches its capacity
//! exactly. When an item does not fit, the open volume is sealed and the
//! item is retried against a fresh one. An item that cannot fit an empty
//! volume is rejected with `ItemTooLarge` and packing continues.
//!
//! Packing only produces a [`PackPlan`]; the [`Mover`](crate::mover::Mover)
//! materializes it. Volume ids grow monotonically from the packer's first
//! id and a sealed volume is never reopened.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use retire_core::{PackageItem, RetireError, VersionComparator};

/// Directory-name prefix of a volume: `volume0`, `volume1`, ...
pub const VOLUME_PREFIX: &str = "volume";

/// Directory name for volume `id`.
pub fn volume_dir_name(id: u32) -> String {
    format!("{VOLUME_PREFIX}{id}")
}

/// Volume id encoded in a directory name, if it is one.
pub fn parse_volume_id(name: &str) -> Option<u32> {
    let digits = name.strip_prefix(VOLUME_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Placement order: origin group, name, version, identifier.
///
/// Unparsable items order by their raw identifier as name and sort before
/// any parsed version of the same name.
pub fn placement_order(a: &PackageItem, b: &PackageItem, cmp: &dyn VersionComparator) -> Ordering {
    a.origin_group()
        .cmp(b.origin_group())
        .then_with(|| a.name().cmp(b.name()))
        .then_with(|| match (a.version(), b.version()) {
            (Some(va), Some(vb)) => cmp.compare(va, vb),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.identifier().cmp(b.identifier()))
}

/// A capacity-bounded group of items.
#[derive(Debug)]
pub struct Volume {
    id: u32,
    capacity_bytes: u64,
    used_bytes: u64,
    members: Vec<PackageItem>,
}

impl Volume {
    fn new(id: u32, capacity_bytes: u64) -> Self {
        Self {
            id,
            capacity_bytes,
            used_bytes: 0,
            members: Vec::new(),
        }
    }

    /// Whether an item of `size` bytes can still be added.
    pub fn fits(&self, size: u64) -> bool {
        self.used_bytes
            .checked_add(size)
            .is_some_and(|total| total < self.capacity_bytes)
    }

    fn push(&mut self, item: PackageItem) {
        self.used_bytes += item.size();
        self.members.push(item);
    }

    /// Volume id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Directory name under the archive root.
    pub fn dir_name(&self) -> String {
        volume_dir_name(self.id)
    }

    /// Capacity in bytes.
    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes
    }

    /// Sum of member sizes.
    pub fn used_bytes(&self) -> u64 {
        self.used_bytes
    }

    /// Members in placement order.
    pub fn members(&self) -> &[PackageItem] {
        &self.members
    }

    /// Take ownership of the members.
    pub fn into_members(self) -> Vec<PackageItem> {
        self.members
    }
}

/// Output of a packing pass.
#[derive(Debug, Default)]
pub struct PackPlan {
    /// Sealed volumes in id order. None is empty.
    pub volumes: Vec<Volume>,
    /// Items that cannot fit any volume, with their `ItemTooLarge` error.
    pub rejected: Vec<(PackageItem, RetireError)>,
    /// Every origin group present in the input; each volume provisions
    /// one subdirectory per group.
    pub origin_groups: BTreeSet<String>,
}

/// Greedy sequential packer.
#[derive(Debug)]
pub struct BinPacker<'a> {
    capacity_bytes: u64,
    first_id: u32,
    comparator: &'a dyn VersionComparator,
}

impl<'a> BinPacker<'a> {
    /// Pack into volumes of `capacity_bytes`, numbering from `first_id`.
    pub fn new(capacity_bytes: u64, first_id: u32, comparator: &'a dyn VersionComparator) -> Self {
        Self {
            capacity_bytes,
            first_id,
            comparator,
        }
    }

    /// Plan the placement of `items`.
    pub fn plan(&self, mut items: Vec<PackageItem>) -> PackPlan {
        let mut plan = PackPlan {
            origin_groups: items
                .iter()
                .map(|i| i.origin_group().to_string())
                .collect(),
            ..PackPlan::default()
        };
        items.sort_by(|a, b| placement_order(a, b, self.comparator));

        let mut next_id = self.first_id;
        let mut open: Option<Volume> = None;

        for item in items {
            if item.size() >= self.capacity_bytes {
                tracing::warn!(
                    identifier = item.identifier(),
                    size = item.size(),
                    capacity = self.capacity_bytes,
                    "item cannot fit an empty volume"
                );
                let err = RetireError::ItemTooLarge {
                    identifier: item.identifier().to_string(),
                    size: item.size(),
                    capacity: self.capacity_bytes,
                };
                plan.rejected.push((item, err));
                continue;
            }

            if let Some(volume) = open.take_if(|v| !v.fits(item.size())) {
                tracing::debug!(
                    volume = volume.id(),
                    used = volume.used_bytes(),
                    members = volume.members().len(),
                    "sealing volume"
                );
                plan.volumes.push(volume);
            }
            let volume = open.get_or_insert_with(|| {
                let v = Volume::new(next_id, self.capacity_bytes);
                next_id += 1;
                v
            });
            volume.push(item);
        }

        if let Some(volume) = open {
            plan.volumes.push(volume);
        }
        plan
    }
}
