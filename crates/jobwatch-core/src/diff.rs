//! New-listing detection against a saved baseline, plus display ordering.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::ListingRecord;

/// Resolvable identifiers of `items`; records without one are skipped.
pub fn identifier_set<'a, I>(items: I) -> HashSet<String>
where
    I: IntoIterator<Item = &'a ListingRecord>,
{
    items.into_iter().filter_map(ListingRecord::id).collect()
}

/// Identifiers present in `current` but absent from `previous`.
pub fn new_ids(previous: &[ListingRecord], current: &[ListingRecord]) -> HashSet<String> {
    let previous = identifier_set(previous);
    identifier_set(current)
        .into_iter()
        .filter(|id| !previous.contains(id))
        .collect()
}

/// Drop repeated identifiers, keeping the first occurrence.
///
/// Records without an identifier cannot be compared and are all kept.
pub fn dedup_by_id(items: Vec<ListingRecord>) -> Vec<ListingRecord> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| match item.id() {
            Some(id) => seen.insert(id),
            None => true,
        })
        .collect()
}

pub fn is_new(item: &ListingRecord, new_ids: &HashSet<String>) -> bool {
    item.id().is_some_and(|id| new_ids.contains(&id))
}

/// New listings first, then by case-insensitive title.
pub fn display_order(a: &ListingRecord, b: &ListingRecord, new_ids: &HashSet<String>) -> Ordering {
    let rank = |item: &ListingRecord| if is_new(item, new_ids) { 0u8 } else { 1u8 };
    rank(a)
        .cmp(&rank(b))
        .then_with(|| a.title().to_lowercase().cmp(&b.title().to_lowercase()))
}

pub fn sort_for_display(items: &mut [ListingRecord], new_ids: &HashSet<String>) {
    items.sort_by(|a, b| display_order(a, b, new_ids));
}
