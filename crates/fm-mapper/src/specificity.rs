//! Ordering of dispatch candidates from most to least derived source type.

use crate::descriptor::MappingHandle;
use fm_core::{TypeLookup, TypeRef};
use std::cmp::Reverse;

/// A `(source, target)` pair competing for one runtime-dispatched entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchCandidate {
    pub source: TypeRef,
    pub target: TypeRef,
    pub handle: MappingHandle,
    pub name: String,
    pub declaration_order: usize,
}

/// Sorts candidates by descending depth of their source type, keeping
/// declaration order among equal depths.
///
/// A strict subtype is always deeper than its ancestors, so the first arm
/// whose source type matches a runtime value is also the most specific one.
/// Unrelated types at the same depth keep their declaration order.
pub fn order_by_specificity(
    lookup: &dyn TypeLookup,
    mut candidates: Vec<DispatchCandidate>,
) -> Vec<DispatchCandidate> {
    candidates.sort_by_key(|candidate| {
        (
            Reverse(lookup.depth(candidate.source.id)),
            candidate.declaration_order,
        )
    });
    candidates
}
