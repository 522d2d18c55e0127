use std::collections::HashSet;

use crate::score::model::Spanner;

/// Final geometry resolution for a spanner, run once per spanner per pass
/// after every system it touches has been placed.
pub trait SpannerFinalizer {
    /// All systems touching `spanner` are placed.
    fn layout_systems_done(&mut self, spanner: &Spanner);
}

impl<F: SpannerFinalizer + ?Sized> SpannerFinalizer for &mut F {
    fn layout_systems_done(&mut self, spanner: &Spanner) {
        (**self).layout_systems_done(spanner);
    }
}

/// Default finalizer: settles the spanner's per-system segments.
///
/// Segments not placed during the pass are dropped, the rest are ordered by
/// system and tagged `Single` / `Begin` / `Middle` / `End`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SegmentFinalizer;

impl SpannerFinalizer for SegmentFinalizer {
    fn layout_systems_done(&mut self, spanner: &Spanner) {
        let removed = spanner.settle_segments();
        if removed > 0 {
            tracing::trace!(
                spanner = spanner.id().0,
                removed,
                "dropped stale spanner segments"
            );
        }
    }
}

/// Spanners touched during one pass, in first-registration order.
///
/// Registration is keyed by object identity, not by [`SpannerId`](crate::SpannerId):
/// registering the same spanner again is a no-op, while two distinct spanners
/// that happen to share an id are both kept.
#[derive(Debug, Default)]
pub struct SpanGeometryRegistry<'a> {
    order: Vec<&'a Spanner>,
    // Addresses of the borrowed spanners; valid for as long as `order` holds them.
    seen: HashSet<*const Spanner>,
}

impl<'a> SpanGeometryRegistry<'a> {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `spanner`. Returns `false` when it was already registered.
    pub fn register(&mut self, spanner: &'a Spanner) -> bool {
        if !self.seen.insert(std::ptr::from_ref(spanner)) {
            return false;
        }
        self.order.push(spanner);
        true
    }

    /// Return `true` when `spanner` has been registered since the last drain.
    pub fn contains(&self, spanner: &Spanner) -> bool {
        self.seen.contains(&std::ptr::from_ref(spanner))
    }

    /// Number of registered spanners.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Return `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Remove and return every registered spanner in registration order.
    pub fn drain(&mut self) -> Vec<&'a Spanner> {
        self.seen.clear();
        std::mem::take(&mut self.order)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/spanners.rs"]
mod tests;
