//! Dirty-region accumulation.
//!
//! A [`DirtyRegion`] is a closed rectangle in `(tick, staff)` space. Requests
//! only ever grow the tracked region: the union of two regions is their
//! bounding rectangle, so a pass may re-lay out more than strictly necessary
//! but never less.

use crate::foundation::core::{ElementId, Fraction, StaffIdx};

/// Closed `(tick, staff)` rectangle with `tick1 <= tick2` and `staff1 <= staff2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct DirtyRegion {
    tick1: Fraction,
    tick2: Fraction,
    staff1: StaffIdx,
    staff2: StaffIdx,
}

impl DirtyRegion {
    /// Create a region.
    ///
    /// # Panics
    ///
    /// Inverted bounds are a caller bug and panic.
    pub fn new(tick1: Fraction, tick2: Fraction, staff1: StaffIdx, staff2: StaffIdx) -> Self {
        assert!(
            tick1 <= tick2,
            "dirty region ticks inverted: {tick1} > {tick2}"
        );
        assert!(
            staff1 <= staff2,
            "dirty region staves inverted: {} > {}",
            staff1.0,
            staff2.0
        );
        Self {
            tick1,
            tick2,
            staff1,
            staff2,
        }
    }

    /// First tick.
    pub fn tick1(self) -> Fraction {
        self.tick1
    }

    /// Last tick.
    pub fn tick2(self) -> Fraction {
        self.tick2
    }

    /// First staff.
    pub fn staff1(self) -> StaffIdx {
        self.staff1
    }

    /// Last staff.
    pub fn staff2(self) -> StaffIdx {
        self.staff2
    }

    /// Bounding rectangle of `self` and `other`.
    pub fn union(self, other: DirtyRegion) -> DirtyRegion {
        DirtyRegion {
            tick1: self.tick1.min(other.tick1),
            tick2: self.tick2.max(other.tick2),
            staff1: self.staff1.min(other.staff1),
            staff2: self.staff2.max(other.staff2),
        }
    }

    /// Return `true` when `(tick, staff)` lies inside the region (bounds inclusive).
    pub fn contains(self, tick: Fraction, staff: StaffIdx) -> bool {
        self.tick1 <= tick && tick <= self.tick2 && self.staff1 <= staff && staff <= self.staff2
    }

    /// Return `true` when `other` lies entirely inside `self`.
    pub fn covers(self, other: DirtyRegion) -> bool {
        self.union(other) == self
    }
}

/// Accumulates the region a layout pass must redo.
#[derive(Debug, Default)]
pub struct DirtyRegionTracker {
    region: Option<DirtyRegion>,
    requests: usize,
    last_cause: Option<ElementId>,
}

impl DirtyRegionTracker {
    /// Empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grow the tracked region to include `region`.
    ///
    /// `cause` is kept for diagnostics only.
    pub fn mark(&mut self, region: DirtyRegion, cause: Option<ElementId>) {
        self.region = Some(match self.region {
            Some(r) => r.union(region),
            None => region,
        });
        self.requests += 1;
        if cause.is_some() {
            self.last_cause = cause;
        }
    }

    /// Current region, if anything was marked since the last [`take`](Self::take).
    pub fn region(&self) -> Option<DirtyRegion> {
        self.region
    }

    /// Consume the tracked region, leaving the tracker clean.
    pub fn take(&mut self) -> Option<DirtyRegion> {
        self.requests = 0;
        self.last_cause = None;
        self.region.take()
    }

    /// Return `true` when nothing is pending.
    pub fn is_clean(&self) -> bool {
        self.region.is_none()
    }

    /// Number of requests merged into the current region.
    pub fn requests(&self) -> usize {
        self.requests
    }

    /// Most recent element that caused a request, if any was given.
    pub fn last_cause(&self) -> Option<ElementId> {
        self.last_cause
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/dirty.rs"]
mod tests;
