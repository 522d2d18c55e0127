//! Per-pass layout context.
//!
//! A [`LayoutContext`] lives for exactly one layout pass over a [`Document`]:
//!
//! ```text
//!   LayoutContext::new(doc)      Constructed -> Active   (style snapshot taken)
//!       │
//!       ├── spatium() / style() / font() / staff()        (StyleResolver)
//!       ├── mark_dirty(..)                                 (region + document)
//!       ├── register_spanner(..)                           (deferred geometry)
//!       ▼
//!   finish() or drop             Active -> Finalized
//!       1. settle every registered spanner, in registration order
//!       2. notify every viewer of the document
//! ```
//!
//! Finalization runs exactly once on every exit path: explicit
//! [`finish`](LayoutContext::finish), normal scope end, early `?` return, or
//! unwinding out of the layout driver.

use crate::foundation::core::{ElementId, Fraction, StaffIdx};
use crate::layout::dirty::{DirtyRegion, DirtyRegionTracker};
use crate::layout::spanners::{SegmentFinalizer, SpanGeometryRegistry, SpannerFinalizer};
use crate::score::document::Document;
use crate::score::model::{Spanner, Staff};
use crate::style::model::{FontHandle, Style, default_style};
use crate::style::snapshot::StyleSnapshot;

/// Read-only style and staff queries available during a pass.
pub trait StyleResolver {
    /// Staff space.
    fn spatium(&self) -> f64;
    /// Effective style.
    fn style(&self) -> &Style;
    /// Engraving font, absent without a document.
    fn font(&self) -> Option<FontHandle>;
    /// Staff at `idx`, absent without a document or when out of range.
    fn staff(&self, idx: StaffIdx) -> Option<&Staff>;
}

/// Lifecycle of a [`LayoutContext`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassState {
    /// Being built; the style snapshot is not taken yet.
    Constructed,
    /// Open for queries, dirty marks and spanner registration.
    Active,
    /// Spanners settled and viewers notified.
    Finalized,
}

/// Outcome of a finalized pass.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct PassReport {
    /// Spanners handed to the finalizer.
    pub spanners_finalized: usize,
    /// Viewers told about the layout change.
    pub viewers_notified: usize,
    /// Region marked during the pass and not taken by the driver.
    pub dirty: Option<DirtyRegion>,
}

/// Context object for one layout pass.
///
/// Holds the document by shared reference: the document cannot be mutated
/// through `&mut` while a pass is running, and the document's pass claim
/// rejects a second concurrent context on it.
pub struct LayoutContext<'a> {
    score: Option<&'a dyn Document>,
    snapshot: StyleSnapshot,
    processed_spanners: SpanGeometryRegistry<'a>,
    dirty: DirtyRegionTracker,
    finalizer: Box<dyn SpannerFinalizer + 'a>,
    state: PassState,
}

impl<'a> LayoutContext<'a> {
    /// Start a pass with the default [`SegmentFinalizer`].
    ///
    /// # Panics
    ///
    /// Panics when `score` already has a pass in progress.
    pub fn new(score: Option<&'a dyn Document>) -> Self {
        Self::with_finalizer(score, SegmentFinalizer)
    }

    /// Start a pass whose spanners are finalized by `finalizer`.
    ///
    /// # Panics
    ///
    /// Panics when `score` already has a pass in progress.
    #[tracing::instrument(skip(score, finalizer), fields(headless = score.is_none()))]
    pub fn with_finalizer(
        score: Option<&'a dyn Document>,
        finalizer: impl SpannerFinalizer + 'a,
    ) -> Self {
        let mut ctx = Self {
            score,
            snapshot: StyleSnapshot::capture(None),
            processed_spanners: SpanGeometryRegistry::new(),
            dirty: DirtyRegionTracker::new(),
            finalizer: Box::new(finalizer),
            state: PassState::Constructed,
        };

        match score {
            Some(doc) => {
                // Claim before snapshotting so a rejected pass leaves no trace.
                if !doc.try_begin_pass() {
                    // Nothing to finalize; skip Drop.
                    ctx.state = PassState::Finalized;
                    panic!("layout pass started on a document that already has one in progress");
                }
                ctx.snapshot = StyleSnapshot::capture(Some(doc));
            }
            None => {
                tracing::warn!("layout context created without a document; using default style");
            }
        }

        ctx.state = PassState::Active;
        tracing::debug!(
            spatium = ctx.snapshot.spatium,
            first_system_indent = ctx.snapshot.first_system_indent,
            "layout pass started"
        );
        ctx
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PassState {
        self.state
    }

    /// Bound document, if any.
    pub fn document(&self) -> Option<&'a dyn Document> {
        self.score
    }

    /// Style scalars captured at pass start.
    pub fn snapshot(&self) -> &StyleSnapshot {
        &self.snapshot
    }

    /// Whether the first system is indented, as of pass start.
    pub fn first_system_indent(&self) -> bool {
        self.snapshot.first_system_indent
    }

    /// Record that `[tick1, tick2] x [staff1, staff2]` needs re-layout.
    ///
    /// The request grows this pass's region and is forwarded to the document.
    /// `cause` is advisory.
    ///
    /// # Panics
    ///
    /// Panics when `tick1 > tick2` or `staff1 > staff2`.
    pub fn mark_dirty(
        &mut self,
        tick1: Fraction,
        tick2: Fraction,
        staff1: StaffIdx,
        staff2: StaffIdx,
        cause: Option<ElementId>,
    ) {
        self.assert_active();
        let region = DirtyRegion::new(tick1, tick2, staff1, staff2);
        tracing::trace!(
            tick1 = %tick1,
            tick2 = %tick2,
            staff1 = staff1.0,
            staff2 = staff2.0,
            cause = ?cause.map(|e| e.0),
            "mark dirty"
        );
        self.dirty.mark(region, cause);
        if let Some(doc) = self.score {
            doc.mark_dirty(region, cause);
        }
    }

    /// Region marked during this pass so far.
    pub fn dirty_region(&self) -> Option<DirtyRegion> {
        self.dirty.region()
    }

    /// Hand the marked region to the layout driver and clear it.
    pub fn take_dirty_region(&mut self) -> Option<DirtyRegion> {
        self.dirty.take()
    }

    /// Defer `spanner`'s geometry to pass finalization.
    ///
    /// Returns `false` if it was already registered in this pass.
    pub fn register_spanner(&mut self, spanner: &'a Spanner) -> bool {
        self.assert_active();
        self.processed_spanners.register(spanner)
    }

    /// Number of spanners waiting for finalization.
    pub fn processed_spanner_count(&self) -> usize {
        self.processed_spanners.len()
    }

    /// Finalize now and report what was done.
    pub fn finish(mut self) -> PassReport {
        self.finalize()
        // Drop sees `Finalized` and does nothing.
    }

    fn assert_active(&self) {
        assert_eq!(
            self.state,
            PassState::Active,
            "layout context used outside of an active pass"
        );
    }

    fn finalize(&mut self) -> PassReport {
        debug_assert_eq!(self.state, PassState::Active);
        self.state = PassState::Finalized;

        let spanners = self.processed_spanners.drain();
        for s in &spanners {
            self.finalizer.layout_systems_done(s);
        }

        let mut viewers_notified = 0;
        if let Some(doc) = self.score {
            for v in doc.viewers() {
                v.layout_changed();
                viewers_notified += 1;
            }
            doc.end_pass();
        }

        tracing::debug!(
            spanners = spanners.len(),
            viewers = viewers_notified,
            "layout pass finalized"
        );

        PassReport {
            spanners_finalized: spanners.len(),
            viewers_notified,
            dirty: self.dirty.region(),
        }
    }
}

impl Drop for LayoutContext<'_> {
    fn drop(&mut self) {
        if self.state == PassState::Active {
            self.finalize();
        }
    }
}

impl StyleResolver for LayoutContext<'_> {
    fn spatium(&self) -> f64 {
        match self.score {
            Some(doc) => doc.spatium(),
            None => default_style().spatium(),
        }
    }

    fn style(&self) -> &Style {
        match self.score {
            Some(doc) => doc.style(),
            None => default_style(),
        }
    }

    fn font(&self) -> Option<FontHandle> {
        self.score.and_then(|doc| doc.engraving_font())
    }

    fn staff(&self, idx: StaffIdx) -> Option<&Staff> {
        self.score.and_then(|doc| doc.staff(idx))
    }
}

impl std::fmt::Debug for LayoutContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutContext")
            .field("headless", &self.score.is_none())
            .field("state", &self.state)
            .field("snapshot", &self.snapshot)
            .field("processed_spanners", &self.processed_spanners.len())
            .field("dirty", &self.dirty.region())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/context.rs"]
mod tests;
