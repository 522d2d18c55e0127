//! Incremental, spanner-aware layout pass context for a paginated music notation engine.
//!
//! The placement algorithms themselves (breaking measures into systems and
//! systems into pages) live with the layout driver. This crate provides the
//! state every layout pass shares:
//!
//! 1. **Style**: a per-pass [`StyleSnapshot`] plus live reads through
//!    [`StyleResolver`], falling back to the process-wide [`default_style`]
//!    when no document is bound.
//! 2. **Invalidation**: [`DirtyRegionTracker`] accumulates the `(tick, staff)`
//!    rectangle a pass must redo; every request is mirrored into the
//!    [`Document`]'s own dirty state.
//! 3. **Deferred spanner geometry**: spanners touched by a pass are collected in
//!    a [`SpanGeometryRegistry`] and handed to a [`SpannerFinalizer`] once all
//!    systems are placed.
//! 4. **Notification**: on finalization every registered [`Viewer`] of the
//!    document is told that layout changed.
//!
//! [`LayoutContext`] ties these together and guarantees finalization runs
//! exactly once, whether the pass is finished explicitly, dropped, abandoned
//! through an early return, or unwound by a panic.
//!
//! The crate is single-threaded by construction (`Score` and `Spanner` use
//! interior mutability and are `!Sync`).
//!
//! # Example
//!
//! ```
//! use scorelayout::{Fraction, LayoutContext, Score, StaffIdx, StyleResolver};
//!
//! let mut score = Score::default();
//! score.add_staff("Flute");
//!
//! let mut ctx = LayoutContext::new(Some(&score));
//! assert!(ctx.spatium() > 0.0);
//! ctx.mark_dirty(Fraction::ZERO, Fraction::whole(1), StaffIdx(0), StaffIdx(0), None);
//! let report = ctx.finish();
//! assert!(report.dirty.is_some());
//! ```
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;
mod layout;
mod score;
mod style;

pub use foundation::core::{
    DIVISION, ElementId, Fraction, Point, Rect, SpannerId, StaffIdx, SystemIdx,
};
pub use foundation::error::{LayoutError, LayoutResult};
pub use layout::context::{LayoutContext, PassReport, PassState, StyleResolver};
pub use layout::dirty::{DirtyRegion, DirtyRegionTracker};
pub use layout::spanners::{SegmentFinalizer, SpanGeometryRegistry, SpannerFinalizer};
pub use score::document::{Document, PendingLayout, Score, Viewer};
pub use score::model::{SegmentKind, Spanner, SpannerKind, SpannerSegment, Staff};
pub use style::config::StyleOverrides;
pub use style::model::{
    DEFAULT_SPATIUM, EngravingFont, FontHandle, Style, StyleId, StyleValue, default_style,
};
pub use style::snapshot::StyleSnapshot;
