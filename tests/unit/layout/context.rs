use std::cell::Cell;
use std::rc::Rc;

use super::*;
use crate::foundation::core::{Rect, SpannerId, SystemIdx};
use crate::foundation::error::LayoutResult;
use crate::score::document::{PendingLayout, Score, Viewer};
use crate::score::model::{SegmentKind, SpannerKind};
use crate::style::model::{DEFAULT_SPATIUM, StyleId, StyleValue};

#[derive(Default)]
struct CountingViewer {
    calls: Cell<usize>,
}

impl Viewer for CountingViewer {
    fn layout_changed(&self) {
        self.calls.set(self.calls.get() + 1);
    }
}

#[derive(Default)]
struct Recorder {
    seen: Vec<SpannerId>,
}

impl SpannerFinalizer for Recorder {
    fn layout_systems_done(&mut self, spanner: &Spanner) {
        self.seen.push(spanner.id());
    }
}

fn q(n: i32) -> Fraction {
    Fraction::new(n, 4).unwrap()
}

fn score_with_spanners(n: u64) -> Score {
    let mut score = Score::default();
    score.add_staff("Voice");
    score.add_staff("Piano");
    for id in 1..=n {
        let s = Spanner::new(SpannerId(id), SpannerKind::Slur, q(0), q(8), StaffIdx(0)).unwrap();
        score.add_spanner(s).unwrap();
    }
    score
}

#[test]
fn new_context_is_active_with_snapshot() {
    let score = score_with_spanners(0);
    let ctx = LayoutContext::new(Some(&score));
    assert_eq!(ctx.state(), PassState::Active);
    assert!(ctx.first_system_indent());
    assert_eq!(ctx.snapshot().spatium, DEFAULT_SPATIUM);
    assert!(score.is_pass_active());
    drop(ctx);
    assert!(!score.is_pass_active());
}

#[test]
fn headless_context_falls_back_to_defaults() {
    let ctx = LayoutContext::new(None);
    assert_eq!(ctx.spatium(), DEFAULT_SPATIUM);
    assert!(std::ptr::eq(ctx.style(), default_style()));
    assert!(ctx.font().is_none());
    assert!(ctx.staff(StaffIdx(0)).is_none());
    assert!(ctx.document().is_none());

    let report = ctx.finish();
    assert_eq!(report.viewers_notified, 0);
}

#[test]
fn resolver_reads_live_document_values() {
    let mut style = Style::default();
    style.set(StyleId::Spatium, StyleValue::Real(18.0)).unwrap();
    let mut score = Score::new(style);
    score.add_staff("Cello");

    let ctx = LayoutContext::new(Some(&score));
    assert_eq!(ctx.spatium(), 18.0);
    assert_eq!(ctx.font().unwrap().name, "Leland");
    assert_eq!(ctx.staff(StaffIdx(0)).unwrap().name, "Cello");
    assert!(ctx.staff(StaffIdx(1)).is_none());
}

#[test]
fn mark_dirty_accumulates_and_forwards() {
    let score = score_with_spanners(0);
    let mut ctx = LayoutContext::new(Some(&score));
    ctx.mark_dirty(q(4), q(8), StaffIdx(1), StaffIdx(1), Some(ElementId(3)));
    ctx.mark_dirty(q(0), q(2), StaffIdx(0), StaffIdx(0), None);

    let expected = DirtyRegion::new(q(0), q(8), StaffIdx(0), StaffIdx(1));
    assert_eq!(ctx.dirty_region(), Some(expected));
    assert_eq!(score.pending_layout(), PendingLayout::Region(expected));

    assert_eq!(ctx.take_dirty_region(), Some(expected));
    assert_eq!(ctx.dirty_region(), None);
    // The document keeps its own copy until it is consumed there.
    assert_eq!(score.pending_layout(), PendingLayout::Region(expected));
}

#[test]
#[should_panic(expected = "ticks inverted")]
fn mark_dirty_rejects_inverted_ticks() {
    let mut ctx = LayoutContext::new(None);
    ctx.mark_dirty(q(2), q(1), StaffIdx(0), StaffIdx(0), None);
}

#[test]
fn registration_is_idempotent_within_a_pass() {
    let score = score_with_spanners(2);
    let s1 = score.spanner(SpannerId(1)).unwrap();
    let s2 = score.spanner(SpannerId(2)).unwrap();
    let mut rec = Recorder::default();
    {
        let mut ctx = LayoutContext::with_finalizer(Some(&score), &mut rec);
        assert!(ctx.register_spanner(s2));
        assert!(ctx.register_spanner(s1));
        assert!(!ctx.register_spanner(s2));
        assert_eq!(ctx.processed_spanner_count(), 2);
    }
    assert_eq!(rec.seen, vec![SpannerId(2), SpannerId(1)]);
}

#[test]
fn finish_finalizes_exactly_once() {
    let mut score = score_with_spanners(3);
    let viewer = Rc::new(CountingViewer::default());
    score.register_viewer(viewer.clone());

    let mut rec = Recorder::default();
    let mut ctx = LayoutContext::with_finalizer(Some(&score), &mut rec);
    for s in score.spanners() {
        ctx.register_spanner(s);
    }
    ctx.mark_dirty(q(0), q(1), StaffIdx(0), StaffIdx(0), None);
    let report = ctx.finish();

    assert_eq!(report.spanners_finalized, 3);
    assert_eq!(report.viewers_notified, 1);
    assert_eq!(
        report.dirty,
        Some(DirtyRegion::new(q(0), q(1), StaffIdx(0), StaffIdx(0)))
    );
    assert_eq!(rec.seen.len(), 3);
    assert_eq!(viewer.calls.get(), 1);
}

#[test]
fn early_return_still_finalizes() {
    fn driver(score: &Score, rec: &mut Recorder) -> LayoutResult<()> {
        let mut ctx = LayoutContext::with_finalizer(Some(score), rec);
        if let Some(s) = score.spanner(SpannerId(1)) {
            ctx.register_spanner(s);
        }
        let _bad = Fraction::new(1, 0)?;
        Ok(())
    }

    let mut score = score_with_spanners(1);
    let viewer = Rc::new(CountingViewer::default());
    score.register_viewer(viewer.clone());
    let mut rec = Recorder::default();

    assert!(driver(&score, &mut rec).is_err());
    assert_eq!(rec.seen, vec![SpannerId(1)]);
    assert_eq!(viewer.calls.get(), 1);
    assert!(!score.is_pass_active());
}

#[test]
fn unwinding_driver_still_finalizes() {
    let mut score = score_with_spanners(1);
    let viewer = Rc::new(CountingViewer::default());
    score.register_viewer(viewer.clone());

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let mut ctx = LayoutContext::new(Some(&score));
        if let Some(s) = score.spanner(SpannerId(1)) {
            ctx.register_spanner(s);
        }
        panic!("driver bug");
    }));

    assert!(result.is_err());
    assert_eq!(viewer.calls.get(), 1);
    assert!(!score.is_pass_active());
}

#[test]
#[should_panic(expected = "already has one in progress")]
fn second_pass_on_same_document_panics() {
    let score = score_with_spanners(0);
    let _first = LayoutContext::new(Some(&score));
    let _second = LayoutContext::new(Some(&score));
}

#[test]
fn default_finalizer_settles_segments() {
    let score = score_with_spanners(1);
    let s = score.spanner(SpannerId(1)).unwrap();
    {
        let mut ctx = LayoutContext::new(Some(&score));
        s.layout_system(SystemIdx(0), Rect::new(10.0, 0.0, 200.0, 8.0));
        s.layout_system(SystemIdx(1), Rect::new(0.0, 100.0, 50.0, 108.0));
        ctx.register_spanner(s);
    }
    let kinds: Vec<_> = s.segments().iter().map(|seg| seg.kind).collect();
    assert_eq!(kinds, vec![SegmentKind::Begin, SegmentKind::End]);
}

#[test]
fn unregistered_spanner_is_not_finalized() {
    let score = score_with_spanners(2);
    let mut rec = Recorder::default();
    {
        let mut ctx = LayoutContext::with_finalizer(Some(&score), &mut rec);
        ctx.register_spanner(score.spanner(SpannerId(2)).unwrap());
    }
    assert_eq!(rec.seen, vec![SpannerId(2)]);
}

#[test]
fn headless_pass_finalizes_spanners_sharing_an_id() {
    let tie = Spanner::new(SpannerId(1), SpannerKind::Tie, q(0), q(1), StaffIdx(0)).unwrap();
    let slur = Spanner::new(SpannerId(1), SpannerKind::Slur, q(0), q(4), StaffIdx(0)).unwrap();
    let mut rec = Recorder::default();
    let report = {
        let mut ctx = LayoutContext::with_finalizer(None, &mut rec);
        assert!(ctx.register_spanner(&tie));
        assert!(ctx.register_spanner(&slur));
        ctx.finish()
    };
    assert_eq!(report.spanners_finalized, 2);
    assert_eq!(rec.seen, vec![SpannerId(1), SpannerId(1)]);
}

#[test]
fn snapshot_captures_font_only_with_a_document() {
    let score = score_with_spanners(0);
    let ctx = LayoutContext::new(Some(&score));
    assert_eq!(
        ctx.snapshot().font.as_ref().map(|f| f.name.as_str()),
        Some("Leland")
    );
    drop(ctx);

    let headless = LayoutContext::new(None);
    assert!(headless.snapshot().font.is_none());
}
