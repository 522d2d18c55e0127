use super::*;

fn slur(tick: i32, tick2: i32) -> Spanner {
    Spanner::new(
        SpannerId(1),
        SpannerKind::Slur,
        Fraction::whole(tick),
        Fraction::whole(tick2),
        StaffIdx(0),
    )
    .unwrap()
}

fn rect(x: f64) -> Rect {
    Rect::new(x, 0.0, x + 10.0, 5.0)
}

#[test]
fn inverted_ticks_are_rejected() {
    let err = Spanner::new(
        SpannerId(9),
        SpannerKind::Tie,
        Fraction::whole(2),
        Fraction::whole(1),
        StaffIdx(0),
    )
    .unwrap_err();
    assert!(matches!(err, LayoutError::Validation(_)));
}

#[test]
fn end_staff_must_not_be_above_start() {
    let s = Spanner::new(
        SpannerId(1),
        SpannerKind::Volta,
        Fraction::ZERO,
        Fraction::whole(1),
        StaffIdx(2),
    )
    .unwrap();
    assert!(s.with_end_staff(StaffIdx(1)).is_err());
}

#[test]
fn layout_system_reuses_existing_segment() {
    let s = slur(0, 4);
    s.layout_system(SystemIdx(0), rect(0.0));
    s.layout_system(SystemIdx(0), rect(3.0));
    assert_eq!(s.segments().len(), 1);
    assert_eq!(s.segments()[0].bbox, rect(3.0));
}

#[test]
fn settle_assigns_run_positions_in_system_order() {
    let s = slur(0, 8);
    s.layout_system(SystemIdx(2), rect(0.0));
    s.layout_system(SystemIdx(0), rect(0.0));
    s.layout_system(SystemIdx(1), rect(0.0));
    assert_eq!(s.settle_segments(), 0);

    let kinds: Vec<_> = s.segments().iter().map(|seg| (seg.system, seg.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            (SystemIdx(0), SegmentKind::Begin),
            (SystemIdx(1), SegmentKind::Middle),
            (SystemIdx(2), SegmentKind::End),
        ]
    );
}

#[test]
fn settle_drops_segments_not_placed_this_pass() {
    let s = slur(0, 8);
    s.layout_system(SystemIdx(0), rect(0.0));
    s.layout_system(SystemIdx(1), rect(0.0));
    s.settle_segments();

    // Next pass fits the whole spanner on one system.
    s.layout_system(SystemIdx(0), rect(1.0));
    assert_eq!(s.settle_segments(), 1);
    assert_eq!(s.segments().len(), 1);
    assert_eq!(s.segments()[0].kind, SegmentKind::Single);
}

#[test]
fn staff_spatium_scales_with_mag() {
    let mut st = Staff::new(StaffIdx(0), "Flute");
    st.mag = 0.5;
    assert_eq!(st.spatium(20.0), 10.0);
}
