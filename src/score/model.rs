use std::cell::{Ref, RefCell};

use crate::foundation::core::{Fraction, Rect, SpannerId, StaffIdx, SystemIdx};
use crate::foundation::error::{LayoutError, LayoutResult};

/// One staff of a score.
#[derive(Clone, Debug, PartialEq)]
pub struct Staff {
    /// Position of the staff in the score.
    pub idx: StaffIdx,
    /// Display name (instrument or part).
    pub name: String,
    /// Number of staff lines.
    pub lines: u8,
    /// Hidden staves still participate in dirty tracking.
    pub visible: bool,
    /// Magnification relative to the score spatium.
    pub mag: f64,
}

impl Staff {
    /// Visible five-line staff at normal size.
    pub fn new(idx: StaffIdx, name: impl Into<String>) -> Self {
        Self {
            idx,
            name: name.into(),
            lines: 5,
            visible: true,
            mag: 1.0,
        }
    }

    /// Staff space of this staff for a given score spatium.
    pub fn spatium(&self, score_spatium: f64) -> f64 {
        score_spatium * self.mag
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Spanner families that need deferred, cross-system geometry.
pub enum SpannerKind {
    /// Tie between two notes of equal pitch.
    Tie,
    /// Phrasing slur.
    Slur,
    /// Crescendo / diminuendo wedge.
    Hairpin,
    /// Octave transposition line.
    Ottava,
    /// Pedal marking line.
    Pedal,
    /// Volta (ending) bracket.
    Volta,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Position of a segment within its spanner's run of systems.
pub enum SegmentKind {
    /// Spanner starts and ends on this system.
    Single,
    /// First system of a multi-system spanner.
    Begin,
    /// Neither first nor last system.
    Middle,
    /// Last system of a multi-system spanner.
    End,
}

#[derive(Clone, Debug, PartialEq)]
/// Portion of a spanner drawn on one system.
pub struct SpannerSegment {
    /// System this segment belongs to.
    pub system: SystemIdx,
    /// Run position; settled during finalization.
    pub kind: SegmentKind,
    /// Bounding box in page coordinates.
    pub bbox: Rect,
    touched: bool,
}

/// A notation element spanning a tick range (and possibly several staves).
///
/// The segment list is interior-mutable: the layout driver and the
/// finalization hook update geometry while the owning score is only borrowed
/// for the duration of the pass.
#[derive(Debug)]
pub struct Spanner {
    id: SpannerId,
    kind: SpannerKind,
    tick: Fraction,
    tick2: Fraction,
    staff: StaffIdx,
    staff2: StaffIdx,
    segments: RefCell<Vec<SpannerSegment>>,
}

impl Spanner {
    /// Create a single-staff spanner covering `[tick, tick2]`.
    pub fn new(
        id: SpannerId,
        kind: SpannerKind,
        tick: Fraction,
        tick2: Fraction,
        staff: StaffIdx,
    ) -> LayoutResult<Self> {
        if tick > tick2 {
            return Err(LayoutError::validation(format!(
                "spanner {} ends ({tick2}) before it starts ({tick})",
                id.0
            )));
        }
        Ok(Self {
            id,
            kind,
            tick,
            tick2,
            staff,
            staff2: staff,
            segments: RefCell::new(Vec::new()),
        })
    }

    /// Extend the spanner down to `staff2` (cross-staff slurs, system-wide voltas).
    pub fn with_end_staff(mut self, staff2: StaffIdx) -> LayoutResult<Self> {
        if staff2 < self.staff {
            return Err(LayoutError::validation(format!(
                "spanner {} end staff {} is above start staff {}",
                self.id.0, staff2.0, self.staff.0
            )));
        }
        self.staff2 = staff2;
        Ok(self)
    }

    /// Spanner identity.
    pub fn id(&self) -> SpannerId {
        self.id
    }

    /// Spanner family.
    pub fn kind(&self) -> SpannerKind {
        self.kind
    }

    /// Start tick.
    pub fn tick(&self) -> Fraction {
        self.tick
    }

    /// End tick.
    pub fn tick2(&self) -> Fraction {
        self.tick2
    }

    /// First staff covered.
    pub fn staff(&self) -> StaffIdx {
        self.staff
    }

    /// Last staff covered.
    pub fn staff2(&self) -> StaffIdx {
        self.staff2
    }

    /// Place (part of) the spanner on `system`.
    ///
    /// Reuses the segment already attached to `system` from an earlier pass, so
    /// repeated layouts do not grow the segment list.
    pub fn layout_system(&self, system: SystemIdx, bbox: Rect) {
        let mut segments = self.segments.borrow_mut();
        match segments.iter_mut().find(|s| s.system == system) {
            Some(seg) => {
                seg.bbox = bbox;
                seg.touched = true;
            }
            None => segments.push(SpannerSegment {
                system,
                kind: SegmentKind::Single,
                bbox,
                touched: true,
            }),
        }
    }

    /// Current segments, in placement order until finalized and system order after.
    pub fn segments(&self) -> Ref<'_, [SpannerSegment]> {
        Ref::map(self.segments.borrow(), |v| v.as_slice())
    }

    /// Drop segments not placed since the last call, order the rest by system,
    /// assign run positions and reset the placement marks. Returns the number
    /// of segments removed.
    pub(crate) fn settle_segments(&self) -> usize {
        let mut segments = self.segments.borrow_mut();
        let before = segments.len();
        segments.retain(|s| s.touched);
        segments.sort_by_key(|s| s.system);

        let n = segments.len();
        for (i, seg) in segments.iter_mut().enumerate() {
            seg.kind = match (i, n) {
                (_, 1) => SegmentKind::Single,
                (0, _) => SegmentKind::Begin,
                (i, n) if i + 1 == n => SegmentKind::End,
                _ => SegmentKind::Middle,
            };
            seg.touched = false;
        }
        before - n
    }
}

#[cfg(test)]
#[path = "../../tests/unit/score/model.rs"]
mod tests;
