use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::foundation::core::{ElementId, SpannerId, StaffIdx};
use crate::foundation::error::{LayoutError, LayoutResult};
use crate::layout::dirty::DirtyRegion;
use crate::score::model::{Spanner, Staff};
use crate::style::model::{EngravingFont, FontHandle, Style, StyleId};

/// Rendering surface interested in layout changes.
///
/// Notification is fire-and-forget: implementations typically schedule a
/// redraw rather than draw synchronously.
pub trait Viewer {
    /// Layout of the viewed document changed.
    fn layout_changed(&self);
}

/// The document side of a layout pass.
///
/// Queries take `&self`; the few mutations a pass performs (dirty-state
/// bookkeeping, the pass flag) go through interior mutability, so a pass can
/// hold the document by shared reference while it also borrows its spanners.
pub trait Document {
    /// Live style of the document.
    fn style(&self) -> &Style;

    /// Flag value for `id`; non-flag keys read as `false`.
    fn style_bool(&self, id: StyleId) -> bool {
        self.style().value_bool(id).unwrap_or(false)
    }

    /// Staff space of the document.
    fn spatium(&self) -> f64 {
        self.style().spatium()
    }

    /// Engraving font, when one is loaded.
    fn engraving_font(&self) -> Option<FontHandle>;

    /// Staff at `idx`, if it exists.
    fn staff(&self, idx: StaffIdx) -> Option<&Staff>;

    /// Record that `region` needs re-layout in the document's own dirty state.
    fn mark_dirty(&self, region: DirtyRegion, cause: Option<ElementId>);

    /// Viewers currently registered with the document.
    fn viewers(&self) -> Vec<Rc<dyn Viewer>>;

    /// Claim the document for one layout pass. Returns `false` when a pass is
    /// already in progress.
    fn try_begin_pass(&self) -> bool {
        true
    }

    /// Release the claim taken by [`try_begin_pass`](Self::try_begin_pass).
    fn end_pass(&self) {}
}

/// Layout work a score has accumulated outside of any pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PendingLayout {
    /// Nothing to redo.
    #[default]
    Clean,
    /// Redo the given region.
    Region(DirtyRegion),
    /// Redo the whole score.
    All,
}

impl PendingLayout {
    fn merge(self, region: DirtyRegion) -> Self {
        match self {
            PendingLayout::Clean => PendingLayout::Region(region),
            PendingLayout::Region(r) => PendingLayout::Region(r.union(region)),
            PendingLayout::All => PendingLayout::All,
        }
    }
}

/// In-memory score: staves, spanners, style and registered viewers.
pub struct Score {
    style: Style,
    font: FontHandle,
    staves: Vec<Staff>,
    spanners: BTreeMap<SpannerId, Spanner>,
    viewers: Vec<Rc<dyn Viewer>>,
    pending: Cell<PendingLayout>,
    pass_active: Cell<bool>,
    last_dirty_cause: Cell<Option<ElementId>>,
}

impl std::fmt::Debug for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Score")
            .field("staves", &self.staves.len())
            .field("spanners", &self.spanners.len())
            .field("viewers", &self.viewers.len())
            .field("pending", &self.pending.get())
            .field("pass_active", &self.pass_active.get())
            .finish()
    }
}

impl Default for Score {
    fn default() -> Self {
        Self::new(Style::default())
    }
}

impl Score {
    /// Empty score with the given style.
    pub fn new(style: Style) -> Self {
        let font = EngravingFont::for_style(&style);
        Self {
            style,
            font,
            staves: Vec::new(),
            spanners: BTreeMap::new(),
            viewers: Vec::new(),
            pending: Cell::new(PendingLayout::Clean),
            pass_active: Cell::new(false),
            last_dirty_cause: Cell::new(None),
        }
    }

    /// Append a staff and return its index.
    pub fn add_staff(&mut self, name: impl Into<String>) -> StaffIdx {
        let idx = StaffIdx(self.staves.len());
        self.staves.push(Staff::new(idx, name));
        idx
    }

    /// Number of staves.
    pub fn staff_count(&self) -> usize {
        self.staves.len()
    }

    /// Add a spanner. Its staves must exist and its id must be unused.
    pub fn add_spanner(&mut self, spanner: Spanner) -> LayoutResult<&Spanner> {
        if spanner.staff2().0 >= self.staves.len() {
            return Err(LayoutError::validation(format!(
                "spanner {} references staff {} but score has {} staves",
                spanner.id().0,
                spanner.staff2().0,
                self.staves.len()
            )));
        }
        let id = spanner.id();
        if self.spanners.contains_key(&id) {
            return Err(LayoutError::validation(format!(
                "duplicate spanner id {}",
                id.0
            )));
        }
        Ok(&*self.spanners.entry(id).or_insert(spanner))
    }

    /// Spanner by id.
    pub fn spanner(&self, id: SpannerId) -> Option<&Spanner> {
        self.spanners.get(&id)
    }

    /// All spanners in id order.
    pub fn spanners(&self) -> impl Iterator<Item = &Spanner> {
        self.spanners.values()
    }

    /// Replace the style; the engraving font follows the new style.
    ///
    /// A style change invalidates the whole layout.
    pub fn set_style(&mut self, style: Style) {
        self.font = EngravingFont::for_style(&style);
        self.style = style;
        self.mark_layout_all();
    }

    /// Register a viewer for layout-change notifications.
    pub fn register_viewer(&mut self, viewer: Rc<dyn Viewer>) {
        if !self.viewers.iter().any(|v| Rc::ptr_eq(v, &viewer)) {
            self.viewers.push(viewer);
        }
    }

    /// Remove a previously registered viewer. Returns `true` if it was registered.
    pub fn unregister_viewer(&mut self, viewer: &Rc<dyn Viewer>) -> bool {
        let before = self.viewers.len();
        self.viewers.retain(|v| !Rc::ptr_eq(v, viewer));
        self.viewers.len() != before
    }

    /// Mark the whole score for re-layout.
    pub fn mark_layout_all(&self) {
        self.pending.set(PendingLayout::All);
        self.last_dirty_cause.set(None);
    }

    /// Layout work accumulated so far.
    pub fn pending_layout(&self) -> PendingLayout {
        self.pending.get()
    }

    /// Consume the accumulated layout work, leaving the score clean.
    pub fn take_pending_layout(&self) -> PendingLayout {
        self.last_dirty_cause.set(None);
        self.pending.replace(PendingLayout::Clean)
    }

    /// Most recent element given as the cause of a dirty request since the
    /// last [`take_pending_layout`](Self::take_pending_layout).
    pub fn last_dirty_cause(&self) -> Option<ElementId> {
        self.last_dirty_cause.get()
    }

    /// Return `true` while a layout pass holds the score.
    pub fn is_pass_active(&self) -> bool {
        self.pass_active.get()
    }
}

impl Document for Score {
    fn style(&self) -> &Style {
        &self.style
    }

    fn engraving_font(&self) -> Option<FontHandle> {
        Some(self.font.clone())
    }

    fn staff(&self, idx: StaffIdx) -> Option<&Staff> {
        self.staves.get(idx.0)
    }

    fn mark_dirty(&self, region: DirtyRegion, cause: Option<ElementId>) {
        self.pending.set(self.pending.get().merge(region));
        if cause.is_some() {
            self.last_dirty_cause.set(cause);
        }
    }

    fn viewers(&self) -> Vec<Rc<dyn Viewer>> {
        self.viewers.clone()
    }

    fn try_begin_pass(&self) -> bool {
        !self.pass_active.replace(true)
    }

    fn end_pass(&self) {
        self.pass_active.set(false);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/score/document.rs"]
mod tests;
