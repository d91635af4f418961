//! The tab-drag lifecycle (spec §5: "pending -> active -> finalizing",
//! Escape-cancel, a single reentrant-drag guard). The state machine here
//! is pure — it knows pointer coordinates and widget identities, never a
//! real `PointerEvent` — so it can be driven by a plain `#[test]` exactly
//! as easily as by `DockPanel`'s real `web_sys` listeners.

use std::rc::Rc;

use panel_vdom::DomDriver;
use panel_widgets::tab_bar::TabBar;
use panel_widgets::widget::WidgetRef;

use crate::error::{DockError, Result};
use crate::geometry::Zone;

/// Drag distance (in either axis) a pointer must travel past `pointer_down`
/// before a `Pending` session promotes itself to `Active` — below this, a
/// `pointer_up` is a plain click, not a drag (spec §5: "a drag only
/// becomes active once the pointer clears a drag threshold").
pub const DRAG_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    /// A pointer went down on a tab, but hasn't moved past the threshold
    /// yet; still indistinguishable from a click.
    Pending,
    /// The threshold was cleared; the dragged tab now tracks the pointer
    /// and a drop-zone overlay may be showing.
    Active,
}

/// One in-progress tab drag: which tab bar and tab started it, the
/// pointer's last known position, and whatever drop zone that position
/// currently resolves to.
pub struct DragSession<D: DomDriver> {
    bar: Rc<TabBar<D>>,
    widget: WidgetRef<D>,
    origin_index: usize,
    start_x: f64,
    start_y: f64,
    state: DragState,
    zone: Zone,
}

impl<D: DomDriver + 'static> DragSession<D> {
    fn new(bar: Rc<TabBar<D>>, widget: WidgetRef<D>, origin_index: usize, x: f64, y: f64) -> Self {
        Self {
            bar,
            widget,
            origin_index,
            start_x: x,
            start_y: y,
            state: DragState::Pending,
            zone: Zone::Invalid,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn widget(&self) -> &WidgetRef<D> {
        &self.widget
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }
}

/// Owns at most one [`DragSession`] at a time (spec §5's reentrant-drag
/// guard: "`DockError::DragAlreadyActive`" if a second drag starts before
/// the first ends).
#[derive(Default)]
pub struct DragController<D: DomDriver> {
    session: Option<DragSession<D>>,
}

impl<D: DomDriver + 'static> DragController<D> {
    pub fn new() -> Self {
        Self { session: None }
    }

    pub fn is_active(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.state == DragState::Active)
    }

    pub fn session(&self) -> Option<&DragSession<D>> {
        self.session.as_ref()
    }

    /// Start tracking a pointer-down on `widget`'s tab at `origin_index`
    /// within `bar`. Rejects a second concurrent drag (spec §5).
    pub fn pointer_down(&mut self, bar: Rc<TabBar<D>>, widget: WidgetRef<D>, origin_index: usize, x: f64, y: f64) -> Result<()> {
        if self.session.is_some() {
            return Err(DockError::DragAlreadyActive);
        }
        self.session = Some(DragSession::new(bar, widget, origin_index, x, y));
        Ok(())
    }

    /// Advance the in-progress session to `(x, y)`. Promotes `Pending` to
    /// `Active` once the drag threshold is cleared; while active, sets
    /// `bar`'s dragging-tab visual state and resolves `zone` via
    /// `resolve_zone`, so the caller can drive an [`crate::overlay::Overlay`]
    /// from the returned zone. A no-op (returns `Zone::Invalid`) if no
    /// drag is in progress.
    pub fn pointer_move(&mut self, x: f64, y: f64, resolve_zone: impl FnOnce(f64, f64) -> Zone) -> Zone {
        let Some(session) = self.session.as_mut() else {
            return Zone::Invalid;
        };

        if session.state == DragState::Pending {
            let dx = (x - session.start_x).abs();
            let dy = (y - session.start_y).abs();
            if dx < DRAG_THRESHOLD && dy < DRAG_THRESHOLD {
                return Zone::Invalid;
            }
            session.state = DragState::Active;
            session.bar.set_dragging(Some(session.origin_index));
        }

        session.zone = resolve_zone(x, y);
        session.zone
    }

    /// Reorder the dragged tab within its own bar to sit at `to` (an
    /// in-bar reorder, as opposed to `tab_detach_requested`'s cross-panel
    /// move). A no-op if the drag never went active.
    pub fn reorder_within_bar(&self, to: usize) {
        if let Some(session) = &self.session {
            if session.state == DragState::Active {
                session.bar.move_tab(session.origin_index, to);
            }
        }
    }

    /// End the drag at `(x, y)`: clears the bar's dragging-tab visual
    /// state and returns the session so the caller (`DockPanel`) can act
    /// on its final zone/widget — emitting `tab_detach_requested` for a
    /// cross-panel drop, or simply letting the in-bar reorder stand.
    /// Errors if no drag was in progress (spec §7: "no drag in progress").
    pub fn pointer_up(&mut self) -> Result<DragSession<D>> {
        let session = self.session.take().ok_or(DockError::EmptyDrag)?;
        session.bar.set_dragging(None);
        Ok(session)
    }

    /// Abort the in-progress drag without acting on its result — the tab
    /// stays exactly where it started (spec §5: "Escape-cancel restoring
    /// tab positions"). A no-op if no drag is in progress.
    pub fn cancel(&mut self) {
        if let Some(session) = self.session.take() {
            session.bar.set_dragging(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panel_core::{ImmediateScheduler, MessageLoop};
    use panel_widgets::testing::FakeDriver;
    use panel_widgets::widget::Widget;

    fn setup() -> (Rc<FakeDriver>, Rc<MessageLoop>, Rc<TabBar<FakeDriver>>) {
        let drv = Rc::new(FakeDriver::default());
        let ml = MessageLoop::new(Box::new(ImmediateScheduler));
        let bar = TabBar::new(drv.clone());
        (drv, ml, bar)
    }

    fn tab(drv: &Rc<FakeDriver>, ml: &Rc<MessageLoop>, bar: &Rc<TabBar<FakeDriver>>) -> WidgetRef<FakeDriver> {
        let w = Widget::new(drv.create_element("div"), ml.clone());
        bar.add_tab(w.clone());
        w
    }

    #[test]
    fn small_movement_stays_pending_and_never_resolves_a_zone() {
        let (drv, ml, bar) = setup();
        let a = tab(&drv, &ml, &bar);
        let mut drag = DragController::new();
        drag.pointer_down(bar.clone(), a, 0, 10.0, 10.0).unwrap();

        let zone = drag.pointer_move(11.0, 11.0, |_, _| Zone::Root(crate::geometry::Side::Left));
        assert_eq!(zone, Zone::Invalid);
        assert_eq!(drag.session().unwrap().state(), DragState::Pending);
    }

    #[test]
    fn crossing_threshold_activates_and_resolves_zone() {
        let (drv, ml, bar) = setup();
        let a = tab(&drv, &ml, &bar);
        let mut drag = DragController::new();
        drag.pointer_down(bar.clone(), a, 0, 10.0, 10.0).unwrap();

        let zone = drag.pointer_move(100.0, 10.0, |_, _| Zone::Root(crate::geometry::Side::Left));
        assert_eq!(zone, Zone::Root(crate::geometry::Side::Left));
        assert_eq!(drag.session().unwrap().state(), DragState::Active);
    }

    #[test]
    fn second_pointer_down_is_rejected_while_a_drag_is_active() {
        let (drv, ml, bar) = setup();
        let a = tab(&drv, &ml, &bar);
        let b = tab(&drv, &ml, &bar);
        let mut drag = DragController::new();
        drag.pointer_down(bar.clone(), a, 0, 0.0, 0.0).unwrap();

        let err = drag.pointer_down(bar.clone(), b, 1, 0.0, 0.0).unwrap_err();
        assert!(matches!(err, DockError::DragAlreadyActive));
    }

    #[test]
    fn pointer_up_without_a_drag_is_an_error() {
        let mut drag: DragController<FakeDriver> = DragController::new();
        assert!(matches!(drag.pointer_up().unwrap_err(), DockError::EmptyDrag));
    }

    #[test]
    fn cancel_clears_the_session_without_producing_a_result() {
        let (drv, ml, bar) = setup();
        let a = tab(&drv, &ml, &bar);
        let mut drag = DragController::new();
        drag.pointer_down(bar.clone(), a, 0, 0.0, 0.0).unwrap();
        drag.pointer_move(100.0, 100.0, |_, _| Zone::Invalid);

        drag.cancel();
        assert!(drag.session().is_none());
        assert!(matches!(drag.pointer_up().unwrap_err(), DockError::EmptyDrag));
    }
}
