//! The `showOverlay` collaborator (spec §4.6, §6: "drives an `IOverlay`
//! collaborator"). The dock engine never paints the drop-preview itself —
//! it resolves a [`Zone`] and a rectangle, then hands both to whatever
//! `Overlay` implementation the embedder supplied, the same seam
//! `panel_vdom::DomDriver` draws between the reconciler's algorithm and a
//! real browser.

use panel_vdom::Rect;

use crate::geometry::Zone;

/// A drop-preview surface the dock engine drives but does not own.
///
/// `show`/`hide` are called once per pointer move during a drag (spec
/// §4.6's `showOverlay`); a real implementation positions one absolutely-
/// placed `p-DockPanel-overlay` element, an in-memory one (tests) just
/// records the last call.
pub trait Overlay {
    fn show(&self, rect: Rect, zone: Zone);
    fn hide(&self);
}

pub const CLASS_OVERLAY: &str = "p-DockPanel-overlay";

/// An [`Overlay`] that positions one real DOM node via absolute-style
/// `left/top/width/height`, toggling `display: none` when hidden — the
/// same styling approach every concrete layout in `panel-widgets` already
/// uses for its managed children.
pub struct DomOverlay<D: panel_vdom::DomDriver> {
    driver: std::rc::Rc<D>,
    node: D::Node,
}

impl<D: panel_vdom::DomDriver> DomOverlay<D> {
    /// `node` should already be attached under the dock panel's own root,
    /// with `class="p-DockPanel-overlay"` and `position: absolute` set up
    /// by the caller (mirroring how `SplitLayout` creates its handle
    /// nodes once, up front, rather than per-drag).
    pub fn new(driver: std::rc::Rc<D>, node: D::Node) -> Self {
        let overlay = Self { driver, node };
        overlay.hide();
        overlay
    }

    pub fn node(&self) -> &D::Node {
        &self.node
    }
}

impl<D: panel_vdom::DomDriver> Overlay for DomOverlay<D> {
    fn show(&self, rect: Rect, _zone: Zone) {
        self.driver.set_style_property(&self.node, "display", None);
        self.driver.set_style_property(&self.node, "left", Some(&format!("{}px", rect.left)));
        self.driver.set_style_property(&self.node, "top", Some(&format!("{}px", rect.top)));
        self.driver
            .set_style_property(&self.node, "width", Some(&format!("{}px", rect.width())));
        self.driver
            .set_style_property(&self.node, "height", Some(&format!("{}px", rect.height())));
    }

    fn hide(&self) {
        self.driver.set_style_property(&self.node, "display", Some("none"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Side;
    use panel_widgets::testing::FakeDriver;
    use std::rc::Rc;

    #[test]
    fn show_sets_absolute_geometry_from_rect() {
        let drv = Rc::new(FakeDriver::default());
        let node = drv.create_element("div");
        let overlay = DomOverlay::new(drv.clone(), node.clone());

        overlay.show(Rect::new(10.0, 20.0, 110.0, 70.0), Zone::Root(Side::Left));

        assert_eq!(drv.style_of(&node, "left"), Some("10px".to_string()));
        assert_eq!(drv.style_of(&node, "width"), Some("100px".to_string()));
        assert_eq!(drv.style_of(&node, "display"), None);
    }

    #[test]
    fn hide_sets_display_none() {
        let drv = Rc::new(FakeDriver::default());
        let node = drv.create_element("div");
        let overlay = DomOverlay::new(drv.clone(), node.clone());
        overlay.show(Rect::new(0.0, 0.0, 10.0, 10.0), Zone::Root(Side::Center));

        overlay.hide();
        assert_eq!(drv.style_of(&node, "display"), Some("none".to_string()));
    }
}
