//! The dock tree's own invariants (spec §3, §4.6): a binary-branching tree
//! of `TabPanel`s and `SplitPanel`s, with `addWidget`/`removeWidget`
//! (indirect, via a `TabPanel`'s `widget_removed`) as the only two ways
//! its shape changes. Node identity is tracked through a flat registry
//! keyed on `ObjectId` (spec §4.6 step 2: "registers `w` in a flat widget
//! set") rather than parent pointers threaded through the node types
//! themselves, mirroring how `panel_core::signal` keeps its own inverse
//! index external to `Signal<T>` rather than on the signal itself.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use panel_core::{ids::ObjectId, signal, slot, MessageLoop, Signal};
use panel_vdom::{AttrValue, DomDriver};
use panel_widgets::{
    box_layout::Orientation, split_layout::SplitLayout, tab_panel::TabPanel, widget::Widget,
    widget::WidgetRef,
};

use crate::error::{DockError, Result};

pub const CLASS_SPLIT_PANEL: &str = "p-DockPanel-splitPanel";
pub const CLASS_TAB_PANEL_DOCK: &str = "p-DockPanel-tabPanel";

/// Where a new widget lands relative to a reference widget (spec §4.6:
/// "Modes are `tab-before`, `tab-after`, `split-top|left|right|bottom`").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddMode {
    TabBefore,
    TabAfter,
    SplitTop,
    SplitLeft,
    SplitRight,
    SplitBottom,
}

impl AddMode {
    fn split_orientation(self) -> Option<Orientation> {
        match self {
            AddMode::SplitLeft | AddMode::SplitRight => Some(Orientation::Horizontal),
            AddMode::SplitTop | AddMode::SplitBottom => Some(Orientation::Vertical),
            AddMode::TabBefore | AddMode::TabAfter => None,
        }
    }

    /// Whether the new panel goes before (top/left) or after
    /// (bottom/right) the reference panel along the split's axis.
    fn before(self) -> bool {
        matches!(self, AddMode::SplitTop | AddMode::SplitLeft)
    }
}

struct SplitNode<D: DomDriver> {
    widget: WidgetRef<D>,
    layout: Rc<SplitLayout<D>>,
    orientation: Orientation,
}

enum Node<D: DomDriver> {
    Tab(Rc<TabPanel<D>>),
    Split(Rc<SplitNode<D>>),
}

impl<D: DomDriver> Clone for Node<D> {
    fn clone(&self) -> Self {
        match self {
            Node::Tab(t) => Node::Tab(t.clone()),
            Node::Split(s) => Node::Split(s.clone()),
        }
    }
}

impl<D: DomDriver + 'static> Node<D> {
    fn widget(&self) -> WidgetRef<D> {
        match self {
            Node::Tab(t) => t.widget().clone(),
            Node::Split(s) => s.widget.clone(),
        }
    }

    fn id(&self) -> ObjectId {
        ObjectId::of(&self.widget())
    }
}

/// The dock tree itself: node registry, the flat widget set, and the two
/// structural operations (`add_widget`, `collapse_empty_tab_panel`) spec
/// §4.6 builds everything else on top of.
pub struct DockTree<D: DomDriver> {
    driver: Rc<D>,
    message_loop: Rc<MessageLoop>,
    root: RefCell<Option<Node<D>>>,
    /// Every widget currently docked, regardless of which tab panel holds
    /// it (spec §4.6 step 2's "flat widget set").
    widgets: RefCell<HashMap<ObjectId, WidgetRef<D>>>,
    /// The tab panel presently holding a given docked widget.
    owner: RefCell<HashMap<ObjectId, Rc<TabPanel<D>>>>,
    /// Every split/tab panel node currently in the tree, keyed by its own
    /// widget's identity.
    nodes: RefCell<HashMap<ObjectId, Node<D>>>,
    /// A node's containing split, if any (absent entries are the root).
    parent_of: RefCell<HashMap<ObjectId, Rc<SplitNode<D>>>>,
    /// A handle to this tree's own `Rc`, so a freshly created tab panel
    /// can wire its `widget_removed` straight back to
    /// `collapse_empty_tab_panel` without a `DockPanel` having to do that
    /// wiring itself (spec §4.6's `removeWidget` is entirely internal to
    /// the tree's own invariants).
    self_weak: Weak<Self>,
    /// Fires whenever the tree's root node changes — a split wrapping the
    /// first widget ever added, a split-merge replacing the root, or a
    /// collapse leaving a new sole survivor at the root (or `None`, once
    /// the tree empties out). `DockPanel` is the only intended listener:
    /// it keeps its own hosting widget's child in sync with whichever
    /// widget is currently the tree's root, however that root came to be.
    root_changed: Rc<Signal<Option<WidgetRef<D>>>>,
    self_id: ObjectId,
}

impl<D: DomDriver + 'static> DockTree<D> {
    pub fn new(driver: Rc<D>, message_loop: Rc<MessageLoop>) -> Rc<Self> {
        Rc::new_cyclic(|weak: &Weak<Self>| {
            let self_id = ObjectId::from_raw(weak.as_ptr() as *const () as usize);
            Self {
                driver,
                message_loop,
                root: RefCell::new(None),
                widgets: RefCell::new(HashMap::new()),
                owner: RefCell::new(HashMap::new()),
                nodes: RefCell::new(HashMap::new()),
                parent_of: RefCell::new(HashMap::new()),
                self_weak: weak.clone(),
                root_changed: Signal::new(self_id),
                self_id,
            }
        })
    }

    pub fn root_changed(&self) -> &Rc<Signal<Option<WidgetRef<D>>>> {
        &self.root_changed
    }

    /// Replace the root node, emitting `root_changed` with the new root's
    /// own widget (or `None` once the tree empties). The sole place
    /// `self.root` is ever assigned, so every structural change that
    /// moves the root notifies `DockPanel` the same way.
    fn set_root(&self, node: Option<Node<D>>) {
        let widget = node.as_ref().map(Node::widget);
        *self.root.borrow_mut() = node;
        self.root_changed.emit(&widget);
    }

    pub fn owner_of(&self, widget: &WidgetRef<D>) -> Option<Rc<TabPanel<D>>> {
        self.owner.borrow().get(&ObjectId::of(widget)).cloned()
    }

    /// The leaf `TabPanel` whose bounding rect (per `driver`) contains
    /// `(x, y)`, descending through whichever split child's rect contains
    /// the point at each level. Used by `DockPanel::find_drop_target` to
    /// resolve a panel-level zone once the root-level edge bands have
    /// been ruled out.
    pub fn leaf_at(&self, driver: &D, x: f64, y: f64) -> Option<Rc<TabPanel<D>>> {
        let root = self.root.borrow().clone()?;
        self.leaf_at_node(&root, driver, x, y)
    }

    fn leaf_at_node(&self, node: &Node<D>, driver: &D, x: f64, y: f64) -> Option<Rc<TabPanel<D>>> {
        match node {
            Node::Tab(t) => Some(t.clone()),
            Node::Split(s) => {
                for child in s.layout.widgets() {
                    let rect = driver.bounding_rect(child.borrow().node());
                    if rect.contains(x, y) {
                        let child_node = self.nodes.borrow().get(&ObjectId::of(&child)).cloned()?;
                        return self.leaf_at_node(&child_node, driver, x, y);
                    }
                }
                None
            }
        }
    }

    /// The current root node's own widget, if the tree holds anything.
    pub fn root_widget(&self) -> Option<WidgetRef<D>> {
        self.root.borrow().as_ref().map(Node::widget)
    }

    pub fn is_empty(&self) -> bool {
        self.root.borrow().is_none()
    }

    pub fn contains(&self, widget: &WidgetRef<D>) -> bool {
        self.widgets.borrow().contains_key(&ObjectId::of(widget))
    }

    pub fn widgets(&self) -> Vec<WidgetRef<D>> {
        self.widgets.borrow().values().cloned().collect()
    }

    fn tab_panel_for(&self, widget: &WidgetRef<D>) -> Result<Rc<TabPanel<D>>> {
        self.owner
            .borrow()
            .get(&ObjectId::of(widget))
            .cloned()
            .ok_or(DockError::UnknownReference)
    }

    /// spec §4.6 step 3: "the root/top-left panel if `ref` is null" —
    /// always the first child along whichever split sits at the root,
    /// descended until a `TabPanel` is reached. Creates one (and makes it
    /// the tree's root) if the tree is currently empty.
    fn default_tab_panel(&self) -> Rc<TabPanel<D>> {
        let root = self.root.borrow().clone();
        let Some(root) = root else {
            let panel = self.new_tab_panel();
            let node = Node::Tab(panel.clone());
            self.nodes.borrow_mut().insert(node.id(), node.clone());
            self.set_root(Some(node));
            return panel;
        };
        self.first_leaf(&root)
    }

    fn first_leaf(&self, node: &Node<D>) -> Rc<TabPanel<D>> {
        match node {
            Node::Tab(t) => t.clone(),
            Node::Split(s) => {
                let first = s
                    .layout
                    .widgets()
                    .into_iter()
                    .next()
                    .expect("a split always retains at least two children");
                let child = self
                    .nodes
                    .borrow()
                    .get(&ObjectId::of(&first))
                    .cloned()
                    .expect("every split child is a registered node");
                self.first_leaf(&child)
            }
        }
    }

    fn new_tab_panel(&self) -> Rc<TabPanel<D>> {
        let panel = TabPanel::new(self.driver.clone(), self.message_loop.clone());
        self.driver.set_attribute(
            panel.widget().borrow().node(),
            "class",
            &AttrValue::Text(format!("{} {}", panel_widgets::tab_panel::CLASS_TAB_PANEL, CLASS_TAB_PANEL_DOCK)),
        );

        let tree = self.self_weak.clone();
        let panel_weak = Rc::downgrade(&panel);
        let receiver_id = ObjectId::of(panel.widget());
        let receiver_alive = Widget::alive_token(panel.widget());
        panel.widget_removed().connect(
            receiver_id,
            receiver_alive,
            slot(move |_: &()| {
                if let (Some(tree), Some(panel)) = (tree.upgrade(), panel_weak.upgrade()) {
                    tree.collapse_empty_tab_panel(&panel);
                }
            }),
        );

        panel
    }

    /// spec §4.6's `addWidget`. Unparents `w`, registers it, then resolves
    /// and applies the target per `mode`.
    pub fn add_widget(&self, w: WidgetRef<D>, mode: AddMode, reference: Option<WidgetRef<D>>) -> Result<()> {
        if let Some(r) = &reference {
            if !self.contains(r) {
                return Err(DockError::UnknownReference);
            }
        }

        Widget::unparent(&w, self.driver.as_ref());
        let wid = ObjectId::of(&w);
        self.widgets.borrow_mut().insert(wid, w.clone());

        match mode.split_orientation() {
            None => {
                let target = match &reference {
                    Some(r) => self.tab_panel_for(r)?,
                    None => self.default_tab_panel(),
                };
                let index = match &reference {
                    Some(r) => {
                        let i = target
                            .widgets()
                            .iter()
                            .position(|x| Rc::ptr_eq(x, r))
                            .ok_or(DockError::UnknownReference)?;
                        if mode == AddMode::TabAfter { i + 1 } else { i }
                    }
                    None => target.len(),
                };
                target.insert_widget(index, w);
                self.owner.borrow_mut().insert(wid, target);
            }
            Some(orientation) => {
                let ref_panel = match &reference {
                    Some(r) => self.tab_panel_for(r)?,
                    None => self.default_tab_panel(),
                };
                let new_panel = self.new_tab_panel();
                new_panel.add_widget(w.clone());
                self.owner.borrow_mut().insert(wid, new_panel.clone());
                self.split_beside(&ref_panel, Node::Tab(new_panel), orientation, mode.before());
            }
        }
        Ok(())
    }

    /// Place `new_node` beside `ref_panel` along `orientation`: merges
    /// into `ref_panel`'s existing containing split if it already runs
    /// the same orientation (spec §4.6 step 4), otherwise wraps
    /// `ref_panel` in a freshly created split, preserving a 1:1 stretch
    /// ratio between the two (spec §4.6 step 3).
    fn split_beside(&self, ref_panel: &Rc<TabPanel<D>>, new_node: Node<D>, orientation: Orientation, before: bool) {
        let ref_node = self
            .nodes
            .borrow()
            .get(&ObjectId::of(ref_panel.widget()))
            .cloned()
            .expect("ref_panel is always a registered node");
        let parent_split = self.parent_of.borrow().get(&ref_node.id()).cloned();

        if let Some(parent) = &parent_split {
            if parent.orientation == orientation {
                let idx = parent
                    .layout
                    .index_of(&ref_node.widget())
                    .expect("ref_node is a registered child of its recorded parent");
                let insert_at = if before { idx } else { idx + 1 };
                self.insert_into_split(parent, new_node, Some(insert_at));
                return;
            }
        }

        let split_host = self.driver.create_element("div");
        self.driver
            .set_attribute(&split_host, "class", &AttrValue::Text(CLASS_SPLIT_PANEL.to_string()));
        let split_widget = Widget::new(split_host, self.message_loop.clone());
        let layout = SplitLayout::new(self.driver.clone(), orientation);
        Widget::set_layout(&split_widget, layout.clone())
            .expect("freshly built split widget carries no layout yet");
        let split_node = Rc::new(SplitNode {
            widget: split_widget.clone(),
            layout,
            orientation,
        });

        // Splice the new split into `ref_node`'s old slot first, then
        // move `ref_node` under it — never leaving `ref_node` briefly
        // parentless in a way `child-removed` would double-fire on.
        match &parent_split {
            Some(parent) => {
                let idx = parent
                    .layout
                    .index_of(&ref_node.widget())
                    .expect("ref_node is a registered child of its recorded parent");
                Widget::unparent(&ref_node.widget(), self.driver.as_ref());
                parent.layout.insert_widget(idx, split_widget.clone());
                self.register_node(Some(parent.clone()), Node::Split(split_node.clone()));
            }
            None => {
                Widget::unparent(&ref_node.widget(), self.driver.as_ref());
                self.nodes
                    .borrow_mut()
                    .insert(ObjectId::of(&split_widget), Node::Split(split_node.clone()));
                self.parent_of.borrow_mut().remove(&ObjectId::of(&split_widget));
                self.set_root(Some(Node::Split(split_node.clone())));
            }
        }

        let (first, second) = if before {
            (new_node, ref_node)
        } else {
            (ref_node, new_node)
        };
        self.append_to_split(&split_node, first);
        self.append_to_split(&split_node, second);
    }

    fn insert_into_split(&self, split: &Rc<SplitNode<D>>, node: Node<D>, index: Option<usize>) {
        let widget = node.widget();
        match index {
            Some(i) => split.layout.insert_widget(i, widget.clone()),
            None => split.layout.add_widget(widget.clone()),
        }
        split.layout.set_stretch(&widget, 1);
        self.register_node(Some(split.clone()), node);
    }

    fn append_to_split(&self, split: &Rc<SplitNode<D>>, node: Node<D>) {
        self.insert_into_split(split, node, None);
    }

    fn register_node(&self, parent: Option<Rc<SplitNode<D>>>, node: Node<D>) {
        let id = node.id();
        self.nodes.borrow_mut().insert(id, node);
        match parent {
            Some(p) => {
                self.parent_of.borrow_mut().insert(id, p);
            }
            None => {
                self.parent_of.borrow_mut().remove(&id);
            }
        }
    }

    /// Drop `widget` from the flat set and its owning tab panel's
    /// bookkeeping. Call once a widget leaves the dock permanently
    /// (disposed, or handed to another dock); the tab panel itself
    /// already reacted to the underlying `child-removed` via its own
    /// `StackedLayout`/`TabBar` sync (see `panel_widgets::tab_panel`).
    fn forget_widget(&self, widget: &WidgetRef<D>) {
        let wid = ObjectId::of(widget);
        self.widgets.borrow_mut().remove(&wid);
        self.owner.borrow_mut().remove(&wid);
    }

    /// Indirect widget removal: called once a
    /// `TabPanel::widget_removed` fires (it went empty). Collapses the
    /// empty tab panel, and if that leaves its parent split with a single
    /// remaining child, collapses the split too, merging its own sole
    /// child into *its* parent split in turn (propagating upward for as
    /// long as the pattern holds).
    pub fn collapse_empty_tab_panel(&self, panel: &Rc<TabPanel<D>>) {
        let node = self
            .nodes
            .borrow()
            .get(&ObjectId::of(panel.widget()))
            .cloned();
        let Some(node) = node else { return };
        debug_assert!(matches!(node, Node::Tab(_)));

        self.remove_node(&node);
    }

    /// Excise `node` from the tree (its parent split, or the root slot),
    /// then collapse upward through any single-child split left behind.
    fn remove_node(&self, node: &Node<D>) {
        let parent = self.parent_of.borrow().get(&node.id()).cloned();
        self.nodes.borrow_mut().remove(&node.id());
        self.parent_of.borrow_mut().remove(&node.id());

        match parent {
            None => {
                Widget::unparent(&node.widget(), self.driver.as_ref());
                self.set_root(None);
            }
            Some(split) => {
                // Update the split's own bookkeeping synchronously rather
                // than waiting for `unparent`'s posted `child-removed` to
                // drain on some future frame — the single-child collapse
                // check right below needs `len()` to be accurate now.
                split.layout.remove_widget(&node.widget());
                Widget::unparent(&node.widget(), self.driver.as_ref());
                self.collapse_if_single_child(&split);
            }
        }
    }

    /// If `split` has been left with exactly one child, dissolve it:
    /// splice that sole remaining child into `split`'s own former slot
    /// (its parent split, or the tree root) and dispose `split`'s now-
    /// empty widget.
    fn collapse_if_single_child(&self, split: &Rc<SplitNode<D>>) {
        if split.layout.len() != 1 {
            return;
        }
        let remaining = split
            .layout
            .widgets()
            .into_iter()
            .next()
            .expect("checked len() == 1 above");
        let remaining_node = self
            .nodes
            .borrow()
            .get(&ObjectId::of(&remaining))
            .cloned()
            .expect("a split's child is always a registered node");

        let grandparent = self.parent_of.borrow().get(&ObjectId::of(&split.widget)).cloned();
        Widget::unparent(&remaining_node.widget(), self.driver.as_ref());

        match &grandparent {
            Some(gp) => {
                let idx = gp
                    .layout
                    .index_of(&split.widget)
                    .expect("split is a registered child of its recorded parent");
                Widget::unparent(&split.widget, self.driver.as_ref());
                gp.layout.insert_widget(idx, remaining.clone());
                self.register_node(Some(gp.clone()), remaining_node);
            }
            None => {
                self.nodes
                    .borrow_mut()
                    .insert(ObjectId::of(&remaining), remaining_node.clone());
                self.parent_of.borrow_mut().remove(&ObjectId::of(&remaining));
                self.set_root(Some(remaining_node));
            }
        }

        self.nodes.borrow_mut().remove(&ObjectId::of(&split.widget));
        self.parent_of.borrow_mut().remove(&ObjectId::of(&split.widget));
        Widget::dispose(&split.widget, self.driver.as_ref());

        // The dissolved split may itself have been its own parent's only
        // other child once `remaining` left it — recurse the same check
        // one level up so a chain of single-child splits fully flattens.
        if let Some(gp) = grandparent {
            self.collapse_if_single_child(&gp);
        }
    }

    /// Drop a disposed/detached leaf widget from the flat dock set. Wire
    /// this to the widget's own `disposed` signal (or call directly) from
    /// `DockPanel` so the registry never outlives the widget it names.
    pub fn on_widget_left(&self, widget: &WidgetRef<D>) {
        self.forget_widget(widget);
    }
}
