//! The widget lifecycle tree, its attach/show/resize protocol, and the
//! box-sizing layouts built on top of it.
//!
//! Generic over `panel_vdom::DomDriver` throughout: the whole tree
//! (widgets, layouts, tab bars) can be exercised against the in-memory
//! `testing::FakeDriver` in a plain `#[test]`, and wired to a real
//! `WebSysDriver` only at the application's edge.

pub mod box_layout;
pub mod box_sizing;
pub mod flags;
pub mod focus_tracker;
pub mod layout;
pub mod messages;
pub mod split_layout;
pub mod stacked_layout;
pub mod tab_bar;
pub mod tab_panel;
pub mod title;
pub mod widget;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use box_layout::{BoxLayout, Orientation};
pub use flags::WidgetFlags;
pub use focus_tracker::{FocusChanged, FocusTracker, FocusTrackerRef};
pub use layout::{Layout, LayoutBase, LayoutItem, SizeLimits};
pub use messages::{
    AfterAttach, AfterDetach, AfterHide, AfterShow, BeforeAttach, BeforeDetach, BeforeHide,
    BeforeShow, ChildMessage, FitRequest, LayoutRequest, Resize, UpdateRequest,
};
pub use split_layout::SplitLayout;
pub use stacked_layout::StackedLayout;
pub use tab_bar::{TabBar, TabMoved};
pub use tab_panel::{TabPanel, CLASS_TAB_PANEL, TAB_BAR_HEIGHT};
pub use title::Title;
pub use widget::{Widget, WidgetError, WidgetRef};
