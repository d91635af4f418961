//! Concrete message types for the widget lifecycle and layout protocol
//! (spec §4.4, §4.5).

use panel_core::Message;

use crate::widget::WidgetRef;

macro_rules! marker_message {
    ($name:ident, $type_tag:literal) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name;
        impl Message for $name {
            fn message_type(&self) -> &'static str {
                $type_tag
            }
        }
    };
}

marker_message!(BeforeAttach, "before-attach");
marker_message!(AfterAttach, "after-attach");
marker_message!(BeforeDetach, "before-detach");
marker_message!(AfterDetach, "after-detach");
marker_message!(BeforeShow, "before-show");
marker_message!(AfterShow, "after-show");
marker_message!(BeforeHide, "before-hide");
marker_message!(AfterHide, "after-hide");

/// Posted to a widget's layout to assign its geometry. `(-1, -1)` means
/// "rely on the node's own intrinsic dimensions" (spec §4.4).
#[derive(Debug, Clone, Copy)]
pub struct Resize {
    pub width: i32,
    pub height: i32,
}

impl Resize {
    pub const UNKNOWN: Resize = Resize { width: -1, height: -1 };
}

impl Message for Resize {
    fn message_type(&self) -> &'static str {
        "resize"
    }
}

/// Conflatable: a widget re-rendering itself many times in one frame
/// before the frame drains collapses to a single repaint.
#[derive(Debug, Clone, Copy)]
pub struct UpdateRequest;
impl Message for UpdateRequest {
    fn message_type(&self) -> &'static str {
        "update-request"
    }
    fn is_conflatable(&self) -> bool {
        true
    }
    fn conflate(&mut self, incoming: &dyn Message) -> bool {
        incoming.message_type() == "update-request"
    }
}

/// Conflatable for the same reason `update-request` is: re-measuring
/// size hints twice before a frame is wasted work once.
#[derive(Debug, Clone, Copy)]
pub struct FitRequest;
impl Message for FitRequest {
    fn message_type(&self) -> &'static str {
        "fit-request"
    }
    fn is_conflatable(&self) -> bool {
        true
    }
    fn conflate(&mut self, incoming: &dyn Message) -> bool {
        incoming.message_type() == "fit-request"
    }
}

/// Posted by a layout to its own parent layout when one of its items'
/// size hints changed and it needs to be re-measured in turn. Conflatable
/// "per (handler, type)" (spec §4.5) — the message loop's conflation is
/// already scoped per handler, so a plain marker type is all that's
/// needed here.
#[derive(Debug, Clone, Copy)]
pub struct LayoutRequest;
impl Message for LayoutRequest {
    fn message_type(&self) -> &'static str {
        "layout-request"
    }
    fn is_conflatable(&self) -> bool {
        true
    }
    fn conflate(&mut self, incoming: &dyn Message) -> bool {
        incoming.message_type() == "layout-request"
    }
}

/// A parent/child-tree mutation notification, delivered to the parent.
#[derive(Clone)]
pub enum ChildMessage<D: 'static> {
    Added(WidgetRef<D>),
    Removed(WidgetRef<D>),
    Shown(WidgetRef<D>),
    Hidden(WidgetRef<D>),
}

impl<D: 'static> std::fmt::Debug for ChildMessage<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            ChildMessage::Added(_) => "Added",
            ChildMessage::Removed(_) => "Removed",
            ChildMessage::Shown(_) => "Shown",
            ChildMessage::Hidden(_) => "Hidden",
        };
        write!(f, "ChildMessage::{kind}")
    }
}

impl<D: 'static> Message for ChildMessage<D> {
    fn message_type(&self) -> &'static str {
        match self {
            ChildMessage::Added(_) => "child-added",
            ChildMessage::Removed(_) => "child-removed",
            ChildMessage::Shown(_) => "child-shown",
            ChildMessage::Hidden(_) => "child-hidden",
        }
    }
}
