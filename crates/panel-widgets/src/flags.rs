//! Widget flag bitmask (spec §3's "Widget" flags).

use bitflags::bitflags;

bitflags! {
    /// `IsVisible` is deliberately absent — it is derived, never stored
    /// (spec §4.4: "`IsVisible` is derived, never directly set").
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WidgetFlags: u8 {
        const ATTACHED        = 0b0001;
        const HIDDEN          = 0b0010;
        const DISPOSED        = 0b0100;
        const DISALLOW_LAYOUT = 0b1000;
    }
}

impl Default for WidgetFlags {
    fn default() -> Self {
        WidgetFlags::empty()
    }
}
