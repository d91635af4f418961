//! Tab-bar identity for a widget (spec §3's "Title").

use std::rc::Rc;

use panel_core::{ids::ObjectId, signal, slot, Signal};

/// `{label, mnemonic, icon, caption, className, closable}` plus a
/// `changed` signal, identity-valued per spec §3.
///
/// `Title` owns its own `changed` signal rather than borrowing the
/// widget's `ObjectId`, because a title can be read and mutated before
/// the widget that owns it has been wrapped in an `Rc` (during
/// construction) — the signal's sender identity is the title's own
/// address, not the widget's.
pub struct Title {
    label: String,
    mnemonic: Option<char>,
    icon: Option<String>,
    caption: String,
    class_name: String,
    closable: bool,
    changed: Rc<Signal<()>>,
    self_id: ObjectId,
}

impl Default for Title {
    fn default() -> Self {
        // `self_id` is assigned from a dedicated per-title counter rather
        // than the address of `Title` itself: `Title` lives inline inside
        // `Widget`, not behind its own `Rc<RefCell<_>>`, so it has no
        // stable `Rc` address to derive an `ObjectId` from.
        thread_local! {
            static NEXT: std::cell::Cell<usize> = std::cell::Cell::new(1);
        }
        let id = NEXT.with(|c| {
            let id = c.get();
            c.set(id + 1);
            id
        });
        let self_id = ObjectId::from_raw(id);
        Self {
            label: String::new(),
            mnemonic: None,
            icon: None,
            caption: String::new(),
            class_name: String::new(),
            closable: false,
            changed: Signal::new(self_id),
            self_id,
        }
    }
}

impl Title {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        let label = label.into();
        if self.label != label {
            self.label = label;
            self.changed.emit(&());
        }
    }

    pub fn mnemonic(&self) -> Option<char> {
        self.mnemonic
    }

    pub fn set_mnemonic(&mut self, mnemonic: Option<char>) {
        if self.mnemonic != mnemonic {
            self.mnemonic = mnemonic;
            self.changed.emit(&());
        }
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn set_icon(&mut self, icon: Option<String>) {
        if self.icon != icon {
            self.icon = icon;
            self.changed.emit(&());
        }
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn set_caption(&mut self, caption: impl Into<String>) {
        let caption = caption.into();
        if self.caption != caption {
            self.caption = caption;
            self.changed.emit(&());
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn set_class_name(&mut self, class_name: impl Into<String>) {
        let class_name = class_name.into();
        if self.class_name != class_name {
            self.class_name = class_name;
            self.changed.emit(&());
        }
    }

    pub fn closable(&self) -> bool {
        self.closable
    }

    pub fn set_closable(&mut self, closable: bool) {
        if self.closable != closable {
            self.closable = closable;
            self.changed.emit(&());
        }
    }

    /// Fires whenever any field above changes value.
    pub fn changed(&self) -> &Rc<Signal<()>> {
        &self.changed
    }

    /// Connect to the `changed` signal. `receiver_alive` ties the binding
    /// to the caller's own lifetime (see `Widget::alive_token`) so a
    /// dropped receiver is skipped by `emit` without an explicit
    /// `disconnect`.
    pub fn on_changed(
        &self,
        receiver_id: ObjectId,
        receiver_alive: std::rc::Weak<()>,
        mut f: impl FnMut() + 'static,
    ) {
        self.changed.connect(receiver_id, receiver_alive, slot(move |_: &()| f()));
    }
}

impl Drop for Title {
    fn drop(&mut self) {
        signal::clear_data(self.self_id);
    }
}
