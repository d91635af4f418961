//! The cooperative message loop: synchronous `send`, queued/conflated
//! `post`, interception hooks, and frame-based draining.
//!
//! The queue, the hook chains, and the scheduler together give ordering
//! and conflation guarantees exercised by this module's test suite.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use crate::ids::ObjectId;
use crate::scheduler::Scheduler;

/// Anything a message can carry: a `type` tag plus the ability to absorb a
/// same-typed, conflatable message that is about to be queued behind it.
///
/// `conflate` is deliberately a method on the message, not the loop — the
/// loop only ever calls it on the *already-queued* message, passing the
/// *incoming* one, which is what lets a "stateful" message subclass (one
/// that accumulates payload, e.g. a repaint region) win over a plain
/// marker message of the same type.
pub trait Message: std::fmt::Debug + std::any::Any {
    /// The message's `type` tag. Two messages conflate only if their types
    /// match.
    fn message_type(&self) -> &'static str;

    /// Whether this message may be merged with an equal-typed queued
    /// message instead of being appended as a new entry.
    fn is_conflatable(&self) -> bool {
        false
    }

    /// Called on an already-queued message with the message about to be
    /// posted behind it. Return `true` to absorb the incoming message (it
    /// is then dropped); `false` to leave both queued.
    fn conflate(&mut self, _incoming: &dyn Message) -> bool {
        false
    }
}

/// Any object the loop can deliver a message to.
///
/// The loop never introspects a handler beyond this one method.
pub trait Handler {
    fn process_message(&mut self, msg: &dyn Message);
}

/// Shared ownership handle for a handler, and the unit of identity the
/// loop keys hooks and queue entries on (see [`ObjectId::of`]).
pub type HandlerRef = Rc<RefCell<dyn Handler>>;

/// A pre-dispatch filter bound to one handler.
///
/// Returning `false` vetoes delivery of `msg` to `handler` for this single
/// message — no later hook, and not the handler itself, sees it.
pub trait Hook {
    fn run(&self, handler: &HandlerRef, msg: &dyn Message) -> bool;
}

pub type HookRef = Rc<dyn Hook>;

/// One link in a handler's hook chain.
///
/// `hook: None` is a tombstone — `remove_hook` during dispatch only ever
/// nulls this field, never unlinks `next`, so a traversal already holding
/// a clone of this node is unaffected by removal racing underneath it.
struct HookNode {
    hook: Option<HookRef>,
    next: Option<Rc<RefCell<HookNode>>>,
}

enum QueueSlot {
    Entry {
        handler: HandlerRef,
        handler_id: ObjectId,
        message: Box<dyn Message>,
    },
    /// Left behind by `clear_message_data`; the FIFO slot stays so indices
    /// after it don't shift, but nothing is delivered.
    Canceled,
    /// Marks the end of one drainable round.
    Sentinel,
}

/// The message loop itself.
///
/// Always held as `Rc<MessageLoop>` — frame scheduling needs to hand a
/// `'static` callback to the scheduler, and that callback closes over a
/// `Weak<MessageLoop>` to avoid a reference cycle through the scheduler.
pub struct MessageLoop {
    scheduler: Box<dyn Scheduler>,
    hooks: RefCell<HashMap<ObjectId, Rc<RefCell<HookNode>>>>,
    queue: RefCell<VecDeque<QueueSlot>>,
    frame_pending: Cell<bool>,
}

impl MessageLoop {
    pub fn new(scheduler: Box<dyn Scheduler>) -> Rc<Self> {
        Rc::new(Self {
            scheduler,
            hooks: RefCell::new(HashMap::new()),
            queue: RefCell::new(VecDeque::new()),
            frame_pending: Cell::new(false),
        })
    }

    /// Deliver `msg` to `handler` synchronously, running installed hooks
    /// first. Never panics: a panic inside a hook or the handler is caught
    /// and logged (see module docs), and dispatch still proceeds as if
    /// that hook had returned `true`.
    pub fn send(&self, handler: &HandlerRef, msg: &dyn Message) {
        self.dispatch(handler, msg);
    }

    /// Queue `msg` for `handler`. Conflatable messages are merged into an
    /// already-queued, conflatable, same-typed entry for the same handler
    /// if one exists and accepts the merge; otherwise the message is
    /// appended. Appending always requests a frame.
    pub fn post(self: &Rc<Self>, handler: &HandlerRef, message: Box<dyn Message>) {
        let handler_id = ObjectId::of(handler);

        if message.is_conflatable() {
            let msg_type = message.message_type();
            let mut queue = self.queue.borrow_mut();
            for slot in queue.iter_mut() {
                if let QueueSlot::Entry {
                    handler_id: existing_id,
                    message: existing,
                    ..
                } = slot
                {
                    if *existing_id == handler_id
                        && existing.message_type() == msg_type
                        && existing.is_conflatable()
                        && existing.conflate(message.as_ref())
                    {
                        return;
                    }
                }
            }
            queue.push_back(QueueSlot::Entry {
                handler: handler.clone(),
                handler_id,
                message,
            });
        } else {
            self.queue.borrow_mut().push_back(QueueSlot::Entry {
                handler: handler.clone(),
                handler_id,
                message,
            });
        }

        self.schedule_frame();
    }

    /// Prepend `hook` to `handler`'s chain, first tombstoning any node
    /// already holding an identical (`Rc::ptr_eq`) hook so the freshly
    /// installed one is the only live copy and runs first.
    pub fn install_hook(&self, handler: &HandlerRef, hook: HookRef) {
        let handler_id = ObjectId::of(handler);
        let mut hooks = self.hooks.borrow_mut();
        let head = hooks.get(&handler_id).cloned();

        let mut cursor = head.clone();
        while let Some(node) = cursor {
            let mut node_mut = node.borrow_mut();
            if node_mut
                .hook
                .as_ref()
                .is_some_and(|existing| Rc::ptr_eq(existing, &hook))
            {
                node_mut.hook = None;
            }
            cursor = node_mut.next.clone();
        }

        let new_head = Rc::new(RefCell::new(HookNode {
            hook: Some(hook),
            next: head,
        }));
        hooks.insert(handler_id, new_head);
    }

    /// Tombstone the node holding `hook` in `handler`'s chain, if any.
    /// Safe to call while a dispatch is traversing the same chain.
    pub fn remove_hook(&self, handler: &HandlerRef, hook: &HookRef) {
        let handler_id = ObjectId::of(handler);
        let head = self.hooks.borrow().get(&handler_id).cloned();
        let mut cursor = head;
        while let Some(node) = cursor {
            let mut node_mut = node.borrow_mut();
            if node_mut
                .hook
                .as_ref()
                .is_some_and(|existing| Rc::ptr_eq(existing, hook))
            {
                node_mut.hook = None;
                return;
            }
            cursor = node_mut.next.clone();
        }
    }

    /// Tombstone every hook on `handler`'s chain, drop the chain from the
    /// map, and cancel every queued entry addressed to `handler` (the slot
    /// stays in the queue so FIFO positions of other entries don't move).
    pub fn clear_message_data(&self, handler: &HandlerRef) {
        let handler_id = ObjectId::of(handler);
        if let Some(head) = self.hooks.borrow_mut().remove(&handler_id) {
            let mut cursor = Some(head);
            while let Some(node) = cursor {
                let mut node_mut = node.borrow_mut();
                node_mut.hook = None;
                cursor = node_mut.next.clone();
            }
        }

        for slot in self.queue.borrow_mut().iter_mut() {
            let is_match = matches!(slot, QueueSlot::Entry { handler_id: id, .. } if *id == handler_id);
            if is_match {
                *slot = QueueSlot::Canceled;
            }
        }
    }

    /// Number of live (non-canceled, non-sentinel) entries currently
    /// queued. Exposed for tests exercising conflation/FIFO behavior.
    pub fn queue_len(&self) -> usize {
        self.queue
            .borrow()
            .iter()
            .filter(|s| matches!(s, QueueSlot::Entry { .. }))
            .count()
    }

    fn schedule_frame(self: &Rc<Self>) {
        if self.frame_pending.replace(true) {
            return;
        }
        let weak = Rc::downgrade(self);
        self.scheduler.request_frame(Box::new(move || {
            if let Some(this) = weak.upgrade() {
                this.drain_frame();
            }
        }));
    }

    /// Append a sentinel and drain every entry up to and including it.
    /// Entries posted by handlers run during this drain land after the
    /// sentinel and are left for the next frame.
    fn drain_frame(self: &Rc<Self>) {
        self.frame_pending.set(false);
        self.queue.borrow_mut().push_back(QueueSlot::Sentinel);

        loop {
            let slot = self.queue.borrow_mut().pop_front();
            match slot {
                Some(QueueSlot::Sentinel) | None => break,
                Some(QueueSlot::Canceled) => continue,
                Some(QueueSlot::Entry {
                    handler, message, ..
                }) => {
                    self.dispatch(&handler, message.as_ref());
                }
            }
        }
    }

    fn dispatch(&self, handler: &HandlerRef, msg: &dyn Message) {
        let handler_id = ObjectId::of(handler);
        let mut cursor = self.hooks.borrow().get(&handler_id).cloned();

        while let Some(node) = cursor {
            let (hook, next) = {
                let node_ref = node.borrow();
                (node_ref.hook.clone(), node_ref.next.clone())
            };
            cursor = next;

            let Some(hook) = hook else { continue };
            let veto = panic::catch_unwind(AssertUnwindSafe(|| hook.run(handler, msg)));
            match veto {
                Ok(true) => continue,
                Ok(false) => return,
                Err(_) => {
                    log::error!("panel-core: message hook panicked; treating as pass-through");
                    continue;
                }
            }
        }

        let result =
            panic::catch_unwind(AssertUnwindSafe(|| handler.borrow_mut().process_message(msg)));
        if result.is_err() {
            log::error!("panel-core: handler panicked while processing {msg:?}");
        }
    }
}
