//! `wasm-bindgen-test` coverage of the widget attach/detach protocol
//! against a real document, run under `wasm-bindgen-test-runner` in a
//! headless browser. `src/widget.rs`'s own `#[cfg(test)]` module covers
//! the ordering contract (WID-P2) against the in-memory `FakeDriver`;
//! this file confirms the same contract holds once a real `WebSysDriver`
//! is doing the DOM insertion/removal.

#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;

use panel_core::{Hook, HandlerRef, ImmediateScheduler, Message, MessageLoop};
use panel_vdom::WebSysDriver;
use panel_widgets::Widget;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> web_sys::Document {
    web_sys::window().expect("browser window").document().expect("document")
}

struct RecordingHook {
    log: Rc<RefCell<Vec<(&'static str, usize)>>>,
    host: web_sys::Element,
}

impl Hook for RecordingHook {
    fn run(&self, _handler: &HandlerRef, msg: &dyn Message) -> bool {
        self.log
            .borrow_mut()
            .push((msg.message_type(), self.host.child_element_count() as usize));
        true
    }
}

/// WID-P2 against a real DOM: `before-attach` observes the host with no
/// children yet, `after-attach` observes the widget's node already
/// inserted.
#[wasm_bindgen_test]
fn wid_p2_attach_inserts_between_the_before_and_after_messages() {
    let document = document();
    let body = document.body().unwrap();
    let host: web_sys::Element = document.create_element("div").unwrap();
    body.append_child(&host).unwrap();

    let driver = WebSysDriver::new(document.clone());
    let ml = MessageLoop::new(Box::new(ImmediateScheduler));
    let widget = Widget::new(driver.create_element("span"), ml);

    let log = Rc::new(RefCell::new(Vec::new()));
    let handler = widget.clone() as HandlerRef;
    Widget::message_loop_handle(&widget).install_hook(
        &handler,
        Rc::new(RecordingHook { log: log.clone(), host: host.clone() }),
    );

    Widget::attach(&widget, &driver, &host.clone().into()).unwrap();

    assert_eq!(
        *log.borrow(),
        vec![("before-attach", 0), ("after-attach", 1)],
        "the widget's node must not be a child of host until after before-attach runs, \
         and must be one by the time after-attach runs"
    );

    Widget::detach(&widget, &driver, &host.clone().into());
    assert_eq!(host.child_element_count(), 0, "detach must remove the node from the live DOM");

    body.remove_child(&host).unwrap();
}
