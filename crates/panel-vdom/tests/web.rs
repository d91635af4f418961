//! `wasm-bindgen-test` coverage of the `WebSysDriver`-backed reconciler
//! path against a real document, run under `wasm-bindgen-test-runner` in
//! a headless browser. The in-memory `FakeDriver` suite in `src/tests.rs`
//! covers the diff algorithm itself; this file exists to confirm the
//! `WebSysDriver` wiring behaves the same way against real DOM nodes,
//! specifically scenario 3 (focus survives a keyed move) which only
//! means something with a real `document.activeElement`.

#![cfg(target_arch = "wasm32")]

use panel_vdom::{Mount, Reconciler, VNode, WebSysDriver};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> web_sys::Document {
    web_sys::window().expect("browser window").document().expect("document")
}

/// Spec §8 scenario 3: render two keyed inputs, focus the first, swap
/// their order, and confirm the DOM node that held focus (not the key it
/// started at) is still focused afterwards.
#[wasm_bindgen_test]
fn scenario_3_vdom_move_preserves_focus() {
    let document = document();
    let body = document.body().expect("document body");
    let host = document.create_element("div").unwrap();
    body.append_child(&host).unwrap();

    let driver = WebSysDriver::new(document.clone());
    let reconciler = Reconciler::new(driver);
    let mut mount = Mount::new(host.clone().into());

    let first = vec![
        VNode::element("input").key("q").build(),
        VNode::element("input").key("r").build(),
    ];
    reconciler.render(&mut mount, &first);

    let first_child = host.first_element_child().expect("first input");
    let html_el: &web_sys::HtmlElement = first_child.unchecked_ref();
    html_el.focus().unwrap();
    assert!(document
        .active_element()
        .map(|active| active.is_same_node(Some(&first_child)))
        .unwrap_or(false));

    let second = vec![
        VNode::element("input").key("r").build(),
        VNode::element("input").key("q").build(),
    ];
    reconciler.render(&mut mount, &second);

    let active = document.active_element().expect("still an active element");
    assert!(
        active.is_same_node(Some(&first_child)),
        "focus must stay on key `q`'s node after it moves to the second slot"
    );
    assert!(host.last_element_child().unwrap().is_same_node(Some(&active)));

    body.remove_child(&host).unwrap();
}

/// VDOM-P1: re-rendering the identical tree reference is a no-op —
/// confirmed here against real nodes by checking the host's live
/// `children` collection is untouched (same nodes, same order).
#[wasm_bindgen_test]
fn vdom_p1_round_trip_touches_nothing() {
    let document = document();
    let host = document.create_element("div").unwrap();

    let driver = WebSysDriver::new(document);
    let reconciler = Reconciler::new(driver);
    let mut mount = Mount::new(host.clone().into());

    let tree = vec![VNode::element("span").key("a").build(), VNode::element("span").key("b").build()];
    reconciler.render(&mut mount, &tree);
    let before: Vec<_> = (0..host.children().length())
        .map(|i| host.children().item(i).unwrap())
        .collect();

    reconciler.render(&mut mount, &tree);
    let after: Vec<_> = (0..host.children().length())
        .map(|i| host.children().item(i).unwrap())
        .collect();

    assert_eq!(before.len(), after.len());
    for (a, b) in before.iter().zip(after.iter()) {
        assert!(a.is_same_node(Some(b)));
    }
}
