use std::cell::RefCell;
use std::rc::Rc;

use showreel::{
    Anchor, Document, Element, Rect, TriggerCallbacks, TriggerRegistry, TriggerSpec, Viewport,
};

type Log = Rc<RefCell<Vec<String>>>;

fn stacked_sections(n: usize) -> (Document, Vec<showreel::ElementId>) {
    let mut doc = Document::new();
    let ids = (0..n)
        .map(|i| {
            let y = i as f64 * 1000.0;
            doc.append(None, Element::new("section", Rect::new(0.0, y, 1000.0, y + 1000.0)))
                .unwrap()
        })
        .collect();
    (doc, ids)
}

fn centered(el: showreel::ElementId) -> TriggerSpec {
    TriggerSpec::element(el)
        .start("top center".parse().unwrap())
        .end("bottom center".parse().unwrap())
}

fn entering(log: &Log, name: &str) -> TriggerCallbacks {
    let (a, b) = (log.clone(), log.clone());
    let (n1, n2) = (name.to_owned(), name.to_owned());
    TriggerCallbacks::default()
        .on_enter(move |_| a.borrow_mut().push(n1.clone()))
        .on_enter_back(move |_| b.borrow_mut().push(n2.clone()))
}

#[test]
fn jumps_dispatch_in_crossing_order() {
    let (doc, ids) = stacked_sections(3);
    let reg = TriggerRegistry::new(Viewport::new(1000.0, 800.0).unwrap());
    let log: Log = Rc::default();
    let _handles: Vec<_> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            reg.register(&doc, centered(*id), entering(&log, &format!("s{i}")))
                .unwrap()
        })
        .collect();

    reg.sync();
    assert_eq!(*log.borrow(), vec!["s0"]);

    log.borrow_mut().clear();
    reg.update(2200.0);
    assert_eq!(*log.borrow(), vec!["s1", "s2"]);

    log.borrow_mut().clear();
    reg.update(0.0);
    assert_eq!(*log.borrow(), vec!["s1", "s0"]);
}

#[test]
fn dropping_handles_stops_callbacks() {
    let (doc, ids) = stacked_sections(1);
    let reg = TriggerRegistry::new(Viewport::default());
    let log: Log = Rc::default();
    let h = reg
        .register(&doc, centered(ids[0]), entering(&log, "s0"))
        .unwrap();
    drop(h);
    assert!(reg.is_empty());
    reg.update(500.0);
    reg.update(0.0);
    assert!(log.borrow().is_empty());
}

#[test]
fn registry_outlived_by_handle_is_harmless() {
    let (doc, ids) = stacked_sections(1);
    let reg = TriggerRegistry::new(Viewport::default());
    let h = reg
        .register(&doc, centered(ids[0]), TriggerCallbacks::default())
        .unwrap();
    drop(reg);
    h.kill();
}

#[test]
fn page_trigger_spans_the_scrollable_range() {
    let (doc, _) = stacked_sections(4);
    let reg = TriggerRegistry::new(Viewport::new(1000.0, 800.0).unwrap());
    let seen: Rc<RefCell<Vec<f64>>> = Rc::default();
    let s = seen.clone();
    let h = reg
        .register(
            &doc,
            TriggerSpec::page()
                .start(Anchor::Absolute(0.0))
                .end("bottom bottom".parse().unwrap()),
            TriggerCallbacks::default().on_update(move |snap| s.borrow_mut().push(snap.progress)),
        )
        .unwrap();
    assert_eq!(reg.thresholds(h.id()), Some((0.0, 3200.0)));
    reg.update(1600.0);
    reg.update(3200.0);
    assert_eq!(*seen.borrow(), vec![0.5, 1.0]);
}
