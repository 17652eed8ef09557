// Host-side tests for the channel registry lifecycle.

mod common;

use common::FakeGraph;
use synesthesia_core::{ChannelId, ChannelRegistry};

#[test]
fn empty_url_is_not_present() {
    let (graph, ledger) = FakeGraph::new();
    let mut registry = ChannelRegistry::new(graph);
    assert!(registry.load_track("vocals-0".into(), "").unwrap().is_none());
    assert!(registry.load_track("piano-0".into(), "   ").unwrap().is_none());
    assert!(registry.is_empty());
    assert_eq!(ledger.borrow().live_players, 0);
}

#[test]
fn one_channel_per_id() {
    let (graph, ledger) = FakeGraph::new();
    let mut registry = ChannelRegistry::new(graph);
    registry.load_track("drums-0".into(), "a.wav").unwrap();
    registry.load_track("drums-0".into(), "b.wav").unwrap();
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get(&"drums-0".into()).unwrap().source_url, "b.wav");
    let l = ledger.borrow();
    assert_eq!(l.live_players, 1);
    assert_eq!(l.live_meters, 1);
}

#[test]
fn dispose_then_reload_leaks_nothing() {
    let (graph, ledger) = FakeGraph::new();
    let mut registry = ChannelRegistry::new(graph);
    for (id, url) in [("drums-0", "a"), ("bass-0", "b"), ("vocals-0", "c"), ("guitar-0", "d")] {
        registry.load_track(id.into(), url).unwrap();
    }
    assert_eq!(ledger.borrow().live_players, 4);

    registry.dispose_all();
    assert_eq!(ledger.borrow().live_players, 0);
    assert_eq!(ledger.borrow().live_meters, 0);

    let next = [("drums-0", "x"), ("bass-0", ""), ("piano-0", "z")];
    for (id, url) in next {
        registry.load_track(id.into(), url).unwrap();
    }
    let non_empty = next.iter().filter(|(_, u)| !u.is_empty()).count();
    assert_eq!(ledger.borrow().live_players, non_empty);
    assert_eq!(registry.len(), non_empty);
    assert_eq!(
        registry.ids(),
        vec![ChannelId::from("drums-0"), ChannelId::from("piano-0")]
    );
}

#[test]
fn remove_disposes_one_channel() {
    let (graph, ledger) = FakeGraph::new();
    let mut registry = ChannelRegistry::new(graph);
    registry.load_track("drums-0".into(), "a").unwrap();
    registry.load_track("bass-0".into(), "b").unwrap();
    assert!(registry.remove(&"drums-0".into()));
    assert!(!registry.remove(&"drums-0".into()));
    assert_eq!(ledger.borrow().live_players, 1);
    assert!(registry.contains(&"bass-0".into()));
}

#[test]
fn start_all_uses_one_timestamp() {
    let (graph, ledger) = FakeGraph::new();
    let mut registry = ChannelRegistry::new(graph);
    registry.load_track("drums-0".into(), "a").unwrap();
    registry.load_track("bass-0".into(), "b").unwrap();
    let at = registry.start_time(0.1);
    assert!((at - 10.1).abs() < 1e-9);
    registry.start_all(at);
    let l = ledger.borrow();
    assert_eq!(l.started.len(), 2);
    assert!(l.started.iter().all(|(_, t)| *t == at));
}

#[test]
fn dropping_the_registry_releases_handles() {
    let (graph, ledger) = FakeGraph::new();
    {
        let mut registry = ChannelRegistry::new(graph);
        registry.load_track("drums-0".into(), "a").unwrap();
    }
    assert_eq!(ledger.borrow().live_players, 0);
}
