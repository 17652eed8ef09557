// Host-side tests for backend response parsing and stem mapping.

use std::collections::HashMap;
use synesthesia_core::{
    Archetype, EngineConfig, SeparationResponse, SessionError, StemKind, StemSet, VisualMapping,
    ALL_STEMS,
};

#[test]
fn parses_success_with_nulls_and_unknowns() {
    let body = r#"{
        "success": true,
        "cached": true,
        "stems": {"drums": "/s/d.wav", "bass": "", "vocals": null, "other": "/s/o.wav"}
    }"#;
    let stems = SeparationResponse::from_json(body).unwrap().into_stems().unwrap();
    assert_eq!(stems.len(), 1);
    assert_eq!(stems.url(StemKind::Drums), Some("/s/d.wav"));
    assert!(!stems.contains(StemKind::Bass));
    assert!(stems.cached);
    assert!(!stems.is_demo);
}

#[test]
fn failure_without_reason_still_reports() {
    let resp = SeparationResponse::from_json(r#"{"success": false}"#).unwrap();
    match resp.into_stems() {
        Err(SessionError::Backend(reason)) => assert_eq!(reason, "unknown error"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn stem_set_builder_drops_empty_urls() {
    let set = StemSet::new()
        .with(StemKind::Guitar, "g.wav")
        .with(StemKind::Drums, "d.wav")
        .with(StemKind::Piano, "");
    assert_eq!(
        set.kinds().collect::<Vec<_>>(),
        vec![StemKind::Drums, StemKind::Guitar]
    );
}

#[test]
fn pruning_keeps_only_assets_of_the_current_track() {
    let mut cache: HashMap<String, u32> = HashMap::new();
    for url in ["old/d.wav", "old/b.wav", "new/d.wav"] {
        cache.insert(url.to_string(), 0);
    }
    let next = StemSet::new()
        .with(StemKind::Drums, "new/d.wav")
        .with(StemKind::Vocals, "new/v.wav");
    assert_eq!(next.urls().collect::<Vec<_>>(), vec!["new/d.wav", "new/v.wav"]);

    assert_eq!(next.prune_cache(&mut cache), 2);
    assert_eq!(cache.len(), 1);
    assert!(cache.contains_key("new/d.wav"));

    // A failed load leaves an empty set, which empties the cache.
    assert_eq!(StemSet::new().prune_cache(&mut cache), 1);
    assert!(cache.is_empty());
}

#[test]
fn stem_names_round_trip_with_aliases() {
    for stem in ALL_STEMS {
        assert_eq!(stem.key().parse::<StemKind>().unwrap(), stem);
        assert_eq!(stem.short_label().len(), 3);
    }
    assert_eq!("vocal".parse::<StemKind>().unwrap(), StemKind::Vocals);
    assert_eq!("Drum".parse::<StemKind>().unwrap(), StemKind::Drums);
}

#[test]
fn mapping_fills_gaps_but_keeps_choices() {
    let mut mapping = VisualMapping::empty();
    mapping.set(StemKind::Bass, Archetype::Orb);
    mapping.ensure_for_stems([StemKind::Bass, StemKind::Guitar]);
    assert_eq!(mapping.get(StemKind::Bass), Archetype::Orb);
    assert_eq!(mapping.get(StemKind::Guitar), Archetype::ShardCluster);
    assert!(!mapping.contains(StemKind::Piano));
    assert_eq!(VisualMapping::default().get(StemKind::Piano), Archetype::StackedBar);
}

#[test]
fn backend_endpoints_follow_base_url() {
    let config = EngineConfig::default().with_backend_url("https://stems.example/");
    assert_eq!(config.separate_endpoint(), "https://stems.example/separate");
    assert_eq!(config.link_endpoint(), "https://stems.example/process-youtube");
}
