//! Planning and navigation integration tests
//!
//! Runs the full pipeline against in-process collaborators

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use route_narrator::{Error, Geocoder, Planner, extract};

mod common;

use common::{
    FakeGeocoder, FakeNarrator, FakeRouter, FakeSpeech, SEATTLE_NARRATIVE, options, planner_with,
    seattle_geocoder, seattle_route,
};

#[tokio::test]
async fn test_plan_extracts_waypoints_in_order() {
    let (planner, narrator) = planner_with(FakeNarrator::answering(SEATTLE_NARRATIVE));

    let session = planner.plan("Pioneer Square", "Fremont").await.unwrap();

    assert_eq!(session.start_label(), "Pioneer Square");
    assert_eq!(session.end_label(), "Fremont");
    assert_eq!(session.route().len(), 6);
    assert_eq!(session.narrative(), SEATTLE_NARRATIVE);
    assert_eq!(session.skipped(), 1);

    let waypoints = session.waypoints();
    assert_eq!(waypoints.len(), 3);
    assert!(waypoints[0].description().starts_with("Pike Place Market - One of the oldest"));
    assert!(!waypoints[0].description().contains("**"));
    assert_eq!(
        waypoints[1].description(),
        "The Space Needle offers panoramic views of the city."
    );
    assert!((waypoints[2].lat() - 47.6513).abs() < 1e-9);
    assert!((waypoints[2].lon() + 122.3470).abs() < 1e-9);

    let prompt = narrator.last_prompt().unwrap();
    assert!(prompt.starts_with("Generate 3 interesting points of interest"));
    assert!(prompt.contains("[47.60150, -122.33430]"));
}

#[tokio::test]
async fn test_plan_trims_location_names() {
    let (planner, _) = planner_with(FakeNarrator::answering(SEATTLE_NARRATIVE));

    let session = planner.plan("  Pioneer Square ", "Fremont\n").await.unwrap();
    assert_eq!(session.start_label(), "Pioneer Square");
    assert_eq!(session.end_label(), "Fremont");
}

#[tokio::test]
async fn test_plan_rejects_empty_locations() {
    let (planner, narrator) = planner_with(FakeNarrator::answering(SEATTLE_NARRATIVE));

    for (start, end) in [("", "Fremont"), ("Pioneer Square", "   "), ("", "")] {
        let result = planner.plan(start, end).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))), "{start:?} -> {end:?}");
    }
    assert!(narrator.last_prompt().is_none());
}

#[tokio::test]
async fn test_unknown_location_stops_before_routing() {
    let router = Arc::new(FakeRouter {
        points: Some(seattle_route()),
        calls: AtomicUsize::new(0),
    });
    let narrator = Arc::new(FakeNarrator::answering(SEATTLE_NARRATIVE));
    let planner = Planner::new(
        Arc::new(seattle_geocoder()),
        router.clone(),
        narrator.clone(),
        options(),
    );

    let result = planner.plan("Pioneer Square", "Atlantis").await;

    assert!(matches!(result, Err(Error::NotFound(_))));
    assert_eq!(router.calls.load(Ordering::SeqCst), 0);
    assert!(narrator.last_prompt().is_none());
}

#[tokio::test]
async fn test_routing_failure_propagates() {
    let planner = Planner::new(
        Arc::new(seattle_geocoder()),
        Arc::new(FakeRouter {
            points: None,
            calls: AtomicUsize::new(0),
        }),
        Arc::new(FakeNarrator::answering(SEATTLE_NARRATIVE)),
        options(),
    );

    let result = planner.plan("Pioneer Square", "Fremont").await;
    assert!(matches!(result, Err(Error::Routing(_))));
}

#[tokio::test]
async fn test_narrator_failure_propagates() {
    let (planner, _) = planner_with(FakeNarrator::failing());

    let result = planner.plan("Pioneer Square", "Fremont").await;
    assert!(matches!(result, Err(Error::Narrative(_))));
}

#[tokio::test]
async fn test_unformatted_answer_gives_empty_session() {
    let (planner, _) = planner_with(FakeNarrator::answering(
        "Sorry, I can't think of anything interesting along this route.",
    ));

    let mut session = planner.plan("Pioneer Square", "Fremont").await.unwrap();

    assert!(session.waypoints().is_empty());
    assert_eq!(session.skipped(), 0);
    assert!(session.step_forward(10).is_empty());
    assert_eq!(session.cursor().index(), 5);
}

#[tokio::test]
async fn test_navigation_triggers_along_route() {
    let (planner, _) = planner_with(FakeNarrator::answering(SEATTLE_NARRATIVE));
    let mut session = planner.plan("Pioneer Square", "Fremont").await.unwrap();

    assert!(session.reached_indices().is_empty());

    let fired: Vec<Vec<usize>> = (0..5).map(|_| session.step_forward(1)).collect();
    assert_eq!(fired, vec![vec![0], vec![], vec![1], vec![], vec![2]]);

    // Past the end the cursor stays put and the last waypoint fires again
    assert_eq!(session.step_forward(3), vec![2]);
    assert_eq!(session.cursor().index(), 5);

    assert_eq!(session.move_to(1).unwrap(), vec![0]);
    assert!(matches!(
        session.move_to(6),
        Err(Error::CursorOutOfRange { index: 6, len: 6 })
    ));
    assert_eq!(session.cursor().index(), 1);
}

#[tokio::test]
async fn test_audio_is_synthesized_once_per_waypoint() {
    let (planner, _) = planner_with(FakeNarrator::answering(SEATTLE_NARRATIVE));
    let mut session = planner.plan("Pioneer Square", "Fremont").await.unwrap();
    let speech = FakeSpeech::default();

    let reached = session.move_to(3).unwrap();
    assert_eq!(reached, vec![1]);

    for _ in 0..3 {
        let clip = session.audio_for(reached[0], &speech).await.unwrap();
        assert_eq!(clip.mime(), "audio/mpeg");
        assert_eq!(
            clip.bytes(),
            b"The Space Needle offers panoramic views of the city."
        );
    }
    assert_eq!(speech.calls.load(Ordering::SeqCst), 1);

    let summary = session.summary();
    assert!(!summary.waypoints[0].has_audio);
    assert!(summary.waypoints[1].has_audio);
    assert!(summary.waypoints[1].reached);
}

#[tokio::test]
async fn test_speech_failure_keeps_session_usable() {
    let (planner, _) = planner_with(FakeNarrator::answering(SEATTLE_NARRATIVE));
    let mut session = planner.plan("Pioneer Square", "Fremont").await.unwrap();
    let broken = FakeSpeech {
        fail: true,
        ..FakeSpeech::default()
    };

    session.move_to(1).unwrap();
    assert!(matches!(session.audio_for(0, &broken).await, Err(Error::Tts(_))));
    assert!(session.waypoints()[0].audio().is_none());

    // A later attempt with a working voice succeeds
    let speech = FakeSpeech::default();
    assert!(session.audio_for(0, &speech).await.is_ok());
    assert_eq!(session.step_forward(2), vec![1]);
}

#[tokio::test]
async fn test_failed_replan_keeps_current_session() {
    let (planner, _) = planner_with(FakeNarrator::answering(SEATTLE_NARRATIVE));
    let mut session = planner.plan("Pioneer Square", "Fremont").await.unwrap();
    session.move_to(3).unwrap();
    let id = session.id();

    if let Ok(replanned) = planner.plan("Pioneer Square", "Atlantis").await {
        session = replanned;
    }

    assert_eq!(session.id(), id);
    assert_eq!(session.cursor().index(), 3);

    let replanned = planner.plan("Fremont", "Pioneer Square").await.unwrap();
    assert_ne!(replanned.id(), id);
    assert_eq!(replanned.cursor().index(), 0);
}

#[tokio::test]
async fn test_summary_serializes() {
    let (planner, _) = planner_with(FakeNarrator::answering(SEATTLE_NARRATIVE));
    let session = planner.plan("Pioneer Square", "Fremont").await.unwrap();

    let json = serde_json::to_value(session.summary()).unwrap();
    assert_eq!(json["start"], "Pioneer Square");
    assert_eq!(json["route_points"], 6);
    assert_eq!(json["skipped"], 1);
    assert_eq!(json["waypoints"].as_array().map(Vec::len), Some(3));
    assert_eq!(json["waypoints"][2]["reached"], false);
}

#[tokio::test]
async fn test_suggest_through_planner() {
    let (planner, _) = planner_with(FakeNarrator::answering(SEATTLE_NARRATIVE));

    let places = planner.geocoder().suggest("frem", 5).await.unwrap();
    let names: Vec<&str> = places.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Fremont", "Fremont Bridge"]);

    let geocoder = FakeGeocoder::new(&[]);
    assert!(geocoder.suggest("anything", 5).await.unwrap().is_empty());
}

#[test]
fn test_extract_matches_planned_waypoints() {
    let extraction = extract(SEATTLE_NARRATIVE);
    assert_eq!(extraction.waypoints.len(), 3);
    assert_eq!(extraction.skipped, 1);
}
