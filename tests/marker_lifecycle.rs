use markspan::prelude::*;
use markspan::view::normalize_line_endings;

const NOTES: &str = include_str!("fixtures/notes.md");
const NOTES_MARKERS: &str = include_str!("fixtures/notes.markers.json");

fn covered(text: &str, marker: &Marker) -> String {
    text.chars()
        .skip(marker.start)
        .take(marker.end - marker.start)
        .collect()
}

fn load(markdown: &str, mode: ViewMode) -> MarkerCoordinator {
    let seeds: Vec<MarkerSeed> = serde_json::from_str(NOTES_MARKERS).unwrap();
    let mut coordinator =
        MarkerCoordinator::new(Editor::new("", mode, 80), CoordinatorOptions::default());
    coordinator.set_value_with_markers(markdown, &seeds).unwrap();
    coordinator.take_updates();
    coordinator
}

fn active_text(coordinator: &MarkerCoordinator) -> String {
    coordinator
        .editor()
        .adapter(coordinator.active_mode())
        .text_content()
}

#[test]
fn test_fixture_markers_cover_expected_words() {
    let coordinator = load(NOTES, ViewMode::Source);
    let text = active_text(&coordinator);
    let words: Vec<(String, String)> = coordinator
        .markers()
        .iter()
        .map(|m| (m.id.to_string(), covered(&text, m)))
        .collect();
    assert_eq!(
        words,
        vec![
            ("title".to_string(), "Release notes".to_string()),
            ("7".to_string(), "Rope::insert".to_string()),
            ("marker-1".to_string(), "preview".to_string()),
        ]
    );
}

#[test]
fn test_markers_follow_external_edit() {
    let mut coordinator = load(NOTES, ViewMode::Source);
    let edited = NOTES.replace("## Fixes", "## Fixes and cleanups");
    coordinator.editor_mut().replace_all(&edited);
    coordinator.pump(0);
    coordinator.pump(1_000);

    let updates = coordinator.take_updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].reason, UpdateReason::Reconciled);

    let text = active_text(&coordinator);
    let words: Vec<String> = coordinator
        .markers()
        .iter()
        .map(|m| covered(&text, m))
        .collect();
    assert_eq!(words, vec!["Release notes", "Rope::insert", "preview"]);
}

#[test]
fn test_crlf_document_gets_identical_offsets() {
    let crlf = NOTES.replace('\n', "\r\n");
    let lf = load(NOTES, ViewMode::Source);
    let crlf = load(&crlf, ViewMode::Source);
    assert_eq!(active_text(&lf), active_text(&crlf));

    let spans = |c: &MarkerCoordinator| -> Vec<(usize, usize)> {
        c.markers().iter().map(|m| (m.start, m.end)).collect()
    };
    assert_eq!(spans(&lf), spans(&crlf));
}

#[test]
fn test_export_serializes_string_ids() {
    let mut coordinator = load(NOTES, ViewMode::Source);
    let data = coordinator.export_markers();
    let json: serde_json::Value = serde_json::to_value(&data).unwrap();
    assert_eq!(json[1]["id"], "7");
    assert_eq!(json[1]["start"], 58);

    let reloaded: Vec<MarkerSeed> = serde_json::from_value(json).unwrap();
    let mut again = load(NOTES, ViewMode::Source);
    let markers = again.set_value_with_markers(NOTES, &reloaded).unwrap();
    assert_eq!(markers.len(), 3);
}

#[test]
fn test_export_round_trip_in_rich_text_with_inline_code() {
    let mut coordinator = load(NOTES, ViewMode::RichText);
    let text = active_text(&coordinator);
    let words: Vec<String> = coordinator
        .markers()
        .iter()
        .map(|m| covered(&text, m))
        .collect();
    assert_eq!(words, vec!["Release notes", "Rope::insert", "preview"]);

    let spans: Vec<(String, usize, usize)> = coordinator
        .export_markers()
        .into_iter()
        .map(|d| (d.id.to_string(), d.start, d.end))
        .collect();
    assert_eq!(
        spans,
        vec![
            ("title".to_string(), 2, 15),
            ("7".to_string(), 58, 70),
            ("marker-1".to_string(), 121, 128),
        ]
    );
}

#[test]
fn test_fixture_markers_survive_every_view() {
    let mut coordinator = load(NOTES, ViewMode::Source);
    for mode in [
        ViewMode::RichText,
        ViewMode::Source,
        ViewMode::RenderOnly,
        ViewMode::Source,
    ] {
        coordinator.editor_mut().change_mode(mode);
        coordinator.pump(0);
        let text = active_text(&coordinator);
        let words: Vec<String> = coordinator
            .markers()
            .iter()
            .map(|m| covered(&text, m))
            .collect();
        assert_eq!(
            words,
            vec!["Release notes", "Rope::insert", "preview"],
            "in {mode:?}"
        );
    }
}

#[test]
fn test_rejects_negative_offsets_from_json() {
    let seeds: Vec<MarkerSeed> =
        serde_json::from_str(r#"[{"id": "bad", "start": -3, "end": 2}]"#).unwrap();
    let mut coordinator = MarkerCoordinator::new(
        Editor::new("", ViewMode::Source, 80),
        CoordinatorOptions::default(),
    );
    let err = coordinator.set_value_with_markers("text", &seeds).unwrap_err();
    assert_eq!(err, MarkerError::InvalidRange { start: -3, end: 2 });
    assert_eq!(err.to_string(), "invalid marker range -3..2");
}

#[test]
fn test_authoring_in_rich_text_and_exporting_source_offsets() {
    let markdown = "# Plan\n\nShip the first draft";
    let mut coordinator = MarkerCoordinator::new(
        Editor::new(markdown, ViewMode::RichText, 80),
        CoordinatorOptions::default(),
    );
    // Rich text is "PlanShip the first draft"
    let marker = coordinator
        .add_marker_at_range(4, 8, Some(MarkerId::from("ship")))
        .unwrap()
        .unwrap();
    assert_eq!(covered(&active_text(&coordinator), &marker), "Ship");

    let data = coordinator.export_markers();
    let source = normalize_line_endings(markdown);
    let exported: String = source
        .chars()
        .skip(data[0].start)
        .take(data[0].end - data[0].start)
        .collect();
    assert_eq!(exported, "Ship");
}

#[test]
fn test_view_switches_keep_marker_on_its_word() {
    let markdown = "# Plan\n\nShip the draft";
    let mut coordinator = MarkerCoordinator::new(
        Editor::new(markdown, ViewMode::Source, 80),
        CoordinatorOptions::default(),
    );
    coordinator
        .add_marker_at_range(15, 20, Some(MarkerId::from("draft")))
        .unwrap();

    for mode in [
        ViewMode::RichText,
        ViewMode::RenderOnly,
        ViewMode::Source,
        ViewMode::RichText,
    ] {
        coordinator.editor_mut().change_mode(mode);
        coordinator.pump(0);
        let marker = coordinator.get_marker(&MarkerId::from("draft")).unwrap();
        assert_eq!(
            covered(&active_text(&coordinator), marker),
            "draft",
            "in {mode:?}"
        );
    }
}
