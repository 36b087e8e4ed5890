use super::*;
use crate::dom::{Caret, ContentEditable, Document, KeyEvent, NodeId};
use crate::templates::{FileTemplateStore, MemoryTemplateStore, TemplateCache, TemplateMap};

const SIG: &str = "Best regards,\nAlex";

fn engine_with(entries: &[(&str, &str)]) -> ExpansionEngine {
    let templates: TemplateMap = entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ExpansionEngine::new(
        TemplateCache::with_snapshot(templates),
        ExpansionSettings::default(),
    )
}

fn editable_div(doc: &mut Document) -> NodeId {
    let root = doc.root();
    let div = doc.append_element(root, "div");
    doc.set_content_editable(div, ContentEditable::True);
    div
}

fn space(target: NodeId) -> KeyEvent {
    KeyEvent::new(" ", target)
}

// ============================================================================
// Flat surfaces
// ============================================================================

#[test]
fn test_flat_expansion_scenario() {
    let engine = engine_with(&[("sig", SIG)]);
    let mut doc = Document::new();
    let root = doc.root();
    let area = doc.append_textarea(root, "hello #sig");

    let mut event = space(area);
    let outcome = engine.handle_key_event(&mut doc, &mut event);

    assert_eq!(
        outcome,
        ExpansionOutcome::Expanded(Expansion {
            token: "sig".to_string(),
            surface: ExpandedSurface::Flat,
            target: area,
            caret_offset: 25,
        })
    );
    let state = doc.control(area).expect("textarea state");
    assert_eq!(state.value, "hello Best regards,\nAlex ");
    assert_eq!((state.selection_start, state.selection_end), (25, 25));
    assert!(event.default_prevented());
    assert_eq!(doc.input_events().len(), 1);
    assert_eq!(doc.input_events()[0].target, area);
    assert!(doc.input_events()[0].bubbles);
}

#[test]
fn test_flat_expansion_mid_buffer_keeps_tail() {
    let engine = engine_with(&[("sig", "S")]);
    let mut doc = Document::new();
    let root = doc.root();
    let input = doc.append_input(root, Some("text"), "a #sig b");
    if let Some(state) = doc.control_mut(input) {
        state.selection_start = 6;
        state.selection_end = 6;
    }

    let mut event = space(input);
    assert!(engine.handle_key_event(&mut doc, &mut event).is_expanded());
    let state = doc.control(input).expect("input state");
    assert_eq!(state.value, "a S  b");
    assert_eq!(state.selection_start, 4);
}

#[test]
fn test_unknown_token_leaves_surface_untouched() {
    let engine = engine_with(&[("sig", SIG)]);
    let mut doc = Document::new();
    let root = doc.root();
    let area = doc.append_textarea(root, "hi #greeting");

    let mut event = space(area);
    let outcome = engine.handle_key_event(&mut doc, &mut event);

    assert_eq!(
        outcome,
        ExpansionOutcome::Skipped(SkipReason::UnknownToken("greeting".to_string()))
    );
    assert_eq!(doc.control(area).map(|c| c.value.as_str()), Some("hi #greeting"));
    assert!(!event.default_prevented());
    assert!(doc.input_events().is_empty());
}

#[test]
fn test_non_trigger_key_is_ignored() {
    let engine = engine_with(&[("sig", SIG)]);
    let mut doc = Document::new();
    let root = doc.root();
    let area = doc.append_textarea(root, "#sig");

    let mut event = KeyEvent::new("Enter", area);
    assert_eq!(
        engine.handle_key_event(&mut doc, &mut event),
        ExpansionOutcome::Skipped(SkipReason::NotTriggerKey("Enter".to_string()))
    );
    assert!(!event.default_prevented());
}

#[test]
fn test_custom_trigger_key() {
    let templates = TemplateCache::with_snapshot(
        [("sig".to_string(), "S".to_string())].into_iter().collect(),
    );
    let settings = ExpansionSettings {
        trigger_key: "Tab".to_string(),
        ..ExpansionSettings::default()
    };
    let engine = ExpansionEngine::new(templates, settings);
    let mut doc = Document::new();
    let root = doc.root();
    let area = doc.append_textarea(root, "#sig");

    assert!(!engine.handle_key_event(&mut doc, &mut space(area)).is_expanded());
    assert!(engine
        .handle_key_event(&mut doc, &mut KeyEvent::new("Tab", area))
        .is_expanded());
}

#[test]
fn test_empty_body_deletes_trigger() {
    let engine = engine_with(&[("gone", "")]);
    let mut doc = Document::new();
    let root = doc.root();
    let area = doc.append_textarea(root, "a #gone");

    let mut event = space(area);
    let outcome = engine.handle_key_event(&mut doc, &mut event);

    assert!(outcome.is_expanded());
    assert_eq!(doc.control(area).map(|c| c.value.as_str()), Some("a  "));
    assert!(event.default_prevented());
}

#[test]
fn test_no_trigger_is_no_match() {
    let engine = engine_with(&[("sig", SIG)]);
    let mut doc = Document::new();
    let root = doc.root();
    let area = doc.append_textarea(root, "plain text");

    assert_eq!(
        engine.handle_key_event(&mut doc, &mut space(area)),
        ExpansionOutcome::Skipped(SkipReason::NoMatch)
    );
}

#[test]
fn test_unsupported_input_type_is_skipped() {
    let engine = engine_with(&[("sig", SIG)]);
    let mut doc = Document::new();
    let root = doc.root();
    let email = doc.append_input(root, Some("email"), "#sig");

    let mut event = space(email);
    assert_eq!(
        engine.handle_key_event(&mut doc, &mut event),
        ExpansionOutcome::Skipped(SkipReason::NoEditableSurface)
    );
    assert_eq!(doc.control(email).map(|c| c.value.as_str()), Some("#sig"));
}

#[test]
fn test_lookback_window_bounds_the_match() {
    let long_token = "a".repeat(200);
    let engine = engine_with(&[(long_token.as_str(), "X")]);
    let mut doc = Document::new();
    let root = doc.root();

    // Marker is char 201 before the caret: outside the window.
    let area = doc.append_textarea(root, &format!("#{long_token}"));
    assert_eq!(
        engine.handle_key_event(&mut doc, &mut space(area)),
        ExpansionOutcome::Skipped(SkipReason::NoMatch)
    );

    // Marker is exactly 200 chars back: inside the window.
    let shorter = "a".repeat(199);
    let area = doc.append_textarea(root, &format!("#{shorter}"));
    assert_eq!(
        engine.handle_key_event(&mut doc, &mut space(area)),
        ExpansionOutcome::Skipped(SkipReason::UnknownToken(shorter))
    );
}

// ============================================================================
// Tree surfaces
// ============================================================================

#[test]
fn test_tree_expansion_scenario() {
    let engine = engine_with(&[("sig", SIG)]);
    let mut doc = Document::new();
    let div = editable_div(&mut doc);
    doc.append_text(div, "Hi ");
    let leaf = doc.append_text(div, "team #sig");
    doc.set_caret(leaf, 9);

    let mut event = space(div);
    let outcome = engine.handle_key_event(&mut doc, &mut event);

    let expected_caret = "Hi team Best regards,\nAlex".chars().count() + 1;
    assert_eq!(
        outcome,
        ExpansionOutcome::Expanded(Expansion {
            token: "sig".to_string(),
            surface: ExpandedSurface::Tree {
                path: EditPath::Precise
            },
            target: div,
            caret_offset: expected_caret,
        })
    );
    assert_eq!(doc.text_content(div), "Hi team Best regards,\nAlex ");
    let first = doc.first_text_leaf(div).expect("text leaf");
    assert_eq!(
        doc.selection(),
        Some(Caret {
            node: first,
            offset: expected_caret
        })
    );
    assert!(event.default_prevented());
    assert_eq!(doc.input_events().len(), 1);
    assert_eq!(doc.input_events()[0].target, div);
}

#[test]
fn test_tree_unknown_token_is_untouched() {
    let engine = engine_with(&[("sig", SIG)]);
    let mut doc = Document::new();
    let div = editable_div(&mut doc);
    let leaf = doc.append_text(div, "#greeting");
    doc.set_caret(leaf, 9);

    let mut event = space(div);
    assert_eq!(
        engine.handle_key_event(&mut doc, &mut event),
        ExpansionOutcome::Skipped(SkipReason::UnknownToken("greeting".to_string()))
    );
    assert_eq!(doc.children(div), &[leaf]);
    assert!(!event.default_prevented());
    assert!(doc.input_events().is_empty());
}

#[test]
fn test_tree_and_flat_agree_on_single_leaf() {
    let engine = engine_with(&[("sig", SIG)]);

    let mut flat_doc = Document::new();
    let root = flat_doc.root();
    let area = flat_doc.append_textarea(root, "x #sig tail");
    if let Some(state) = flat_doc.control_mut(area) {
        state.selection_start = 6;
        state.selection_end = 6;
    }
    let flat = engine.handle_key_event(&mut flat_doc, &mut space(area));

    let mut tree_doc = Document::new();
    let div = editable_div(&mut tree_doc);
    let leaf = tree_doc.append_text(div, "x #sig tail");
    tree_doc.set_caret(leaf, 6);
    let tree = engine.handle_key_event(&mut tree_doc, &mut space(div));

    assert_eq!(
        flat_doc.control(area).map(|c| c.value.clone()),
        Some(tree_doc.text_content(div))
    );
    let (ExpansionOutcome::Expanded(flat), ExpansionOutcome::Expanded(tree)) = (flat, tree) else {
        panic!("both surfaces should expand");
    };
    assert_eq!(flat.caret_offset, tree.caret_offset);
}

#[test]
fn test_selection_in_editable_with_non_editable_target() {
    let engine = engine_with(&[("sig", "S")]);
    let mut doc = Document::new();
    let root = doc.root();
    let div = editable_div(&mut doc);
    let leaf = doc.append_text(div, "ok #sig");
    doc.set_caret(leaf, 7);

    let mut event = space(root);
    let outcome = engine.handle_key_event(&mut doc, &mut event);

    assert!(outcome.is_expanded());
    assert_eq!(doc.text_content(div), "ok S ");
    assert!(event.default_prevented());
}

#[test]
fn test_selection_outside_editable_is_skipped() {
    let engine = engine_with(&[("sig", "S")]);
    let mut doc = Document::new();
    let root = doc.root();
    let p = doc.append_element(root, "p");
    let leaf = doc.append_text(p, "#sig");
    doc.set_caret(leaf, 4);

    let mut event = space(p);
    assert_eq!(
        engine.handle_key_event(&mut doc, &mut event),
        ExpansionOutcome::Skipped(SkipReason::NoEditableSurface)
    );
    assert_eq!(doc.text_content(p), "#sig");
}

#[test]
fn test_stale_caret_takes_flattened_path() {
    let engine = engine_with(&[("sig", "S")]);
    let mut doc = Document::new();
    let div = editable_div(&mut doc);
    doc.append_text(div, "Hi ");
    let leaf = doc.append_text(div, "#sig");
    doc.set_caret(leaf, 10);

    let outcome = engine.handle_key_event(&mut doc, &mut space(div));

    assert!(matches!(
        outcome,
        ExpansionOutcome::Expanded(Expansion {
            surface: ExpandedSurface::Tree {
                path: EditPath::Flattened
            },
            caret_offset: 5,
            ..
        })
    ));
    assert_eq!(doc.text_content(div), "Hi S ");
}

#[test]
fn test_tree_expansion_flattens_formatting() {
    let engine = engine_with(&[("sig", "S")]);
    let mut doc = Document::new();
    let div = editable_div(&mut doc);
    let bold = doc.append_element(div, "b");
    doc.append_text(bold, "Dear ");
    let leaf = doc.append_text(div, "team #sig");
    doc.set_caret(leaf, 9);

    assert!(engine.handle_key_event(&mut doc, &mut space(div)).is_expanded());
    assert_eq!(doc.children(div).len(), 1);
    assert_eq!(doc.text_content(div), "Dear team S ");
}

// ============================================================================
// Template store wiring
// ============================================================================

#[test]
fn test_store_changes_reach_the_engine() {
    let store = MemoryTemplateStore::new();
    let engine =
        ExpansionEngine::connect(&store, ExpansionSettings::default()).expect("memory store");

    let mut doc = Document::new();
    let root = doc.root();
    let area = doc.append_textarea(root, "#sig");
    assert_eq!(
        engine.handle_key_event(&mut doc, &mut space(area)),
        ExpansionOutcome::Skipped(SkipReason::UnknownToken("sig".to_string()))
    );

    store.set("sig", SIG).expect("valid keyword");
    assert!(engine.handle_key_event(&mut doc, &mut space(area)).is_expanded());

    store.clear();
    assert!(engine.templates().is_empty());
}

#[test]
fn test_connect_reads_file_store_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("templates.json");
    std::fs::write(&path, r#"{"templates": {"addr": "1 Main St"}}"#).expect("write templates");

    let store = FileTemplateStore::new(&path);
    let engine =
        ExpansionEngine::connect(&store, ExpansionSettings::default()).expect("valid file");
    assert_eq!(engine.templates().lookup("addr").as_deref(), Some("1 Main St"));
}

#[test]
fn test_connect_propagates_store_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("templates.json");
    std::fs::write(&path, "not json").expect("write templates");

    let store = FileTemplateStore::new(&path);
    assert!(ExpansionEngine::connect(&store, ExpansionSettings::default()).is_err());
}

#[test]
fn test_watched_file_changes_reach_the_engine() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("templates.json");
    std::fs::write(&path, r#"{"templates": {"sig": "old"}}"#).expect("write templates");

    let mut store = FileTemplateStore::new(&path);
    let engine =
        ExpansionEngine::connect(&store, ExpansionSettings::default()).expect("valid file");
    store.watch().expect("watch templates");
    assert_eq!(engine.templates().lookup("sig").as_deref(), Some("old"));

    std::fs::write(&path, r#"{"templates": {"sig": "new"}}"#).expect("rewrite templates");

    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    while engine.templates().lookup("sig").as_deref() != Some("new")
        && std::time::Instant::now() < deadline
    {
        std::thread::sleep(std::time::Duration::from_millis(50));
    }
    assert_eq!(engine.templates().lookup("sig").as_deref(), Some("new"));

    let mut doc = Document::new();
    let root = doc.root();
    let area = doc.append_textarea(root, "#sig");
    assert!(engine.handle_key_event(&mut doc, &mut space(area)).is_expanded());
    assert_eq!(doc.control(area).map(|c| c.value.as_str()), Some("new "));
}
