// quill-bridge/tests/controller_tests.rs
//
// Tests for the host bridge controller against a recording surface: command
// transmission, the content-change guard, height synchronization, and the
// one-time load completion.

use quill_bridge::config::EditorConfig;
use quill_bridge::controller::RichEditor;
use quill_bridge::surface::{RenderingSurface, SurfaceError, SurfaceEvent};
use quill_core::protocol::EditorEvent;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct RecordingSurface {
    documents: Vec<String>,
    scripts: Vec<String>,
    closed: bool,
}

impl RenderingSurface for RecordingSurface {
    fn load(&mut self, document: String) -> Result<(), SurfaceError> {
        if self.closed {
            return Err(SurfaceError::Closed);
        }
        self.documents.push(document);
        Ok(())
    }

    fn inject(&mut self, script: String) -> Result<(), SurfaceError> {
        if self.closed {
            return Err(SurfaceError::Closed);
        }
        self.scripts.push(script);
        Ok(())
    }
}

fn editor(config: EditorConfig) -> RichEditor<RecordingSurface> {
    RichEditor::new(config, RecordingSurface::default())
}

fn scripts(editor: &RichEditor<RecordingSurface>) -> Vec<&str> {
    editor.surface().scripts.iter().map(String::as_str).collect()
}

fn content_change(html: &str) -> String {
    EditorEvent::ContentChange {
        html: html.to_string(),
    }
    .to_message()
}

fn height_report(height: u32) -> String {
    EditorEvent::DocumentHeight { height }.to_message()
}

/// Records every value a callback receives.
fn recorder<T: Send + 'static>() -> Arc<Mutex<Vec<T>>> {
    Arc::new(Mutex::new(Vec::new()))
}

// ============================================================================
// Construction Tests
// ============================================================================

#[test]
fn test_new_loads_initial_document() {
    let editor = editor(EditorConfig::new().value("<p>Hi</p>").bg_color("#fff"));
    let documents = &editor.surface().documents;
    assert_eq!(documents.len(), 1);
    assert!(documents[0].contains(
        r#"<div id="editor" contenteditable="true" placeholder="Type something..."><p>Hi</p></div>"#
    ));
    assert!(documents[0].contains("background-color: #fff;"));
    assert!(scripts(&editor).is_empty());
}

#[test]
fn test_initial_state() {
    let editor = editor(EditorConfig::new().value("<p>Hi</p>"));
    assert_eq!(editor.content(), "<p>Hi</p>");
    assert_eq!(editor.height(), 20);
    assert!(!editor.is_loaded());
}

#[test]
fn test_initial_height_is_configurable() {
    let editor = editor(EditorConfig::new().initial_height(64));
    assert_eq!(editor.height(), 64);

    let clamped = self::editor(EditorConfig::new().initial_height(500).max_height(100));
    assert_eq!(clamped.height(), 100);
}

#[test]
fn test_each_editor_has_its_own_id() {
    let a = editor(EditorConfig::new());
    let b = editor(EditorConfig::new());
    assert_ne!(a.id(), b.id());
}

// ============================================================================
// Command Tests
// ============================================================================

#[test]
fn test_commands_are_encoded_and_injected() {
    let mut editor = editor(EditorConfig::new());
    editor.focus();
    editor.blur();
    editor.insert_html("<b>X</b>");
    editor.surround_selection("**", "**");
    editor.surround_selection_tag("strong");
    editor.toggle_selection_tag("h1");
    editor.set_placeholder("Say \"hi\"");
    editor.inject_css("p { margin: 0; }");
    assert_eq!(
        scripts(&editor),
        vec![
            "window.quillEditor.focus();",
            "window.quillEditor.blur();",
            r#"window.quillEditor.insertHtml("<b>X</b>");"#,
            r#"window.quillEditor.surroundSelection("**","**");"#,
            r#"window.quillEditor.surroundSelectionTag("strong");"#,
            r#"window.quillEditor.toggleSelectionTag("h1");"#,
            r#"window.quillEditor.setPlaceholder("Say \"hi\"");"#,
            r#"window.quillEditor.injectCss("p { margin: 0; }");"#,
        ]
    );
}

#[test]
fn test_commands_use_configured_namespace() {
    let mut editor = editor(EditorConfig::new().namespace("window.editors.notes"));
    editor.focus();
    assert_eq!(scripts(&editor), vec!["window.editors.notes.focus();"]);
}

#[test]
fn test_set_value_records_content() {
    let mut editor = editor(EditorConfig::new().value("<p>old</p>"));
    editor.set_value(Some("<p>new</p>"));
    assert_eq!(editor.content(), "<p>new</p>");
    editor.set_value(None);
    assert_eq!(editor.content(), "");
    assert_eq!(
        scripts(&editor),
        vec![
            r#"window.quillEditor.setHtml("<p>new</p>");"#,
            "window.quillEditor.setHtml(null);",
        ]
    );
}

#[test]
fn test_transmission_failure_is_swallowed() {
    let surface = RecordingSurface {
        closed: true,
        ..RecordingSurface::default()
    };
    let mut editor = RichEditor::new(EditorConfig::new(), surface);
    editor.focus();
    editor.insert_html("<b>X</b>");
    editor.set_value(Some("<p>kept locally</p>"));
    assert!(editor.surface().scripts.is_empty());
    assert_eq!(editor.content(), "<p>kept locally</p>");
}

// ============================================================================
// Content Change Tests
// ============================================================================

#[test]
fn test_content_equal_to_controlled_value_is_not_reported() {
    let changes = recorder::<String>();
    let sink = changes.clone();
    let mut editor = editor(
        EditorConfig::new()
            .value("<p>Hi</p>")
            .on_change(move |html| sink.lock().unwrap().push(html.to_string())),
    );

    editor.handle_message(&content_change("<p>Hi</p>"));
    assert!(changes.lock().unwrap().is_empty());
    assert_eq!(editor.content(), "<p>Hi</p>");
}

#[test]
fn test_differing_content_is_reported_once_per_event() {
    let changes = recorder::<String>();
    let sink = changes.clone();
    let mut editor = editor(
        EditorConfig::new()
            .value("<p>Hi</p>")
            .on_change(move |html| sink.lock().unwrap().push(html.to_string())),
    );

    editor.handle_message(&content_change("<p>Hi!</p>"));
    assert_eq!(*changes.lock().unwrap(), vec!["<p>Hi!</p>"]);
    assert_eq!(editor.content(), "<p>Hi!</p>");

    editor.handle_message(&content_change("<p>Hi!</p>"));
    assert_eq!(changes.lock().unwrap().len(), 2);
}

#[test]
fn test_uncontrolled_editor_reports_every_change() {
    let changes = recorder::<String>();
    let sink = changes.clone();
    let mut editor =
        editor(EditorConfig::new().on_change(move |html| sink.lock().unwrap().push(html.to_string())));

    editor.handle_message(&content_change(""));
    editor.handle_message(&content_change("<p>a</p>"));
    assert_eq!(*changes.lock().unwrap(), vec!["", "<p>a</p>"]);
}

#[test]
fn test_set_value_moves_the_guard() {
    let changes = recorder::<String>();
    let sink = changes.clone();
    let mut editor = editor(
        EditorConfig::new()
            .value("<p>a</p>")
            .on_change(move |html| sink.lock().unwrap().push(html.to_string())),
    );

    editor.set_value(Some("<p>b</p>"));
    editor.handle_message(&content_change("<p>b</p>"));
    editor.handle_message(&content_change("<p>a</p>"));
    assert_eq!(*changes.lock().unwrap(), vec!["<p>a</p>"]);
}

#[test]
fn test_content_change_without_callback_still_updates_content() {
    let mut editor = editor(EditorConfig::new());
    editor.handle_event(EditorEvent::ContentChange {
        html: "<p>x</p>".to_string(),
    });
    assert_eq!(editor.content(), "<p>x</p>");
}

// ============================================================================
// Height Tests
// ============================================================================

#[test]
fn test_height_report_above_max_is_clamped() {
    let heights = recorder::<u32>();
    let sink = heights.clone();
    let mut editor = editor(
        EditorConfig::new()
            .max_height(100)
            .initial_height(20)
            .on_height_change(move |h| sink.lock().unwrap().push(h)),
    );

    editor.handle_message(&height_report(150));
    assert_eq!(editor.height(), 100);
    assert_eq!(*heights.lock().unwrap(), vec![100]);
}

#[test]
fn test_in_tolerance_and_zero_reports_do_not_notify() {
    let heights = recorder::<u32>();
    let sink = heights.clone();
    let mut editor = editor(EditorConfig::new().on_height_change(move |h| sink.lock().unwrap().push(h)));

    editor.handle_message(&height_report(21));
    editor.handle_message(&height_report(18));
    editor.handle_message(&height_report(0));
    assert_eq!(editor.height(), 20);
    assert!(heights.lock().unwrap().is_empty());

    editor.handle_message(&height_report(44));
    assert_eq!(*heights.lock().unwrap(), vec![44]);
}

#[test]
fn test_fractional_height_is_rounded() {
    let mut editor = editor(EditorConfig::new());
    editor.handle_message(r#"{"event":"documentHeight","documentHeight":63.7}"#);
    assert_eq!(editor.height(), 64);
}

// ============================================================================
// Malformed Message Tests
// ============================================================================

#[test]
fn test_malformed_messages_are_dropped() {
    let changes = recorder::<String>();
    let sink = changes.clone();
    let mut editor =
        editor(EditorConfig::new().on_change(move |html| sink.lock().unwrap().push(html.to_string())));

    for raw in [
        "",
        "not json",
        r#"{"event":"contentChange"}"#,
        r#"{"event":"documentHeight","documentHeight":"tall"}"#,
        r#"{"event":"selectionChange"}"#,
    ] {
        editor.handle_message(raw);
    }
    assert!(changes.lock().unwrap().is_empty());
    assert_eq!(editor.height(), 20);
    assert_eq!(editor.content(), "");

    editor.handle_message(&content_change("<p>ok</p>"));
    assert_eq!(*changes.lock().unwrap(), vec!["<p>ok</p>"]);
}

// ============================================================================
// Load Completion Tests
// ============================================================================

#[test]
fn test_load_end_applies_placeholder_and_css_once() {
    let loads = recorder::<()>();
    let sink = loads.clone();
    let mut editor = editor(
        EditorConfig::new()
            .placeholder("Write here")
            .injected_css("body { color: red; }")
            .on_load_end(move || sink.lock().unwrap().push(())),
    );

    editor.handle_surface_event(SurfaceEvent::LoadEnd);
    assert!(editor.is_loaded());
    assert_eq!(
        scripts(&editor),
        vec![
            r#"window.quillEditor.setPlaceholder("Write here");"#,
            r#"window.quillEditor.injectCss("body { color: red; }");"#,
        ]
    );
    assert_eq!(loads.lock().unwrap().len(), 1);

    editor.handle_surface_event(SurfaceEvent::LoadEnd);
    assert_eq!(scripts(&editor).len(), 2);
    assert_eq!(loads.lock().unwrap().len(), 1);
}

#[test]
fn test_load_end_without_placeholder_or_css_sends_nothing() {
    let mut editor = editor(EditorConfig::new());
    editor.handle_load_end();
    assert!(editor.is_loaded());
    assert!(scripts(&editor).is_empty());
}

#[test]
fn test_update_placeholder_before_load_is_only_stored() {
    let mut editor = editor(EditorConfig::new().placeholder("first"));
    editor.update_placeholder(Some("second".to_string()));
    assert!(scripts(&editor).is_empty());
    assert_eq!(editor.options().placeholder.as_deref(), Some("second"));

    editor.handle_load_end();
    assert_eq!(
        scripts(&editor),
        vec![r#"window.quillEditor.setPlaceholder("second");"#]
    );
}

#[test]
fn test_updates_after_load_reapply_only_on_change() {
    let mut editor = editor(EditorConfig::new().placeholder("a").injected_css("p {}"));
    editor.handle_load_end();
    let sent = scripts(&editor).len();

    editor.update_placeholder(Some("a".to_string()));
    editor.update_injected_css(Some("p {}".to_string()));
    assert_eq!(scripts(&editor).len(), sent);

    editor.update_placeholder(Some("b".to_string()));
    editor.update_injected_css(Some("h1 {}".to_string()));
    assert_eq!(
        scripts(&editor)[sent..].to_vec(),
        vec![
            r#"window.quillEditor.setPlaceholder("b");"#,
            r#"window.quillEditor.injectCss("h1 {}");"#,
        ]
    );

    // Clearing is stored but has nothing to send.
    editor.update_placeholder(None);
    assert_eq!(scripts(&editor).len(), sent + 2);
    assert_eq!(editor.options().placeholder, None);
}

// ============================================================================
// Batch Tests
// ============================================================================

fn height_batch() -> Vec<SurfaceEvent> {
    vec![
        SurfaceEvent::Message(height_report(40)),
        SurfaceEvent::Message(content_change("<p>x</p>")),
        SurfaceEvent::Message(height_report(80)),
        SurfaceEvent::Message("garbage".to_string()),
        SurfaceEvent::Message(height_report(120)),
    ]
}

#[test]
fn test_batch_applies_every_height_by_default() {
    let heights = recorder::<u32>();
    let sink = heights.clone();
    let mut editor = editor(EditorConfig::new().on_height_change(move |h| sink.lock().unwrap().push(h)));

    editor.handle_batch(height_batch());
    assert_eq!(*heights.lock().unwrap(), vec![40, 80, 120]);
    assert_eq!(editor.content(), "<p>x</p>");
}

#[test]
fn test_batch_coalesces_heights_when_enabled() {
    let heights = recorder::<u32>();
    let sink = heights.clone();
    let changes = recorder::<String>();
    let change_sink = changes.clone();
    let mut editor = editor(
        EditorConfig::new()
            .coalesce_height_events(true)
            .on_height_change(move |h| sink.lock().unwrap().push(h))
            .on_change(move |html| change_sink.lock().unwrap().push(html.to_string())),
    );

    editor.handle_batch(height_batch());
    assert_eq!(*heights.lock().unwrap(), vec![120]);
    assert_eq!(editor.height(), 120);
    assert_eq!(*changes.lock().unwrap(), vec!["<p>x</p>"]);
}

#[test]
fn test_batch_handles_load_end_in_order() {
    let mut editor = editor(EditorConfig::new().placeholder("p"));
    editor.handle_batch(vec![
        SurfaceEvent::Message(height_report(60)),
        SurfaceEvent::LoadEnd,
        SurfaceEvent::LoadEnd,
    ]);
    assert!(editor.is_loaded());
    assert_eq!(editor.height(), 60);
    assert_eq!(scripts(&editor), vec![r#"window.quillEditor.setPlaceholder("p");"#]);
}

#[tokio::test]
async fn test_drain_takes_everything_queued() {
    let (tx, mut rx) = tokio::sync::mpsc::channel(8);
    for event in height_batch() {
        tx.send(event).await.unwrap();
    }
    let mut editor = editor(EditorConfig::new().coalesce_height_events(true));
    assert_eq!(editor.drain(&mut rx), 5);
    assert_eq!(editor.height(), 120);
    assert_eq!(editor.drain(&mut rx), 0);
}

#[tokio::test]
async fn test_pump_stops_when_queue_closes() {
    let (tx, mut rx) = tokio::sync::mpsc::channel(8);
    tx.send(SurfaceEvent::LoadEnd).await.unwrap();
    drop(tx);

    let mut editor = editor(EditorConfig::new());
    assert!(editor.pump(&mut rx).await);
    assert!(editor.is_loaded());
    assert!(!editor.pump(&mut rx).await);
}
