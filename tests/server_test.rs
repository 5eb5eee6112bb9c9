mod common;

use common::{FakeImages, FakeText};
use slidesmith::server::handle;
use slidesmith::{Assembler, TemplateStore};
use std::sync::Arc;
use tempfile::TempDir;
use tiny_http::Method;

fn setup() -> (TempDir, TempDir, Assembler) {
    let templates = TempDir::new().expect("Failed to create temp dir");
    let output = TempDir::new().expect("Failed to create temp dir");
    let assembler = Assembler::new(
        TemplateStore::new(templates.path(), "Default"),
        output.path(),
        Arc::new(FakeText::new(Some("Served Deck"))),
        Arc::new(FakeImages { png: None }),
    );
    (templates, output, assembler)
}

fn json(body: &[u8]) -> serde_json::Value {
    serde_json::from_slice(body).expect("Response is not JSON")
}

#[test]
fn test_generate_then_download() {
    let (_templates, _output, assembler) = setup();

    let body = r#"{"prompt": "Intro to Graph Databases", "presenter": "Ada", "num_slides": 3, "template_style": "Default"}"#;
    let reply = handle(&Method::Post, "/generate", body, &assembler);
    assert_eq!(reply.status, 200);
    let value = json(&reply.body);
    assert_eq!(value["success"], true);
    assert_eq!(value["filename"], "Served_Deck.pptx");
    assert_eq!(value["file_url"], "/download/Served_Deck.pptx");

    let download = handle(&Method::Get, "/download/Served_Deck.pptx", "", &assembler);
    assert_eq!(download.status, 200);
    assert_eq!(download.attachment.as_deref(), Some("Served_Deck.pptx"));
    assert!(download.body.starts_with(b"PK"));
}

#[test]
fn test_generate_requires_prompt_and_presenter() {
    let (_templates, _output, assembler) = setup();

    let reply = handle(&Method::Post, "/generate", r#"{"prompt": "graphs"}"#, &assembler);
    assert_eq!(reply.status, 400);
    assert_eq!(json(&reply.body)["success"], false);

    let reply = handle(&Method::Post, "/generate", "not json", &assembler);
    assert_eq!(reply.status, 400);
}

#[test]
fn test_slide_count_is_clamped() {
    let (_templates, output, assembler) = setup();

    let body = r#"{"prompt": "graphs", "presenter": "Ada", "num_slides": 0, "title": "Clamped"}"#;
    let reply = handle(&Method::Post, "/generate", body, &assembler);
    assert_eq!(reply.status, 200);

    let parts = common::read_parts(&output.path().join("Clamped.pptx"));
    assert_eq!(common::slide_part_count(&parts), 2);
}

#[test]
fn test_download_rejects_unsafe_names() {
    let (_templates, _output, assembler) = setup();

    for url in [
        "/download/../secrets.pptx",
        "/download/notes.txt",
        "/download/missing.pptx",
        "/download/",
    ] {
        let reply = handle(&Method::Get, url, "", &assembler);
        assert_eq!(reply.status, 404, "{} should not be served", url);
    }
    assert_eq!(handle(&Method::Get, "/elsewhere", "", &assembler).status, 404);
}

#[test]
fn test_styles_listing() {
    let (_templates, _output, assembler) = setup();
    let reply = handle(&Method::Get, "/styles", "", &assembler);
    assert_eq!(reply.status, 200);
    let value = json(&reply.body);
    assert_eq!(value["styles"], serde_json::json!([]));
    assert_eq!(value["default"], "Default");
}
