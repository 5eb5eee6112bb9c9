mod common;

use common::{
    outline_json, part_text, png_bytes, read_parts, rewrite_package, slide_part_count, FakeImages,
    FakeText,
};
use slidesmith::builtin::default_template_package;
use slidesmith::errors::DeckError;
use slidesmith::{parse_outline, Assembler, DeckRequest, PptxPackage, TemplateStore};
use std::fs;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tempfile::TempDir;

fn assembler(templates: &Path, output: &Path, text: Arc<FakeText>, png: Option<Vec<u8>>) -> Assembler {
    Assembler::new(
        TemplateStore::new(templates, "Default"),
        output,
        text,
        Arc::new(FakeImages { png }),
    )
}

#[test]
fn test_end_to_end_default_template() {
    let templates = TempDir::new().expect("Failed to create temp dir");
    let output = TempDir::new().expect("Failed to create temp dir");
    let text = Arc::new(FakeText::new(Some("Graph Databases Unpacked")));
    let assembler = assembler(templates.path(), output.path(), text, None);

    let mut request = DeckRequest::new("Intro to Graph Databases", "Ada Lovelace");
    request.slide_count = 4;
    request.template_style = "Default".to_string();

    let deck = assembler.generate(&request).expect("Generation failed");
    assert!(deck.filename.ends_with(".pptx"));
    assert_eq!(deck.filename, "Graph_Databases_Unpacked.pptx");
    assert_eq!(deck.slide_count, 5);
    assert!(deck.path.exists());

    let parts = read_parts(&deck.path);
    assert_eq!(slide_part_count(&parts), 5);

    let presentation = part_text(&parts, "ppt/presentation.xml");
    assert_eq!(presentation.matches("<p:sldId ").count(), 5);
    assert!(presentation.contains(r#"<p:sldId id="256" r:id="#));
    assert!(presentation.find("<p:sldIdLst>") < presentation.find("<p:sldSz"));

    let content_types = part_text(&parts, "[Content_Types].xml");
    assert!(content_types.contains("/ppt/slides/slide5.xml"));
    assert!(part_text(&parts, "docProps/app.xml").contains("<Slides>5</Slides>"));
    assert!(part_text(&parts, "docProps/core.xml").contains("Graph Databases Unpacked"));

    let title_slide = part_text(&parts, "ppt/slides/slide1.xml");
    assert!(title_slide.contains("Presented by Ada Lovelace"));
    let agenda = part_text(&parts, "ppt/slides/slide2.xml");
    assert!(agenda.contains("Agenda"));
    assert!(agenda.contains("the entities in the graph"));
    assert!(!agenda.contains("Click to"));

    let rels = part_text(&parts, "ppt/slides/_rels/slide2.xml.rels");
    assert!(rels.contains("../slideLayouts/slideLayout2.xml"));

    // No temporary files left behind
    let leftovers: Vec<_> = fs::read_dir(output.path()).unwrap().collect();
    assert_eq!(leftovers.len(), 1);
}

#[test]
fn test_title_polish_failure_uses_prompt() {
    let templates = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let text = Arc::new(FakeText::new(None));
    let assembler = assembler(templates.path(), output.path(), text.clone(), None);

    let mut request = DeckRequest::new("Intro to Graph Databases", "Ada");
    request.slide_count = 2;

    let deck = assembler.generate(&request).expect("Title failure must not be fatal");
    assert_eq!(deck.title, "Intro to Graph Databases");
    assert_eq!(deck.filename, "Intro_to_Graph_Databases.pptx");
    assert_eq!(text.polish_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_explicit_title_skips_polish() {
    let templates = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let text = Arc::new(FakeText::new(Some("Ignored")));
    let assembler = assembler(templates.path(), output.path(), text.clone(), None);

    let mut request = DeckRequest::new("graphs", "Ada");
    request.title = Some("Q3 Report: Growth & Risk!".to_string());
    request.slide_count = 1;

    let deck = assembler.generate(&request).unwrap();
    assert_eq!(deck.filename, "Q3_Report_Growth_Risk.pptx");
    assert_eq!(text.polish_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_images_are_embedded() {
    let templates = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let text = Arc::new(FakeText::new(Some("Pictured")));
    let assembler = assembler(templates.path(), output.path(), text, Some(png_bytes(64, 48)));

    let mut request = DeckRequest::new("graphs", "Ada");
    request.slide_count = 2;
    request.include_images = true;

    let deck = assembler.generate(&request).unwrap();
    let parts = read_parts(&deck.path);

    let media = parts
        .iter()
        .filter(|(n, _)| n.starts_with("ppt/media/") && n.ends_with(".png"))
        .count();
    assert_eq!(media, 2);

    let slide = part_text(&parts, "ppt/slides/slide2.xml");
    assert!(slide.contains("<p:pic>"));
    assert!(slide.contains(r#"r:embed="rId2""#));
    let rels = part_text(&parts, "ppt/slides/_rels/slide2.xml.rels");
    assert!(rels.contains("../media/deck_image"));
    assert!(part_text(&parts, "[Content_Types].xml").contains(r#"Extension="png""#));
    assert!(!part_text(&parts, "ppt/slides/slide1.xml").contains("<p:pic>"));
}

#[test]
fn test_image_failure_degrades_to_text() {
    let templates = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let text = Arc::new(FakeText::new(Some("Text Only")));
    let assembler = assembler(templates.path(), output.path(), text, None);

    let mut request = DeckRequest::new("graphs", "Ada");
    request.slide_count = 3;
    request.include_images = true;

    let deck = assembler.generate(&request).expect("Image failure must not be fatal");
    let parts = read_parts(&deck.path);
    assert_eq!(slide_part_count(&parts), 4);
    assert!(!parts.iter().any(|(n, _)| n.starts_with("ppt/media/")));
}

#[test]
fn test_existing_template_slides_are_stripped() {
    let templates = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let text = Arc::new(FakeText::new(Some("First Deck")));
    let first = assembler(templates.path(), output.path(), text, Some(png_bytes(32, 32)));

    let mut request = DeckRequest::new("graphs", "Ada");
    request.slide_count = 3;
    request.include_images = true;
    let deck = first.generate(&request).unwrap();

    // Reuse the generated deck, slides and media included, as a template
    fs::copy(&deck.path, templates.path().join("Reused.pptx")).unwrap();
    let text = Arc::new(FakeText::new(Some("Second Deck")));
    let second = assembler(templates.path(), output.path(), text, None);

    let mut request = DeckRequest::new("graphs again", "Grace");
    request.slide_count = 2;
    request.template_style = "reused".to_string();
    let deck = second.generate(&request).unwrap();

    let package = PptxPackage::open(&deck.path).unwrap();
    assert_eq!(
        package.slide_parts(),
        vec![
            "ppt/slides/slide1.xml".to_string(),
            "ppt/slides/slide2.xml".to_string(),
            "ppt/slides/slide3.xml".to_string(),
        ]
    );

    let parts = read_parts(&deck.path);
    assert_eq!(slide_part_count(&parts), 3);
    assert!(!parts.iter().any(|(n, _)| n.starts_with("ppt/media/")));
    assert!(part_text(&parts, "ppt/slides/slide1.xml").contains("Second Deck"));
    assert!(!part_text(&parts, "ppt/slides/slide2.xml").contains("First Deck"));
    assert_eq!(
        part_text(&parts, "ppt/presentation.xml").matches("<p:sldId ").count(),
        3
    );
}

#[test]
fn test_template_without_body_placeholder() {
    let templates = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();

    let builtin = default_template_package().unwrap().to_bytes("Bare").unwrap();
    rewrite_package(&builtin, &templates.path().join("Bare.pptx"), |name, data| {
        if name == "ppt/slideLayouts/slideLayout2.xml" {
            String::from_utf8(data)
                .unwrap()
                .replace(r#"<p:ph idx="1"/>"#, r#"<p:ph type="dt" idx="1"/>"#)
                .into_bytes()
        } else {
            data
        }
    });

    let text = Arc::new(FakeText::new(Some("Bare Template")));
    let assembler = assembler(templates.path(), output.path(), text, None);
    let mut request = DeckRequest::new("graphs", "Ada");
    request.slide_count = 2;
    request.template_style = "Bare".to_string();

    let deck = assembler.generate(&request).unwrap();
    let parts = read_parts(&deck.path);
    let slide = part_text(&parts, "ppt/slides/slide2.xml");
    assert_eq!(slide.matches(r#"txBox="1""#).count(), 2);
    assert!(slide.contains("Edges"));
    assert!(!slide.contains(r#"type="dt""#));
}

#[test]
fn test_unknown_style_falls_back_to_default_file() {
    let templates = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    default_template_package()
        .unwrap()
        .save(&templates.path().join("Default.pptx"), "Default")
        .unwrap();

    let store = TemplateStore::new(templates.path(), "Default");
    assert_eq!(store.available_styles(), vec!["Default".to_string()]);
    assert_eq!(
        store.resolve("Neon"),
        slidesmith::TemplateSource::File(templates.path().join("Default.pptx"))
    );

    let text = Arc::new(FakeText::new(Some("Fallback")));
    let assembler = assembler(templates.path(), output.path(), text, None);
    let mut request = DeckRequest::new("graphs", "Ada");
    request.slide_count = 1;
    request.template_style = "Neon".to_string();
    assert!(assembler.generate(&request).is_ok());
}

#[test]
fn test_insufficient_outline_is_rejected() {
    let templates = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let text = Arc::new(FakeText::new(Some("Never")));
    let assembler = assembler(templates.path(), output.path(), text, None);

    let err = parse_outline(&outline_json(2), 3).unwrap_err();
    assert!(matches!(
        err,
        DeckError::InsufficientContent {
            requested: 3,
            available: 2
        }
    ));

    let outline = parse_outline(&outline_json(2), 2).unwrap();
    let request = DeckRequest::new("graphs", "Ada");
    let deck = assembler.assemble(&outline, &request).unwrap();
    assert_eq!(deck.slide_count, 3);
}

#[test]
fn test_invalid_request_writes_nothing() {
    let templates = TempDir::new().unwrap();
    let empty_output = TempDir::new().unwrap();
    let missing_template = TemplateStore::new(&templates.path().join("absent"), "Default");
    let broken = Assembler::new(
        missing_template,
        empty_output.path(),
        Arc::new(FakeText::new(None)),
        Arc::new(FakeImages { png: None }),
    );
    let mut request = DeckRequest::new("graphs", "Ada");
    request.slide_count = 0;
    assert!(matches!(broken.generate(&request), Err(DeckError::Validation(_))));
    assert_eq!(fs::read_dir(empty_output.path()).unwrap().count(), 0);
}

/// Built-in template with its content layout's body placeholder replaced
fn content_layout_variant(dir: &Path, style: &str, body_ph: &str, slide_height: Option<i64>) {
    let builtin = default_template_package().unwrap().to_bytes(style).unwrap();
    rewrite_package(&builtin, &dir.join(format!("{}.pptx", style)), |name, data| {
        let xml = String::from_utf8(data).unwrap();
        let xml = match name {
            "ppt/slideLayouts/slideLayout2.xml" => {
                xml.replace(r#"<p:ph idx="1"/></p:nvPr></p:nvSpPr><p:spPr/>"#, body_ph)
            }
            "ppt/presentation.xml" => match slide_height {
                Some(cy) => xml.replace(r#"cy="6858000""#, &format!(r#"cy="{}""#, cy)),
                None => xml,
            },
            _ => xml,
        };
        xml.into_bytes()
    });
}

#[test]
fn test_narrow_body_placeholder_falls_back_to_full_width() {
    let templates = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    // 1.5in x 4in at (0.6in, 2in)
    content_layout_variant(
        templates.path(),
        "Narrow",
        r#"<p:ph idx="1"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="548640" y="1828800"/><a:ext cx="1371600" cy="3657600"/></a:xfrm></p:spPr>"#,
        None,
    );

    let text = Arc::new(FakeText::new(Some("Narrow Body")));
    let assembler = assembler(templates.path(), output.path(), text, None);
    let mut request = DeckRequest::new("graphs", "Ada");
    request.slide_count = 2;
    request.template_style = "Narrow".to_string();

    let deck = assembler.generate(&request).expect("Narrow body placeholder must not be fatal");
    assert_eq!(deck.slide_count, 3);
    let parts = read_parts(&deck.path);
    let slide = part_text(&parts, "ppt/slides/slide2.xml");
    assert!(slide.contains("Nodes"));
    assert!(slide.contains("Edges"));
    assert!(!slide.contains(r#"cx="1371600""#));
}

#[test]
fn test_fatal_slide_error_writes_nothing() {
    let templates = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    // No body placeholder and a 3in tall slide: nothing fits under the title
    content_layout_variant(
        templates.path(),
        "Cramped",
        r#"<p:ph type="dt" idx="1"/></p:nvPr></p:nvSpPr><p:spPr/>"#,
        Some(2_743_200),
    );

    let text = Arc::new(FakeText::new(Some("Cramped Deck")));
    let assembler = assembler(templates.path(), output.path(), text, None);
    let mut request = DeckRequest::new("graphs", "Ada");
    request.slide_count = 3;
    request.template_style = "Cramped".to_string();

    let result = assembler.generate(&request);
    assert!(matches!(result, Err(DeckError::NoContentRegion { slide_index: 0 })));
    assert_eq!(fs::read_dir(output.path()).unwrap().count(), 0);
}

#[test]
fn test_template_without_layouts_is_rejected() {
    let templates = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let builtin = default_template_package().unwrap().to_bytes("Hollow").unwrap();
    rewrite_package(&builtin, &templates.path().join("Hollow.pptx"), |name, data| {
        if name == "ppt/slideMasters/_rels/slideMaster1.xml.rels" {
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId9" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="../theme/theme1.xml"/></Relationships>"#
                .to_vec()
        } else {
            data
        }
    });

    let text = Arc::new(FakeText::new(Some("Hollow")));
    let assembler = assembler(templates.path(), output.path(), text, None);
    let mut request = DeckRequest::new("graphs", "Ada");
    request.slide_count = 2;
    request.template_style = "Hollow".to_string();

    assert!(matches!(assembler.generate(&request), Err(DeckError::EmptyTemplate(_))));
    assert_eq!(fs::read_dir(output.path()).unwrap().count(), 0);
}
