// Shared fixtures for the integration tests

#![allow(dead_code)]

use slidesmith::errors::{DeckError, Result};
use slidesmith::{ImageGenerator, ImageResource, OutlineRequest, TextGenerator};
use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

/// Text generator answering with a well-formed outline of the requested size
pub struct FakeText {
    pub title: Option<String>,
    pub polish_calls: AtomicUsize,
}

impl FakeText {
    pub fn new(title: Option<&str>) -> Self {
        Self {
            title: title.map(str::to_string),
            polish_calls: AtomicUsize::new(0),
        }
    }
}

pub fn outline_json(count: usize) -> String {
    let slides: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            let title = match i {
                0 => "Agenda".to_string(),
                i if i + 1 == count => "Conclusion".to_string(),
                i => format!("Topic {}", i),
            };
            serde_json::json!({
                "title": title,
                "content": [
                    "Nodes - the entities in the graph",
                    "Edges - typed, directed relationships",
                    "Properties",
                    "Traversals - walking the graph",
                    "Indexes"
                ]
            })
        })
        .collect();
    serde_json::json!({ "slides": slides }).to_string()
}

impl TextGenerator for FakeText {
    fn generate_outline(&self, request: &OutlineRequest) -> Result<String> {
        Ok(outline_json(request.count))
    }

    fn polish_title(&self, _description: &str) -> Result<String> {
        self.polish_calls.fetch_add(1, Ordering::SeqCst);
        self.title
            .clone()
            .ok_or_else(|| DeckError::TitlePolish("polish unavailable".to_string()))
    }
}

/// Image generator returning an inline PNG, or failing
pub struct FakeImages {
    pub png: Option<Vec<u8>>,
}

impl ImageGenerator for FakeImages {
    fn generate_image(&self, _prompt: &str) -> Result<ImageResource> {
        self.png
            .clone()
            .map(ImageResource::Inline)
            .ok_or_else(|| DeckError::ImageAttachment("provider down".to_string()))
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([40, 90, 160]),
    ));
    let mut cursor = Cursor::new(Vec::new());
    img.write_to(&mut cursor, image::ImageOutputFormat::Png)
        .expect("Failed to encode PNG");
    cursor.into_inner()
}

/// Every part of a package, by name
pub fn read_parts(path: &Path) -> Vec<(String, Vec<u8>)> {
    let file = File::open(path).expect("Failed to open deck");
    let mut archive = ZipArchive::new(file).expect("Deck is not a zip");
    let mut parts = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        parts.push((entry.name().to_string(), data));
    }
    parts
}

pub fn part_text(parts: &[(String, Vec<u8>)], name: &str) -> String {
    parts
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, d)| String::from_utf8_lossy(d).to_string())
        .unwrap_or_else(|| panic!("Missing part {}", name))
}

pub fn slide_part_count(parts: &[(String, Vec<u8>)]) -> usize {
    parts
        .iter()
        .filter(|(n, _)| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
        .count()
}

/// Copy a package, passing every part through `edit`
pub fn rewrite_package<F>(bytes: &[u8], output: &Path, edit: F)
where
    F: Fn(&str, Vec<u8>) -> Vec<u8>,
{
    let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("Invalid package");
    let file = File::create(output).expect("Failed to create package");
    let mut zip = ZipWriter::new(file);
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        let name = entry.name().to_string();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        zip.start_file(name.as_str(), FileOptions::default()).unwrap();
        zip.write_all(&edit(&name, data)).unwrap();
    }
    zip.finish().unwrap();
}
