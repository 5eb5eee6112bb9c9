// ABOUTME: PPTX package module for the slidesmith application
// ABOUTME: Loads template packages, strips and adds slides, and writes the finished deck

use crate::errors::{DeckError, Result};
use log::{debug, info};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use zip::{write::FileOptions, CompressionMethod, ZipArchive, ZipWriter};

pub const NS_PRESENTATION: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
pub const NS_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

pub const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub const REL_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
pub const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
pub const REL_SLIDE_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
pub const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

pub const CT_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const SECTION_LIST_EXT_URI: &str = "{521415D9-36F7-43E2-AB2F-B90AF26B5E84}";
const FIRST_SLIDE_ID: u32 = 256;

/// Default slide size (16:9) used when the template does not declare one
pub const DEFAULT_SLIDE_SIZE: SlideSize = SlideSize {
    width: 12_192_000,
    height: 6_858_000,
};

/// Slide dimensions in EMUs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideSize {
    pub width: i64,
    pub height: i64,
}

/// One entry of a `.rels` part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

/// A media file referenced from a new slide
#[derive(Debug, Clone)]
pub struct MediaPart {
    pub rel_id: String,
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Everything needed to add one slide to the package
#[derive(Debug, Clone)]
pub struct SlidePart {
    pub layout_part: String,
    pub xml: String,
    pub media: Vec<MediaPart>,
}

#[derive(Debug, Clone)]
struct SlideEntry {
    part: String,
    rel_id: String,
}

/// Parsed `[Content_Types].xml`
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    defaults: Vec<(String, String)>,
    overrides: Vec<(String, String)>,
}

impl ContentTypes {
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.trim_text(true);
        let mut buf = Vec::new();
        let mut types = ContentTypes::default();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Empty(ref e) | Event::Start(ref e) => match e.local_name().as_ref() {
                    b"Default" => {
                        if let (Some(ext), Some(ct)) =
                            (attr(e, b"Extension"), attr(e, b"ContentType"))
                        {
                            types.defaults.push((ext.to_ascii_lowercase(), ct));
                        }
                    }
                    b"Override" => {
                        if let (Some(part), Some(ct)) =
                            (attr(e, b"PartName"), attr(e, b"ContentType"))
                        {
                            types.overrides.push((part, ct));
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(types)
    }

    pub fn has_default(&self, extension: &str) -> bool {
        let extension = extension.to_ascii_lowercase();
        self.defaults.iter().any(|(ext, _)| *ext == extension)
    }

    pub fn ensure_default(&mut self, extension: &str, content_type: &str) {
        if !self.has_default(extension) {
            self.defaults
                .push((extension.to_ascii_lowercase(), content_type.to_string()));
        }
    }

    pub fn set_override(&mut self, part: &str, content_type: &str) {
        let name = format!("/{}", part);
        self.overrides.retain(|(p, _)| *p != name);
        self.overrides.push((name, content_type.to_string()));
    }

    pub fn remove_override(&mut self, part: &str) {
        let name = format!("/{}", part);
        self.overrides.retain(|(p, _)| *p != name);
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        );
        for (ext, ct) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape(ext.as_str()),
                escape(ct.as_str())
            ));
        }
        for (part, ct) in &self.overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape(part.as_str()),
                escape(ct.as_str())
            ));
        }
        xml.push_str("</Types>");
        xml
    }
}

/// An OPC presentation package held fully in memory.
///
/// Each generation run loads its own package; slide mutation is destructive
/// and the package is never shared between runs.
pub struct PptxPackage {
    parts: BTreeMap<String, Vec<u8>>,
    content_types: ContentTypes,
    presentation_part: String,
    presentation_rels: Vec<Relationship>,
    slide_size: SlideSize,
    slides: Vec<SlideEntry>,
}

impl PptxPackage {
    /// Load a package from a `.pptx` file
    pub fn open(path: &Path) -> Result<Self> {
        info!("Loading template package {:?}", path);
        if !path.exists() {
            return Err(DeckError::PathNotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;
        Self::from_bytes(bytes)
    }

    /// Load a package from in-memory `.pptx` bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = BTreeMap::new();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().trim_start_matches('/').to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            parts.insert(name, data);
        }

        let content_types = match parts.get(CONTENT_TYPES_PART) {
            Some(xml) => ContentTypes::parse(xml)?,
            None => {
                return Err(DeckError::Pptx(
                    "Package has no [Content_Types].xml".to_string(),
                ))
            }
        };

        let root_rels = match parts.get("_rels/.rels") {
            Some(xml) => parse_relationships(xml)?,
            None => Vec::new(),
        };
        let presentation_part = root_rels
            .iter()
            .find(|r| r.rel_type == REL_OFFICE_DOCUMENT)
            .map(|r| r.target.trim_start_matches('/').to_string())
            .unwrap_or_else(|| "ppt/presentation.xml".to_string());

        let presentation_xml = parts.get(&presentation_part).ok_or_else(|| {
            DeckError::Pptx(format!("Missing presentation part {}", presentation_part))
        })?;
        let summary = scan_presentation(presentation_xml)?;

        let presentation_rels = match parts.get(&rels_path_for(&presentation_part)) {
            Some(xml) => parse_relationships(xml)?,
            None => Vec::new(),
        };

        let slides = summary
            .slide_rel_ids
            .iter()
            .filter_map(|rel_id| {
                presentation_rels
                    .iter()
                    .find(|r| r.id == *rel_id)
                    .map(|r| SlideEntry {
                        part: resolve_target(&presentation_part, &r.target),
                        rel_id: rel_id.clone(),
                    })
            })
            .collect::<Vec<_>>();

        debug!(
            "Package has {} parts and {} slides",
            parts.len(),
            slides.len()
        );

        Ok(Self {
            parts,
            content_types,
            presentation_part,
            presentation_rels,
            slide_size: summary.slide_size.unwrap_or(DEFAULT_SLIDE_SIZE),
            slides,
        })
    }

    pub fn slide_size(&self) -> SlideSize {
        self.slide_size
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Raw bytes of a part, by package path without a leading slash
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(Vec::as_slice)
    }

    /// Relationships declared by a part; empty when it has none
    pub fn relationships_of(&self, part: &str) -> Result<Vec<Relationship>> {
        match self.parts.get(&rels_path_for(part)) {
            Some(xml) => parse_relationships(xml),
            None => Ok(Vec::new()),
        }
    }

    /// Slide master parts in `sldMasterIdLst` order
    pub fn master_parts(&self) -> Result<Vec<String>> {
        let xml = self
            .part(&self.presentation_part)
            .ok_or_else(|| DeckError::Pptx("Presentation part vanished".to_string()))?;
        let summary = scan_presentation(xml)?;

        let mut masters: Vec<String> = summary
            .master_rel_ids
            .iter()
            .filter_map(|rel_id| self.presentation_rels.iter().find(|r| r.id == *rel_id))
            .map(|r| resolve_target(&self.presentation_part, &r.target))
            .collect();

        if masters.is_empty() {
            masters = self
                .presentation_rels
                .iter()
                .filter(|r| r.rel_type == REL_SLIDE_MASTER)
                .map(|r| resolve_target(&self.presentation_part, &r.target))
                .collect();
        }

        Ok(masters)
    }

    /// Slide part names in presentation order
    pub fn slide_parts(&self) -> Vec<String> {
        self.slides.iter().map(|s| s.part.clone()).collect()
    }

    /// Remove every slide so the template only donates masters, layouts and theme
    pub fn strip_slides(&mut self) {
        let removed = self.slides.len();
        self.slides.clear();
        self.presentation_rels.retain(|r| r.rel_type != REL_SLIDE);

        let doomed: Vec<String> = self
            .parts
            .keys()
            .filter(|k| {
                k.starts_with("ppt/slides/")
                    || k.starts_with("ppt/notesSlides/")
                    || k.starts_with("ppt/comments/")
            })
            .cloned()
            .collect();
        for part in doomed {
            self.parts.remove(&part);
            self.content_types.remove_override(&part);
        }

        info!("Stripped {} template slides", removed);
    }

    /// Append a slide after the existing ones and return its 1-based number
    pub fn add_slide(&mut self, slide: SlidePart) -> Result<usize> {
        if !self.parts.contains_key(&slide.layout_part) {
            return Err(DeckError::Pptx(format!(
                "Unknown layout part {}",
                slide.layout_part
            )));
        }

        let mut number = self.slides.len() + 1;
        while self.parts.contains_key(&format!("ppt/slides/slide{}.xml", number)) {
            number += 1;
        }
        let part = format!("ppt/slides/slide{}.xml", number);

        let mut rels = vec![Relationship {
            id: "rId1".to_string(),
            rel_type: REL_SLIDE_LAYOUT.to_string(),
            target: relative_target(&part, &slide.layout_part),
            external: false,
        }];

        for media in slide.media {
            let extension = media.extension.to_ascii_lowercase();
            let media_part = self.next_media_name(&extension);
            self.content_types
                .ensure_default(&extension, image_content_type(&extension));
            rels.push(Relationship {
                id: media.rel_id,
                rel_type: REL_IMAGE.to_string(),
                target: relative_target(&part, &media_part),
                external: false,
            });
            self.parts.insert(media_part, media.bytes);
        }

        self.parts
            .insert(rels_path_for(&part), write_relationships(&rels).into_bytes());
        self.parts.insert(part.clone(), slide.xml.into_bytes());
        self.content_types.set_override(&part, CT_SLIDE);

        let rel_id = next_rel_id(&self.presentation_rels);
        self.presentation_rels.push(Relationship {
            id: rel_id.clone(),
            rel_type: REL_SLIDE.to_string(),
            target: relative_target(&self.presentation_part, &part),
            external: false,
        });
        self.slides.push(SlideEntry { part, rel_id });

        debug!("Added slide {}", self.slides.len());
        Ok(self.slides.len())
    }

    fn next_media_name(&self, extension: &str) -> String {
        let mut n = 1;
        loop {
            let name = format!("ppt/media/deck_image{}.{}", n, extension);
            if !self.parts.contains_key(&name) {
                return name;
            }
            n += 1;
        }
    }

    /// Serialise the package, refreshing the parts that list slides
    pub fn write_to<W: Write + Seek>(&mut self, writer: W, title: &str) -> Result<()> {
        self.refresh_parts(title)?;

        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file(CONTENT_TYPES_PART, options)?;
        zip.write_all(self.content_types.to_xml().as_bytes())?;

        for (name, data) in &self.parts {
            if name == CONTENT_TYPES_PART {
                continue;
            }
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }

        zip.finish()?;
        Ok(())
    }

    /// Serialise the package into memory
    pub fn to_bytes(&mut self, title: &str) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_to(&mut cursor, title)?;
        Ok(cursor.into_inner())
    }

    /// Write the package to `output_file` without ever exposing a partial file
    pub fn save(&mut self, output_file: &Path, title: &str) -> Result<()> {
        let dir = match output_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::path::PathBuf::from("."),
        };
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }

        let mut temp = tempfile::NamedTempFile::new_in(&dir)?;
        self.write_to(temp.as_file_mut(), title)?;
        temp.as_file().sync_all()?;
        temp.persist(output_file).map_err(|e| DeckError::Io(e.error))?;

        info!("PPTX file created at {:?}", output_file);
        Ok(())
    }

    fn refresh_parts(&mut self, title: &str) -> Result<()> {
        let slide_ids: Vec<(u32, String)> = self
            .slides
            .iter()
            .enumerate()
            .map(|(i, s)| (FIRST_SLIDE_ID + i as u32, s.rel_id.clone()))
            .collect();

        let presentation = self
            .parts
            .get(&self.presentation_part)
            .ok_or_else(|| DeckError::Pptx("Presentation part vanished".to_string()))?;
        let rewritten = rewrite_presentation(presentation, &slide_ids)?;
        self.parts.insert(self.presentation_part.clone(), rewritten);
        self.parts.insert(
            rels_path_for(&self.presentation_part),
            write_relationships(&self.presentation_rels).into_bytes(),
        );

        self.prune_orphan_media()?;

        if self.parts.contains_key("docProps/app.xml") {
            let app_xml = format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
    <Application>slidesmith</Application>
    <Slides>{}</Slides>
</Properties>"#,
                self.slides.len()
            );
            self.parts
                .insert("docProps/app.xml".to_string(), app_xml.into_bytes());
        }

        if self.parts.contains_key("docProps/core.xml") {
            let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let core_xml = format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
    <dc:title>{title}</dc:title>
    <dc:creator>slidesmith</dc:creator>
    <dcterms:created xsi:type="dcterms:W3CDTF">{now}</dcterms:created>
    <dcterms:modified xsi:type="dcterms:W3CDTF">{now}</dcterms:modified>
    <cp:revision>1</cp:revision>
</cp:coreProperties>"#,
                title = escape(title),
                now = now
            );
            self.parts
                .insert("docProps/core.xml".to_string(), core_xml.into_bytes());
        }

        Ok(())
    }

    /// Drop media no remaining relationship points at
    fn prune_orphan_media(&mut self) -> Result<()> {
        let mut referenced = BTreeSet::new();
        for (name, data) in &self.parts {
            let Some(source) = source_part_for_rels(name) else {
                continue;
            };
            for rel in parse_relationships(data)? {
                if !rel.external {
                    referenced.insert(resolve_target(&source, &rel.target));
                }
            }
        }

        let orphans: Vec<String> = self
            .parts
            .keys()
            .filter(|k| k.starts_with("ppt/media/") && !referenced.contains(*k))
            .cloned()
            .collect();
        for part in orphans {
            debug!("Dropping unreferenced media {}", part);
            self.parts.remove(&part);
        }
        Ok(())
    }
}

struct PresentationSummary {
    slide_size: Option<SlideSize>,
    slide_rel_ids: Vec<String>,
    master_rel_ids: Vec<String>,
}

fn scan_presentation(xml: &[u8]) -> Result<PresentationSummary> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut summary = PresentationSummary {
        slide_size: None,
        slide_rel_ids: Vec::new(),
        master_rel_ids: Vec::new(),
    };

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(ref e) | Event::Start(ref e) => match e.local_name().as_ref() {
                b"sldSz" => {
                    let cx = attr(e, b"cx").and_then(|v| v.parse::<i64>().ok());
                    let cy = attr(e, b"cy").and_then(|v| v.parse::<i64>().ok());
                    if let (Some(width), Some(height)) = (cx, cy) {
                        summary.slide_size = Some(SlideSize { width, height });
                    }
                }
                b"sldId" => {
                    if let Some(id) = rel_id_attr(e) {
                        summary.slide_rel_ids.push(id);
                    }
                }
                b"sldMasterId" => {
                    if let Some(id) = rel_id_attr(e) {
                        summary.master_rel_ids.push(id);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(summary)
}

/// Rewrite `presentation.xml` with a fresh slide list.
///
/// Custom shows and section lists are dropped since they name slide ids
/// that no longer exist.
fn rewrite_presentation(xml: &[u8], slide_ids: &[(u32, String)]) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + 64 * slide_ids.len()));
    let mut buf = Vec::new();

    let mut depth = 0usize;
    let mut skip_until: Option<usize> = None;
    let mut list_written = slide_ids.is_empty();
    let mut p_prefix = String::from("p");
    let mut r_prefix = String::from("r");

    loop {
        let event = reader.read_event_into(&mut buf)?;
        let mut emit = skip_until.is_none();
        match &event {
            Event::Eof => break,
            Event::Start(e) => {
                depth += 1;
                if emit {
                    if depth == 1 {
                        if let Some(p) = namespace_prefix(e, NS_PRESENTATION) {
                            p_prefix = p;
                        }
                        if let Some(r) = namespace_prefix(e, NS_RELATIONSHIPS) {
                            r_prefix = r;
                        }
                    }
                    if is_stale_slide_reference(e, depth) {
                        skip_until = Some(depth);
                        emit = false;
                    } else if depth == 2 && !list_written && follows_slide_list(e) {
                        write_slide_list(&mut writer, &p_prefix, &r_prefix, slide_ids);
                        list_written = true;
                    }
                }
            }
            Event::End(_) => {
                if let Some(level) = skip_until {
                    if level == depth {
                        skip_until = None;
                    }
                } else if depth == 1 && !list_written {
                    write_slide_list(&mut writer, &p_prefix, &r_prefix, slide_ids);
                    list_written = true;
                }
                depth -= 1;
            }
            Event::Empty(e) => {
                if emit {
                    if is_stale_slide_reference(e, depth + 1) {
                        emit = false;
                    } else if depth + 1 == 2 && !list_written && follows_slide_list(e) {
                        write_slide_list(&mut writer, &p_prefix, &r_prefix, slide_ids);
                        list_written = true;
                    }
                }
            }
            _ => {}
        }
        if emit {
            writer.write_event(event)?;
        }
        buf.clear();
    }

    Ok(writer.into_inner())
}

fn is_stale_slide_reference(e: &BytesStart, depth: usize) -> bool {
    match e.local_name().as_ref() {
        b"sldIdLst" | b"custShowLst" => depth == 2,
        b"ext" => attr(e, b"uri").as_deref() == Some(SECTION_LIST_EXT_URI),
        _ => false,
    }
}

fn follows_slide_list(e: &BytesStart) -> bool {
    matches!(
        e.local_name().as_ref(),
        b"sldSz"
            | b"notesSz"
            | b"smartTags"
            | b"embeddedFontLst"
            | b"custShowLst"
            | b"photoAlbum"
            | b"custDataLst"
            | b"kinsoku"
            | b"defaultTextStyle"
            | b"modifyVerifier"
            | b"extLst"
    )
}

fn write_slide_list(
    writer: &mut Writer<Vec<u8>>,
    p: &str,
    r: &str,
    slide_ids: &[(u32, String)],
) {
    let out = writer.get_mut();
    out.extend_from_slice(format!("<{}:sldIdLst>", p).as_bytes());
    for (id, rel_id) in slide_ids {
        out.extend_from_slice(
            format!(r#"<{}:sldId id="{}" {}:id="{}"/>"#, p, id, r, escape(rel_id.as_str()))
                .as_bytes(),
        );
    }
    out.extend_from_slice(format!("</{}:sldIdLst>", p).as_bytes());
}

fn namespace_prefix(e: &BytesStart, uri: &str) -> Option<String> {
    e.attributes().flatten().find_map(|a| {
        let key = a.key.as_ref();
        if key.starts_with(b"xmlns:") && a.value.as_ref() == uri.as_bytes() {
            Some(String::from_utf8_lossy(&key[6..]).to_string())
        } else {
            None
        }
    })
}

/// Unprefixed attribute value by local name
pub(crate) fn attr(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(|v| v.to_string()))
}

/// The `r:id` attribute, whatever prefix the relationships namespace uses
pub(crate) fn rel_id_attr(e: &BytesStart) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.prefix().is_some() && a.key.local_name().as_ref() == b"id")
        .and_then(|a| a.unescape_value().ok().map(|v| v.to_string()))
}

/// Parse a `.rels` part
pub fn parse_relationships(xml: &[u8]) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut rels = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(ref e) | Event::Start(ref e) => {
                if e.local_name().as_ref() == b"Relationship" {
                    if let (Some(id), Some(rel_type), Some(target)) =
                        (attr(e, b"Id"), attr(e, b"Type"), attr(e, b"Target"))
                    {
                        let external = attr(e, b"TargetMode").as_deref() == Some("External");
                        rels.push(Relationship {
                            id,
                            rel_type,
                            target,
                            external,
                        });
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

/// Serialise relationships into a `.rels` part
pub fn write_relationships(rels: &[Relationship]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for rel in rels {
        let mode = if rel.external {
            r#" TargetMode="External""#
        } else {
            ""
        };
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}" Target="{}"{}/>"#,
            escape(rel.id.as_str()),
            escape(rel.rel_type.as_str()),
            escape(rel.target.as_str()),
            mode
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

/// `ppt/slides/slide1.xml` → `ppt/slides/_rels/slide1.xml.rels`
pub fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Inverse of [`rels_path_for`]
fn source_part_for_rels(rels_part: &str) -> Option<String> {
    let stripped = rels_part.strip_suffix(".rels")?;
    let (dir, file) = stripped.rsplit_once("_rels/")?;
    Some(format!("{}{}", dir, file))
}

/// Resolve a relationship target against the part that declares it
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = source_part.split('/').collect();
    segments.pop();
    for piece in target.split('/') {
        match piece {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Relative target from one part to another, as written in `.rels` parts
pub fn relative_target(from_part: &str, to_part: &str) -> String {
    let from: Vec<&str> = from_part.split('/').collect();
    let to: Vec<&str> = to_part.split('/').collect();
    let from_dir = &from[..from.len().saturating_sub(1)];

    let common = from_dir
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut pieces: Vec<&str> = Vec::new();
    for _ in common..from_dir.len() {
        pieces.push("..");
    }
    pieces.extend_from_slice(&to[common..]);
    pieces.join("/")
}

fn next_rel_id(rels: &[Relationship]) -> String {
    let max = rels
        .iter()
        .filter_map(|r| r.id.strip_prefix("rId").and_then(|n| n.parse::<u32>().ok()))
        .max()
        .unwrap_or(0);
    format!("rId{}", max + 1)
}

/// Content type for an image extension
pub fn image_content_type(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_targets() {
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "../slideLayouts/slideLayout2.xml"),
            "ppt/slideLayouts/slideLayout2.xml"
        );
        assert_eq!(
            resolve_target("ppt/presentation.xml", "slides/slide3.xml"),
            "ppt/slides/slide3.xml"
        );
        assert_eq!(
            resolve_target("ppt/presentation.xml", "/ppt/theme/theme1.xml"),
            "ppt/theme/theme1.xml"
        );
    }

    #[test]
    fn computes_relative_targets() {
        assert_eq!(
            relative_target("ppt/slides/slide1.xml", "ppt/slideLayouts/slideLayout2.xml"),
            "../slideLayouts/slideLayout2.xml"
        );
        assert_eq!(
            relative_target("ppt/presentation.xml", "ppt/slides/slide1.xml"),
            "slides/slide1.xml"
        );
        assert_eq!(
            relative_target("ppt/slides/slide1.xml", "ppt/media/deck_image1.png"),
            "../media/deck_image1.png"
        );
    }

    #[test]
    fn rels_paths_round_trip() {
        let rels = rels_path_for("ppt/slides/slide4.xml");
        assert_eq!(rels, "ppt/slides/_rels/slide4.xml.rels");
        assert_eq!(
            source_part_for_rels(&rels).as_deref(),
            Some("ppt/slides/slide4.xml")
        );
        assert_eq!(source_part_for_rels("_rels/.rels").as_deref(), Some(""));
    }

    #[test]
    fn rewrite_replaces_slide_list_and_drops_sections() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst><p:sldId id="256" r:id="rId7"/></p:sldIdLst><p:sldSz cx="9144000" cy="6858000"/><p:notesSz cx="6858000" cy="9144000"/><p:extLst><p:ext uri="{521415D9-36F7-43E2-AB2F-B90AF26B5E84}"><p14:sectionLst xmlns:p14="http://schemas.microsoft.com/office/powerpoint/2010/main"><p14:section name="A" id="{1}"><p14:sldIdLst><p14:sldId id="256"/></p14:sldIdLst></p14:section></p14:sectionLst></p:ext></p:extLst></p:presentation>"#;

        let out = rewrite_presentation(
            xml,
            &[(256, "rId2".to_string()), (257, "rId3".to_string())],
        )
        .unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains(r#"<p:sldIdLst><p:sldId id="256" r:id="rId2"/><p:sldId id="257" r:id="rId3"/></p:sldIdLst><p:sldSz"#));
        assert!(!out.contains("rId7"));
        assert!(!out.contains("sectionLst"));
        assert!(out.contains("<p:extLst></p:extLst>"));
    }

    #[test]
    fn rewrite_inserts_missing_slide_list_before_size() {
        let xml = br#"<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldSz cx="9144000" cy="6858000"/></p:presentation>"#;
        let out = rewrite_presentation(xml, &[(256, "rId5".to_string())]).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains(r#"</p:sldMasterIdLst><p:sldIdLst><p:sldId id="256" r:id="rId5"/></p:sldIdLst><p:sldSz"#));
    }

    #[test]
    fn content_types_track_overrides() {
        let mut types = ContentTypes::parse(
            br#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/ppt/slides/slide1.xml" ContentType="x"/></Types>"#,
        )
        .unwrap();
        types.remove_override("ppt/slides/slide1.xml");
        types.ensure_default("PNG", "image/png");
        types.ensure_default("png", "image/png");
        types.set_override("ppt/slides/slide2.xml", CT_SLIDE);

        let xml = types.to_xml();
        assert!(!xml.contains("/ppt/slides/slide1.xml"));
        assert_eq!(xml.matches(r#"Extension="png""#).count(), 1);
        assert!(xml.contains(r#"PartName="/ppt/slides/slide2.xml""#));
    }
}
