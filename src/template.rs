// ABOUTME: Template introspection module for the slidesmith application
// ABOUTME: Discovers layouts and placeholder roles in third-party templates and picks layouts

use crate::builtin;
use crate::config::Config;
use crate::errors::{DeckError, Result};
use crate::pptx::{attr, rel_id_attr, resolve_target, PptxPackage, SlideSize, REL_SLIDE_LAYOUT};
use log::{debug, info, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fmt;
use std::path::{Path, PathBuf};

/// Best-effort, non-authoritative guess at what a placeholder slot holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleHint {
    Title,
    Body,
    Subtitle,
    Picture,
    Other,
    Unknown,
}

impl fmt::Display for RoleHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoleHint::Title => "TITLE",
            RoleHint::Body => "BODY",
            RoleHint::Subtitle => "SUBTITLE",
            RoleHint::Picture => "PICTURE",
            RoleHint::Other => "OTHER",
            RoleHint::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDirection {
    Horizontal,
    Vertical,
}

/// Position and size in EMUs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
}

impl Geometry {
    pub fn new(left: i64, top: i64, width: i64, height: i64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> i64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> i64 {
        self.top + self.height
    }
}

/// A placeholder declared by a layout
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderSlot {
    pub slot_index: u32,
    pub ph_type: Option<String>,
    pub name: String,
    pub role: RoleHint,
    pub geometry: Option<Geometry>,
    pub text_direction: TextDirection,
    pub prompt_text: Option<String>,
    pub orient: Option<String>,
    pub size: Option<String>,
}

/// A named arrangement of placeholder slots
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutDefinition {
    pub index: usize,
    pub name: String,
    pub part: String,
    pub slots: Vec<PlaceholderSlot>,
}

impl LayoutDefinition {
    /// First slot classified with `role`
    pub fn slot(&self, role: RoleHint) -> Option<&PlaceholderSlot> {
        self.slots.iter().find(|s| s.role == role)
    }
}

/// Classify a placeholder from its type, index, shape name and layout name.
///
/// The explicit placeholder type wins. Typeless, `body` and `obj` slots fall
/// through to shape-name hints, then to the title-layout convention that
/// slot 1 carries the subtitle, and finally to BODY.
pub fn classify_slot(ph_type: Option<&str>, slot_index: u32, name: &str, layout_name: &str) -> RoleHint {
    match ph_type {
        Some("title") | Some("ctrTitle") => return RoleHint::Title,
        Some("subTitle") => return RoleHint::Subtitle,
        Some("pic") => return RoleHint::Picture,
        Some("dt") | Some("ftr") | Some("sldNum") | Some("hdr") | Some("sldImg") => {
            return RoleHint::Other
        }
        Some("chart") | Some("tbl") | Some("dgm") | Some("media") | Some("clipArt") => {
            return RoleHint::Other
        }
        Some("body") | Some("obj") | None => {}
        Some(_) => return RoleHint::Unknown,
    }

    let name = name.to_lowercase();
    if name.contains("subtitle") {
        return RoleHint::Subtitle;
    }
    if name.contains("picture") || name.contains("image") || name.contains("photo") {
        return RoleHint::Picture;
    }
    if slot_index == 1 && is_title_like_name(layout_name) {
        return RoleHint::Subtitle;
    }
    RoleHint::Body
}

fn is_vertical(vert: Option<&str>) -> bool {
    matches!(
        vert,
        Some("vert")
            | Some("vert270")
            | Some("eaVert")
            | Some("wordArtVert")
            | Some("wordArtVertRtl")
            | Some("mongolianVert")
    )
}

/// Names of title-ish layouts beyond "Title Slide"
pub const TITLE_LAYOUT_NAMES: &[&str] = &["Title", "Cover", "Cover Page", "Opening"];

/// Names of content-ish layouts beyond "Title and Content"
pub const CONTENT_LAYOUT_NAMES: &[&str] = &[
    "Content",
    "Text and Content",
    "Text",
    "Title and Text",
    "Section Header",
    "Two Content",
];

fn name_has(layout: &LayoutDefinition, needle: &str) -> bool {
    layout.name.to_lowercase().contains(&needle.to_lowercase())
}

fn name_is(layout: &LayoutDefinition, candidate: &str) -> bool {
    layout.name.trim().eq_ignore_ascii_case(candidate)
}

pub fn is_title_slide_layout(layout: &LayoutDefinition) -> bool {
    name_has(layout, "Title Slide")
}

pub fn is_named_title_layout(layout: &LayoutDefinition) -> bool {
    TITLE_LAYOUT_NAMES.iter().any(|n| name_is(layout, n))
}

pub fn mentions_title_layout_name(layout: &LayoutDefinition) -> bool {
    TITLE_LAYOUT_NAMES.iter().any(|n| name_has(layout, n))
}

pub fn is_title_and_content_layout(layout: &LayoutDefinition) -> bool {
    name_has(layout, "Title and Content")
}

pub fn is_named_content_layout(layout: &LayoutDefinition) -> bool {
    CONTENT_LAYOUT_NAMES.iter().any(|n| name_is(layout, n))
}

pub fn mentions_content_layout_name(layout: &LayoutDefinition) -> bool {
    CONTENT_LAYOUT_NAMES.iter().any(|n| name_has(layout, n))
}

fn is_title_like_name(layout_name: &str) -> bool {
    let lower = layout_name.to_lowercase();
    lower.contains("title slide")
        || ["cover", "opening"].iter().any(|n| lower.contains(n))
        || lower.trim() == "title"
}

type LayoutRule = (&'static str, fn(&LayoutDefinition) -> bool);

/// Title layout rules, tried in order
pub const TITLE_LAYOUT_RULES: &[LayoutRule] = &[
    ("title slide", is_title_slide_layout),
    ("named title", is_named_title_layout),
    ("title-like name", mentions_title_layout_name),
];

/// Content layout rules, tried in order over layouts other than the title layout
pub const CONTENT_LAYOUT_RULES: &[LayoutRule] = &[
    ("title and content", is_title_and_content_layout),
    ("named content", is_named_content_layout),
    ("content-like name", mentions_content_layout_name),
];

fn first_match<'a, I>(rules: &[LayoutRule], candidates: I) -> Option<(&'static str, &'a LayoutDefinition)>
where
    I: Iterator<Item = &'a LayoutDefinition> + Clone,
{
    rules.iter().find_map(|(label, rule)| {
        candidates
            .clone()
            .find(|layout| rule(layout))
            .map(|layout| (*label, layout))
    })
}

/// Where a template document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    File(PathBuf),
    Builtin,
}

/// A loaded template: its package plus the layouts discovered in it
pub struct TemplateDocument {
    package: PptxPackage,
    layouts: Vec<LayoutDefinition>,
}

impl TemplateDocument {
    /// Load a fresh, independently owned copy of a template
    pub fn load(source: &TemplateSource) -> Result<Self> {
        let package = match source {
            TemplateSource::File(path) => PptxPackage::open(path)?,
            TemplateSource::Builtin => builtin::default_template_package()?,
        };
        Self::from_package(package)
    }

    pub fn from_package(package: PptxPackage) -> Result<Self> {
        let layouts = discover_layouts(&package)?;
        info!("Template exposes {} layouts", layouts.len());
        Ok(Self { package, layouts })
    }

    pub fn layouts(&self) -> &[LayoutDefinition] {
        &self.layouts
    }

    pub fn slide_size(&self) -> SlideSize {
        self.package.slide_size()
    }

    pub fn package(&self) -> &PptxPackage {
        &self.package
    }

    pub fn package_mut(&mut self) -> &mut PptxPackage {
        &mut self.package
    }

    /// Layout used for the opening slide
    pub fn resolve_title_layout(&self) -> Result<&LayoutDefinition> {
        let first = self.layouts.first().ok_or_else(|| {
            DeckError::EmptyTemplate("template declares no slide layouts".to_string())
        })?;

        let (rule, layout) =
            first_match(TITLE_LAYOUT_RULES, self.layouts.iter()).unwrap_or(("first layout", first));
        debug!("Title layout '{}' chosen by rule: {}", layout.name, rule);
        Ok(layout)
    }

    /// Layout used for content slides, avoiding `excluding` whenever possible
    pub fn resolve_content_layout(&self, excluding: &LayoutDefinition) -> Result<&LayoutDefinition> {
        if self.layouts.is_empty() {
            return Err(DeckError::EmptyTemplate(
                "template declares no slide layouts".to_string(),
            ));
        }

        let others = self.layouts.iter().filter(|l| l.index != excluding.index);
        let chosen = first_match(CONTENT_LAYOUT_RULES, others.clone())
            .or_else(|| others.clone().next().map(|l| ("first non-title layout", l)))
            .or_else(|| self.layouts.get(1).map(|l| ("second layout", l)));

        let (rule, layout) = match chosen {
            Some(found) => found,
            None => {
                warn!("Template has a single layout; reusing it for content slides");
                ("only layout", &self.layouts[0])
            }
        };
        debug!("Content layout '{}' chosen by rule: {}", layout.name, rule);
        Ok(layout)
    }

    /// Human-readable layout and slot listing
    pub fn describe(&self) -> String {
        let size = self.slide_size();
        let mut out = format!(
            "Slide size: {} x {} EMU\nNumber of layouts: {}\n",
            size.width,
            size.height,
            self.layouts.len()
        );
        for layout in &self.layouts {
            out.push_str(&format!("\nLayout {}: {}\n", layout.index, layout.name));
            for slot in &layout.slots {
                let geometry = slot
                    .geometry
                    .map(|g| format!("{},{} {}x{}", g.left, g.top, g.width, g.height))
                    .unwrap_or_else(|| "inherited".to_string());
                out.push_str(&format!(
                    "  - Index {}: {} ({}, {}){}\n",
                    slot.slot_index,
                    slot.name,
                    slot.role,
                    geometry,
                    if slot.text_direction == TextDirection::Vertical {
                        " vertical"
                    } else {
                        ""
                    }
                ));
            }
        }
        out
    }
}

#[derive(Debug, Default)]
struct RawShape {
    name: String,
    ph: Option<RawPlaceholder>,
    geometry: Option<Geometry>,
    vert: Option<String>,
    text: String,
}

#[derive(Debug, Default)]
struct RawPlaceholder {
    ph_type: Option<String>,
    idx: Option<u32>,
    orient: Option<String>,
    size: Option<String>,
}

struct ParsedPart {
    name: String,
    shapes: Vec<RawShape>,
    layout_rel_ids: Vec<String>,
}

fn parse_drawing_part(xml: &[u8]) -> Result<ParsedPart> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(false);
    let mut buf = Vec::new();

    let mut parsed = ParsedPart {
        name: String::new(),
        shapes: Vec::new(),
        layout_rel_ids: Vec::new(),
    };
    let mut current: Option<RawShape> = None;
    let mut sp_depth = 0usize;
    let mut depth = 0usize;
    let mut in_xfrm = false;
    let mut in_text = false;
    let mut offset: Option<(i64, i64)> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                depth += 1;
                let local = e.local_name();
                match local.as_ref() {
                    b"sp" if current.is_none() => {
                        current = Some(RawShape::default());
                        sp_depth = depth;
                    }
                    b"xfrm" if current.is_some() => {
                        in_xfrm = true;
                        offset = None;
                    }
                    b"t" if current.is_some() => in_text = true,
                    _ => handle_element(e, &mut parsed, current.as_mut(), in_xfrm, &mut offset),
                }
            }
            Event::Empty(ref e) => {
                handle_element(e, &mut parsed, current.as_mut(), in_xfrm, &mut offset)
            }
            Event::Text(ref t) => {
                if in_text {
                    if let Some(shape) = current.as_mut() {
                        let text = t.unescape().map_err(DeckError::from)?;
                        shape.text.push_str(&text);
                    }
                }
            }
            Event::End(ref e) => {
                match e.local_name().as_ref() {
                    b"sp" if current.is_some() && depth == sp_depth => {
                        if let Some(shape) = current.take() {
                            parsed.shapes.push(shape);
                        }
                    }
                    b"xfrm" => in_xfrm = false,
                    b"t" => in_text = false,
                    b"p" => {
                        if let Some(shape) = current.as_mut() {
                            if !shape.text.is_empty() && !shape.text.ends_with('\n') {
                                shape.text.push('\n');
                            }
                        }
                    }
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(parsed)
}

fn handle_element(
    e: &BytesStart,
    parsed: &mut ParsedPart,
    current: Option<&mut RawShape>,
    in_xfrm: bool,
    offset: &mut Option<(i64, i64)>,
) {
    let local = e.local_name();
    match (local.as_ref(), current) {
        (b"cSld", None) => {
            if let Some(name) = attr(e, b"name") {
                parsed.name = name;
            }
        }
        (b"sldLayoutId", None) => {
            if let Some(id) = rel_id_attr(e) {
                parsed.layout_rel_ids.push(id);
            }
        }
        (b"cNvPr", Some(shape)) => {
            if shape.name.is_empty() {
                shape.name = attr(e, b"name").unwrap_or_default();
            }
        }
        (b"ph", Some(shape)) => {
            shape.ph = Some(RawPlaceholder {
                ph_type: attr(e, b"type"),
                idx: attr(e, b"idx").and_then(|v| v.parse().ok()),
                orient: attr(e, b"orient"),
                size: attr(e, b"sz"),
            });
        }
        (b"off", Some(_)) if in_xfrm => {
            let x = attr(e, b"x").and_then(|v| v.parse().ok());
            let y = attr(e, b"y").and_then(|v| v.parse().ok());
            if let (Some(x), Some(y)) = (x, y) {
                *offset = Some((x, y));
            }
        }
        (b"ext", Some(shape)) if in_xfrm => {
            let cx = attr(e, b"cx").and_then(|v| v.parse().ok());
            let cy = attr(e, b"cy").and_then(|v| v.parse().ok());
            if let (Some((x, y)), Some(cx), Some(cy)) = (*offset, cx, cy) {
                if shape.geometry.is_none() {
                    shape.geometry = Some(Geometry::new(x, y, cx, cy));
                }
            }
        }
        (b"bodyPr", Some(shape)) => {
            if shape.vert.is_none() {
                shape.vert = attr(e, b"vert");
            }
        }
        _ => {}
    }
}

/// Master placeholder type that a layout placeholder inherits geometry from
fn inheritance_key(ph_type: Option<&str>) -> &str {
    match ph_type {
        Some("title") | Some("ctrTitle") => "title",
        Some("subTitle") | Some("body") | Some("obj") | None => "body",
        Some(other) => other,
    }
}

fn discover_layouts(package: &PptxPackage) -> Result<Vec<LayoutDefinition>> {
    let mut layouts = Vec::new();

    for master_part in package.master_parts()? {
        let Some(master_xml) = package.part(&master_part) else {
            warn!("Slide master {} is missing", master_part);
            continue;
        };
        let master = parse_drawing_part(master_xml)?;
        let master_rels = package.relationships_of(&master_part)?;

        let mut layout_parts: Vec<String> = master
            .layout_rel_ids
            .iter()
            .filter_map(|id| master_rels.iter().find(|r| r.id == *id))
            .map(|r| resolve_target(&master_part, &r.target))
            .collect();
        if layout_parts.is_empty() {
            layout_parts = master_rels
                .iter()
                .filter(|r| r.rel_type == REL_SLIDE_LAYOUT)
                .map(|r| resolve_target(&master_part, &r.target))
                .collect();
        }

        for layout_part in layout_parts {
            let Some(layout_xml) = package.part(&layout_part) else {
                warn!("Slide layout {} is missing", layout_part);
                continue;
            };
            let parsed = parse_drawing_part(layout_xml)?;
            let layout = build_layout(layouts.len(), layout_part, parsed, &master.shapes);
            debug!(
                "Layout {} '{}' has {} placeholder slots",
                layout.index,
                layout.name,
                layout.slots.len()
            );
            layouts.push(layout);
        }
    }

    Ok(layouts)
}

fn build_layout(index: usize, part: String, parsed: ParsedPart, master_shapes: &[RawShape]) -> LayoutDefinition {
    let layout_name = parsed.name;
    let slots = parsed
        .shapes
        .into_iter()
        .filter_map(|shape| {
            let ph = shape.ph?;
            let slot_index = ph.idx.unwrap_or(0);
            let role = classify_slot(ph.ph_type.as_deref(), slot_index, &shape.name, &layout_name);

            let key = inheritance_key(ph.ph_type.as_deref());
            let geometry = shape.geometry.or_else(|| {
                master_shapes
                    .iter()
                    .filter_map(|m| m.ph.as_ref().map(|mp| (mp, m)))
                    .find(|(mp, _)| inheritance_key(mp.ph_type.as_deref()) == key)
                    .and_then(|(_, m)| m.geometry)
            });

            let vertical = is_vertical(shape.vert.as_deref()) || ph.orient.as_deref() == Some("vert");
            let prompt = shape.text.trim();

            Some(PlaceholderSlot {
                slot_index,
                ph_type: ph.ph_type,
                name: shape.name,
                role,
                geometry,
                text_direction: if vertical {
                    TextDirection::Vertical
                } else {
                    TextDirection::Horizontal
                },
                prompt_text: (!prompt.is_empty()).then(|| prompt.to_string()),
                orient: ph.orient,
                size: ph.size,
            })
        })
        .collect();

    LayoutDefinition {
        index,
        name: layout_name,
        part,
        slots,
    }
}

/// Resolves style names to template files in a directory
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
    default_style: String,
}

impl TemplateStore {
    pub fn new(dir: &Path, default_style: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            default_style: default_style.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.templates_dir, &config.default_style)
    }

    pub fn default_style(&self) -> &str {
        &self.default_style
    }

    /// Style names available as `<dir>/<Style>.pptx`, sorted
    pub fn available_styles(&self) -> Vec<String> {
        let pattern = format!("{}/*.pptx", self.dir.to_string_lossy());
        let mut styles: Vec<String> = match glob::glob(&pattern) {
            Ok(paths) => paths
                .flatten()
                .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().to_string()))
                .filter(|s| !s.starts_with("~$"))
                .collect(),
            Err(e) => {
                warn!("Invalid template pattern {}: {}", pattern, e);
                Vec::new()
            }
        };
        styles.sort();
        styles
    }

    /// Resolve a style name; unknown names fall back to the default style
    pub fn resolve(&self, style: &str) -> TemplateSource {
        let styles = self.available_styles();
        let find = |wanted: &str| {
            styles
                .iter()
                .find(|s| s.eq_ignore_ascii_case(wanted.trim()))
                .map(|s| TemplateSource::File(self.dir.join(format!("{}.pptx", s))))
        };

        if let Some(source) = find(style) {
            return source;
        }
        if let Some(source) = find(&self.default_style) {
            info!(
                "Unknown template style '{}', using default '{}'",
                style, self.default_style
            );
            return source;
        }
        info!(
            "No template file for '{}' or '{}', using the built-in template",
            style, self.default_style
        );
        TemplateSource::Builtin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(index: usize, name: &str) -> LayoutDefinition {
        LayoutDefinition {
            index,
            name: name.to_string(),
            part: format!("ppt/slideLayouts/slideLayout{}.xml", index + 1),
            slots: Vec::new(),
        }
    }

    #[test]
    fn classifies_by_type_then_name() {
        assert_eq!(classify_slot(Some("ctrTitle"), 0, "Title 1", "Title Slide"), RoleHint::Title);
        assert_eq!(classify_slot(Some("subTitle"), 1, "Subtitle 2", "Title Slide"), RoleHint::Subtitle);
        assert_eq!(classify_slot(Some("pic"), 13, "Picture 3", "Picture"), RoleHint::Picture);
        assert_eq!(classify_slot(Some("sldNum"), 12, "Slide Number", "Any"), RoleHint::Other);
        assert_eq!(classify_slot(Some("hologram"), 4, "Mystery", "Any"), RoleHint::Unknown);
        assert_eq!(classify_slot(None, 1, "Text Placeholder 2", "Cover"), RoleHint::Subtitle);
        assert_eq!(classify_slot(Some("body"), 1, "Text Placeholder 2", "Agenda"), RoleHint::Body);
        assert_eq!(classify_slot(Some("body"), 2, "Image Placeholder", "Agenda"), RoleHint::Picture);
    }

    #[test]
    fn title_rules_apply_in_order() {
        let layouts = vec![layout(0, "Blank"), layout(1, "Cover"), layout(2, "Title Slide")];
        let (rule, found) = first_match(TITLE_LAYOUT_RULES, layouts.iter()).unwrap();
        assert_eq!(rule, "title slide");
        assert_eq!(found.index, 2);

        let layouts = vec![layout(0, "Blank"), layout(1, "Opening")];
        assert_eq!(first_match(TITLE_LAYOUT_RULES, layouts.iter()).unwrap().1.index, 1);

        let layouts = vec![layout(0, "Blank"), layout(1, "Odd")];
        assert!(first_match(TITLE_LAYOUT_RULES, layouts.iter()).is_none());
    }

    fn document(names: &[&str]) -> TemplateDocument {
        TemplateDocument {
            package: builtin::default_template_package().unwrap(),
            layouts: names.iter().enumerate().map(|(i, n)| layout(i, n)).collect(),
        }
    }

    #[test]
    fn unconventional_names_use_first_layouts() {
        let doc = document(&["Odd", "Blank", "Strange"]);
        let title = doc.resolve_title_layout().unwrap();
        assert_eq!(title.index, 0);
        let content = doc.resolve_content_layout(title).unwrap();
        assert_eq!(content.index, 1);
    }

    #[test]
    fn resolved_layouts_differ_when_two_exist() {
        let cases: [&[&str]; 4] = [
            &["Odd", "Blank"],
            &["Title and Content", "Title Slide"],
            &["Title Only", "Blank"],
            &["Blank", "Cover", "Two Content"],
        ];
        for names in cases {
            let doc = document(names);
            let title = doc.resolve_title_layout().unwrap();
            let content = doc.resolve_content_layout(title).unwrap();
            assert_ne!(title.index, content.index, "layouts {:?}", names);
        }
    }

    #[test]
    fn single_layout_serves_both_roles() {
        let doc = document(&["Odd"]);
        let title = doc.resolve_title_layout().unwrap();
        let content = doc.resolve_content_layout(title).unwrap();
        assert_eq!(title.index, 0);
        assert_eq!(content.index, 0);
    }

    #[test]
    fn no_layouts_is_an_empty_template() {
        let doc = document(&[]);
        assert!(matches!(doc.resolve_title_layout(), Err(DeckError::EmptyTemplate(_))));
        assert!(matches!(
            doc.resolve_content_layout(&layout(0, "Odd")),
            Err(DeckError::EmptyTemplate(_))
        ));
    }

    #[test]
    fn content_rules_prefer_exact_names() {
        let layouts = vec![layout(0, "Content with Caption"), layout(1, "Text")];
        let (rule, found) = first_match(CONTENT_LAYOUT_RULES, layouts.iter()).unwrap();
        assert_eq!(rule, "named content");
        assert_eq!(found.index, 1);
    }

    #[test]
    fn parses_layout_placeholders() {
        let xml = br#"<p:sldLayout xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld name="Vertical Text"><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/></a:xfrm></p:grpSpPr><p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp><p:sp><p:nvSpPr><p:cNvPr id="3" name="Vertical Text Placeholder 2"/><p:cNvSpPr/><p:nvPr><p:ph type="body" orient="vert" idx="1"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="100" y="200"/><a:ext cx="300" cy="400"/></a:xfrm></p:spPr><p:txBody><a:bodyPr vert="eaVert"/><a:lstStyle/><a:p><a:r><a:t>Click to edit</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sldLayout>"#;

        let parsed = parse_drawing_part(xml).unwrap();
        assert_eq!(parsed.name, "Vertical Text");
        let master = vec![RawShape {
            name: "Title Placeholder 1".to_string(),
            ph: Some(RawPlaceholder {
                ph_type: Some("title".to_string()),
                ..Default::default()
            }),
            geometry: Some(Geometry::new(1, 2, 3, 4)),
            ..Default::default()
        }];
        let layout = build_layout(3, "ppt/slideLayouts/slideLayout4.xml".to_string(), parsed, &master);

        assert_eq!(layout.slots.len(), 2);
        let title = layout.slot(RoleHint::Title).unwrap();
        assert_eq!(title.geometry, Some(Geometry::new(1, 2, 3, 4)));
        let body = layout.slot(RoleHint::Body).unwrap();
        assert_eq!(body.slot_index, 1);
        assert_eq!(body.geometry, Some(Geometry::new(100, 200, 300, 400)));
        assert_eq!(body.text_direction, TextDirection::Vertical);
        assert_eq!(body.prompt_text.as_deref(), Some("Click to edit"));
    }
}
