// ABOUTME: Rendered slide model for the slidesmith application
// ABOUTME: Owns a slide's mutable shape collection and serialises it to slide XML

use crate::errors::Result;
use crate::pptx::{MediaPart, SlidePart, SlideSize};
use crate::template::{Geometry, LayoutDefinition, PlaceholderSlot, RoleHint, TextDirection};
use quick_xml::escape::escape;
use std::fs;
use std::path::PathBuf;

pub const EMU_PER_INCH: i64 = 914_400;
pub const EMU_PER_POINT: i64 = 12_700;

/// Font size assumed for runs that leave it to the template
pub const INHERITED_FONT_PT: u32 = 18;

/// Inches to EMUs
pub fn inches(value: f64) -> i64 {
    (value * EMU_PER_INCH as f64).round() as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    fn as_attr(self) -> &'static str {
        match self {
            Align::Left => "l",
            Align::Center => "ctr",
            Align::Right => "r",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bullet {
    Inherit,
    None,
    Char(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub size_pt: Option<u32>,
    pub italic: bool,
}

impl TextRun {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            size_pt: None,
            italic: false,
        }
    }

    pub fn sized(mut self, size_pt: u32) -> Self {
        self.size_pt = Some(size_pt);
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub runs: Vec<TextRun>,
    pub level: u8,
    pub bullet: Bullet,
    pub align: Option<Align>,
    pub space_before_pt: Option<u32>,
    /// Left margin and first-line indent in EMUs
    pub indent: Option<(i64, i64)>,
}

impl Paragraph {
    pub fn new(run: TextRun) -> Self {
        Self {
            runs: vec![run],
            level: 0,
            bullet: Bullet::Inherit,
            align: None,
            space_before_pt: None,
            indent: None,
        }
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    fn size_pt(&self) -> u32 {
        self.runs
            .iter()
            .map(|r| r.size_pt.unwrap_or(INHERITED_FONT_PT))
            .max()
            .unwrap_or(INHERITED_FONT_PT)
    }
}

/// Paragraphs plus the text-frame settings written with them
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextBody {
    pub paragraphs: Vec<Paragraph>,
    pub autofit: bool,
}

impl TextBody {
    pub fn new(paragraphs: Vec<Paragraph>) -> Self {
        Self {
            paragraphs,
            autofit: false,
        }
    }

    /// A single paragraph with one run
    pub fn single(run: TextRun, align: Option<Align>) -> Self {
        let mut paragraph = Paragraph::new(run);
        paragraph.align = align;
        Self::new(vec![paragraph])
    }

    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_blank(&self) -> bool {
        self.paragraphs
            .iter()
            .all(|p| p.runs.iter().all(|r| r.text.trim().is_empty()))
    }

    /// Rough rendered height of the text inside a box of `width`.
    ///
    /// Assumes an average glyph is half the font size wide and lines are
    /// 1.2 times the font size tall.
    pub fn estimated_height(&self, width: i64) -> i64 {
        let usable = (width - 2 * TEXT_INSET).max(EMU_PER_INCH / 4);
        self.paragraphs
            .iter()
            .map(|p| {
                let size = p.size_pt() as i64;
                let margin = p.indent.map(|(left, _)| left).unwrap_or(0);
                let line_width = (usable - margin).max(EMU_PER_INCH / 4);
                let glyph = (size * EMU_PER_POINT / 2).max(1);
                let per_line = (line_width / glyph).max(1) as usize;
                let chars = p.text().chars().count().max(1);
                let lines = ((chars + per_line - 1) / per_line) as i64;
                let spacing = p.space_before_pt.unwrap_or(0) as i64 * EMU_PER_POINT;
                lines * size * EMU_PER_POINT * 6 / 5 + spacing
            })
            .sum::<i64>()
            + 2 * TEXT_INSET
    }

    /// Step explicit font sizes down one point at a time until the text is
    /// estimated to fit, never going below `min_pt`. Returns whether it fits.
    pub fn shrink_to_fit(&mut self, geometry: Geometry, min_pt: u32) -> bool {
        loop {
            if self.estimated_height(geometry.width) <= geometry.height {
                return true;
            }
            let mut shrunk = false;
            for run in self.paragraphs.iter_mut().flat_map(|p| p.runs.iter_mut()) {
                if let Some(size) = run.size_pt {
                    if size > min_pt {
                        run.size_pt = Some(size - 1);
                        shrunk = true;
                    }
                }
            }
            if !shrunk {
                return false;
            }
        }
    }
}

/// Default text-frame inset on each side, in EMUs
const TEXT_INSET: i64 = 91_440;

/// Theme colour used for accent decorations
pub const ACCENT_COLOR: &str = "accent1";

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    /// Cloned from a layout slot; inherits formatting from it
    Placeholder(PlaceholderSlot),
    TextBox,
    /// Filled rectangle in a theme colour
    Decoration { scheme_color: &'static str },
    Picture {
        rel_id: String,
        placeholder: Option<PlaceholderSlot>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub id: u32,
    pub name: String,
    pub role: RoleHint,
    pub kind: ShapeKind,
    pub geometry: Option<Geometry>,
    /// Whether `geometry` differs from what the layout would give the shape
    pub geometry_changed: bool,
    pub text: Option<TextBody>,
    /// Set once composed text is written; such text is never taken for a prompt
    pub populated: bool,
}

impl Shape {
    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, ShapeKind::Placeholder(_))
    }

    pub fn is_picture(&self) -> bool {
        matches!(self.kind, ShapeKind::Picture { .. })
    }

    pub fn is_vertical(&self) -> bool {
        match &self.kind {
            ShapeKind::Placeholder(slot) => slot.text_direction == TextDirection::Vertical,
            _ => false,
        }
    }

    /// Carries visible text
    pub fn is_text_bearing(&self) -> bool {
        self.text.as_ref().map(|t| !t.is_blank()).unwrap_or(false)
    }

    /// A placeholder holding nothing, blank composed text, or only the
    /// prompt text the template shipped with it
    pub fn is_unused_placeholder(&self) -> bool {
        match &self.kind {
            ShapeKind::Placeholder(slot) => match &self.text {
                None => true,
                Some(body) if self.populated => body.is_blank(),
                Some(body) => is_prompt_text(&body.plain_text(), slot.prompt_text.as_deref()),
            },
            _ => false,
        }
    }

    pub fn set_text(&mut self, text: TextBody) {
        self.text = Some(text);
        self.populated = true;
    }

    pub fn set_geometry(&mut self, geometry: Geometry) {
        if self.geometry != Some(geometry) {
            self.geometry = Some(geometry);
            self.geometry_changed = true;
        }
    }

    pub fn plain_text(&self) -> String {
        self.text.as_ref().map(TextBody::plain_text).unwrap_or_default()
    }
}

/// Whether text is only the "click to add" kind of prompt a template ships
pub fn is_prompt_text(text: &str, slot_prompt: Option<&str>) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return true;
    }
    if let Some(prompt) = slot_prompt {
        if prompt.trim() == text {
            return true;
        }
    }
    let lower = text.to_lowercase();
    ["click to ", "click icon to ", "tap to ", "double-click to ", "insert text", "add text"]
        .iter()
        .any(|p| lower.starts_with(p))
}

/// An image persisted to scratch storage and referenced from a slide
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideImage {
    pub rel_id: String,
    pub path: PathBuf,
    pub extension: String,
}

/// A slide instantiated from a layout, owned by whoever is composing it.
///
/// Shapes live in an owned `Vec`; nothing else aliases them, so deleting
/// a placeholder is just removing it from the collection.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSlide {
    layout_part: String,
    layout_name: String,
    size: SlideSize,
    shapes: Vec<Shape>,
    images: Vec<SlideImage>,
    next_id: u32,
}

impl RenderedSlide {
    /// Clone the layout's placeholders, skipping date/footer/number slots
    pub fn from_layout(layout: &LayoutDefinition, size: SlideSize) -> Self {
        let mut slide = Self {
            layout_part: layout.part.clone(),
            layout_name: layout.name.clone(),
            size,
            shapes: Vec::new(),
            images: Vec::new(),
            next_id: 2,
        };

        for slot in layout.slots.iter().filter(|s| s.role != RoleHint::Other) {
            let id = slide.allocate_id();
            slide.shapes.push(Shape {
                id,
                name: if slot.name.is_empty() {
                    format!("Placeholder {}", id - 1)
                } else {
                    slot.name.clone()
                },
                role: slot.role,
                kind: ShapeKind::Placeholder(slot.clone()),
                geometry: slot.geometry,
                geometry_changed: false,
                text: None,
                populated: false,
            });
        }

        slide
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn size(&self) -> SlideSize {
        self.size
    }

    pub fn layout_name(&self) -> &str {
        &self.layout_name
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn shape_mut(&mut self, index: usize) -> Option<&mut Shape> {
        self.shapes.get_mut(index)
    }

    /// Index of the first still-unused placeholder with `role`
    pub fn free_placeholder(&self, role: RoleHint) -> Option<usize> {
        self.shapes
            .iter()
            .position(|s| s.role == role && s.is_placeholder() && s.is_unused_placeholder())
    }

    /// Index of the first shape playing `role`, placeholder or not
    pub fn find_role(&self, role: RoleHint) -> Option<usize> {
        self.shapes.iter().position(|s| s.role == role)
    }

    pub fn add_text_box(&mut self, name: &str, role: RoleHint, geometry: Geometry, text: TextBody) -> usize {
        let id = self.allocate_id();
        self.shapes.push(Shape {
            id,
            name: format!("{} {}", name, id - 1),
            role,
            kind: ShapeKind::TextBox,
            geometry: Some(geometry),
            geometry_changed: true,
            text: Some(text),
            populated: true,
        });
        self.shapes.len() - 1
    }

    pub fn add_decoration(&mut self, name: &str, geometry: Geometry) -> usize {
        let id = self.allocate_id();
        self.shapes.push(Shape {
            id,
            name: format!("{} {}", name, id - 1),
            role: RoleHint::Other,
            kind: ShapeKind::Decoration {
                scheme_color: ACCENT_COLOR,
            },
            geometry: Some(geometry),
            geometry_changed: true,
            text: None,
            populated: false,
        });
        self.shapes.len() - 1
    }

    fn next_image_rel_id(&self) -> String {
        // rId1 is the layout relationship
        format!("rId{}", self.images.len() + 2)
    }

    /// Add a free-floating picture
    pub fn add_picture(&mut self, path: PathBuf, extension: &str, geometry: Geometry) -> usize {
        let rel_id = self.next_image_rel_id();
        self.images.push(SlideImage {
            rel_id: rel_id.clone(),
            path,
            extension: extension.to_string(),
        });
        let id = self.allocate_id();
        self.shapes.push(Shape {
            id,
            name: format!("Picture {}", id - 1),
            role: RoleHint::Picture,
            kind: ShapeKind::Picture {
                rel_id,
                placeholder: None,
            },
            geometry: Some(geometry),
            geometry_changed: true,
            text: None,
            populated: false,
        });
        self.shapes.len() - 1
    }

    /// Turn a picture placeholder into a picture filling `geometry`
    pub fn fill_picture_placeholder(
        &mut self,
        index: usize,
        path: PathBuf,
        extension: &str,
        geometry: Geometry,
    ) -> Option<usize> {
        let slot = match self.shapes.get(index).map(|s| &s.kind) {
            Some(ShapeKind::Placeholder(slot)) => slot.clone(),
            _ => return None,
        };
        let rel_id = self.next_image_rel_id();
        self.images.push(SlideImage {
            rel_id: rel_id.clone(),
            path,
            extension: extension.to_string(),
        });

        let shape = &mut self.shapes[index];
        shape.kind = ShapeKind::Picture {
            rel_id,
            placeholder: Some(slot),
        };
        shape.role = RoleHint::Picture;
        shape.text = None;
        shape.populated = false;
        shape.set_geometry(geometry);
        Some(index)
    }

    /// Delete placeholders that hold nothing useful, subject to `eligible`.
    /// Returns how many were removed.
    pub fn remove_unused_placeholders<F>(&mut self, eligible: F) -> usize
    where
        F: Fn(&Shape) -> bool,
    {
        let before = self.shapes.len();
        self.shapes
            .retain(|s| !(s.is_placeholder() && s.is_unused_placeholder() && eligible(s)));
        before - self.shapes.len()
    }

    /// Role and text of every text-bearing shape, in z-order
    pub fn text_content(&self) -> Vec<(RoleHint, String)> {
        self.shapes
            .iter()
            .filter(|s| s.is_text_bearing())
            .map(|s| (s.role, s.plain_text()))
            .collect()
    }

    pub fn to_xml(&self) -> String {
        let mut shapes_xml = String::new();
        for shape in &self.shapes {
            shapes_xml.push_str(&shape_xml(shape));
        }

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>{shapes}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
            shapes = shapes_xml
        )
    }

    /// Serialise into a package part, reading images back from scratch storage
    pub fn into_part(self) -> Result<SlidePart> {
        let xml = self.to_xml();
        let mut media = Vec::with_capacity(self.images.len());
        for image in self.images {
            media.push(MediaPart {
                rel_id: image.rel_id,
                extension: image.extension,
                bytes: fs::read(&image.path)?,
            });
        }
        Ok(SlidePart {
            layout_part: self.layout_part,
            xml,
            media,
        })
    }
}

fn xfrm_xml(geometry: &Geometry) -> String {
    format!(
        r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
        geometry.left,
        geometry.top,
        geometry.width.max(0),
        geometry.height.max(0)
    )
}

fn ph_xml(slot: &PlaceholderSlot) -> String {
    let mut xml = String::from("<p:ph");
    if let Some(ph_type) = &slot.ph_type {
        xml.push_str(&format!(r#" type="{}""#, escape(ph_type.as_str())));
    }
    if let Some(orient) = &slot.orient {
        xml.push_str(&format!(r#" orient="{}""#, escape(orient.as_str())));
    }
    if let Some(size) = &slot.size {
        xml.push_str(&format!(r#" sz="{}""#, escape(size.as_str())));
    }
    if slot.slot_index != 0 {
        xml.push_str(&format!(r#" idx="{}""#, slot.slot_index));
    }
    xml.push_str("/>");
    xml
}

fn shape_xml(shape: &Shape) -> String {
    let name = escape(shape.name.as_str());
    let placed = shape.geometry.filter(|_| shape.geometry_changed);

    match &shape.kind {
        ShapeKind::Placeholder(slot) => format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr>{ph}</p:nvPr></p:nvSpPr><p:spPr>{xfrm}</p:spPr>{body}</p:sp>"#,
            id = shape.id,
            name = name,
            ph = ph_xml(slot),
            xfrm = placed.as_ref().map(xfrm_xml).unwrap_or_default(),
            body = shape
                .text
                .as_ref()
                .map(|t| text_body_xml(t, false))
                .unwrap_or_default()
        ),
        ShapeKind::TextBox => format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr>{xfrm}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>{body}</p:sp>"#,
            id = shape.id,
            name = name,
            xfrm = shape.geometry.as_ref().map(xfrm_xml).unwrap_or_default(),
            body = text_body_xml(shape.text.as_ref().unwrap_or(&TextBody::default()), true)
        ),
        ShapeKind::Decoration { scheme_color } => format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr>{xfrm}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:solidFill><a:schemeClr val="{color}"/></a:solidFill><a:ln><a:noFill/></a:ln></p:spPr></p:sp>"#,
            id = shape.id,
            name = name,
            xfrm = shape.geometry.as_ref().map(xfrm_xml).unwrap_or_default(),
            color = scheme_color
        ),
        ShapeKind::Picture {
            rel_id,
            placeholder,
        } => format!(
            r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="{name}"/><p:cNvPicPr><a:picLocks noGrp="1" noChangeAspect="1"/></p:cNvPicPr><p:nvPr>{ph}</p:nvPr></p:nvPicPr><p:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr>{xfrm}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#,
            id = shape.id,
            name = name,
            ph = placeholder.as_ref().map(ph_xml).unwrap_or_default(),
            rel = escape(rel_id.as_str()),
            xfrm = shape.geometry.as_ref().map(xfrm_xml).unwrap_or_default()
        ),
    }
}

fn text_body_xml(body: &TextBody, text_box: bool) -> String {
    let autofit = if body.autofit { "<a:normAutofit/>" } else { "" };
    let body_pr = if text_box {
        format!(r#"<a:bodyPr wrap="square" rtlCol="0" anchor="t">{}</a:bodyPr>"#, autofit)
    } else if body.autofit {
        format!("<a:bodyPr>{}</a:bodyPr>", autofit)
    } else {
        "<a:bodyPr/>".to_string()
    };

    let mut xml = format!("<p:txBody>{}<a:lstStyle/>", body_pr);
    if body.paragraphs.is_empty() {
        xml.push_str(r#"<a:p><a:endParaRPr lang="en-US" dirty="0"/></a:p>"#);
    }
    for paragraph in &body.paragraphs {
        xml.push_str(&paragraph_xml(paragraph));
    }
    xml.push_str("</p:txBody>");
    xml
}

fn paragraph_xml(paragraph: &Paragraph) -> String {
    let mut attrs = String::new();
    if paragraph.level > 0 {
        attrs.push_str(&format!(r#" lvl="{}""#, paragraph.level.min(8)));
    }
    if let Some((margin, indent)) = paragraph.indent {
        attrs.push_str(&format!(r#" marL="{}" indent="{}""#, margin, indent));
    }
    if let Some(align) = paragraph.align {
        attrs.push_str(&format!(r#" algn="{}""#, align.as_attr()));
    }

    let mut children = String::new();
    if let Some(space) = paragraph.space_before_pt {
        children.push_str(&format!(
            r#"<a:spcBef><a:spcPts val="{}"/></a:spcBef>"#,
            space * 100
        ));
    }
    match paragraph.bullet {
        Bullet::Inherit => {}
        Bullet::None => children.push_str("<a:buNone/>"),
        Bullet::Char(c) => children.push_str(&format!(
            r#"<a:buFont typeface="Arial"/><a:buChar char="{}"/>"#,
            escape(c.to_string().as_str())
        )),
    }

    let mut xml = String::from("<a:p>");
    if !attrs.is_empty() || !children.is_empty() {
        xml.push_str(&format!("<a:pPr{}>{}</a:pPr>", attrs, children));
    }
    for run in &paragraph.runs {
        let mut rpr = String::from(r#"lang="en-US""#);
        if let Some(size) = run.size_pt {
            rpr.push_str(&format!(r#" sz="{}""#, size * 100));
        }
        if run.italic {
            rpr.push_str(r#" i="1""#);
        }
        xml.push_str(&format!(
            r#"<a:r><a:rPr {} dirty="0"/><a:t>{}</a:t></a:r>"#,
            rpr,
            escape(run.text.as_str())
        ));
    }
    xml.push_str("</a:p>");
    xml
}
