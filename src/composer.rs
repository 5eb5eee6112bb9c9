// ABOUTME: Slide composition module for the slidesmith application
// ABOUTME: Places titles, two-column bullets and decorations onto slides cloned from template layouts

use crate::errors::{DeckError, Result};
use crate::slide::{inches, Align, Bullet, Paragraph, RenderedSlide, TextBody, TextRun};
use crate::template::{Geometry, RoleHint, TemplateDocument};
use log::{debug, info};

/// Title sizes for short, medium and long titles
pub const TITLE_SIZE_TIERS: [u32; 3] = [44, 36, 28];
const SHORT_TITLE_CHARS: usize = 30;
const MEDIUM_TITLE_CHARS: usize = 50;

pub const SUBTITLE_FONT_PT: u32 = 20;
pub const CONTENT_TITLE_FONT_PT: u32 = 32;
pub const MIN_CONTENT_TITLE_FONT_PT: u32 = 20;
pub const BODY_FONT_PT: u32 = 20;
pub const EXPLAINER_FONT_PT: u32 = 16;
pub const MIN_BODY_FONT_PT: u32 = 12;

/// Bullet markers, rotated by slide index
pub const BULLET_GLYPHS: [char; 4] = ['•', '▪', '➤', '◆'];

const SIDE_MARGIN_IN: f64 = 0.6;
const BOTTOM_MARGIN_IN: f64 = 0.5;
const COLUMN_GAP_IN: f64 = 0.3;
const ACCENT_BAR_WIDTH_IN: f64 = 0.12;
const DIVIDER_HEIGHT_IN: f64 = 0.03;
const DIVIDER_GAP_IN: f64 = 0.08;
const BODY_GAP_IN: f64 = 0.15;
const MIN_REGION_WIDTH_IN: f64 = 2.0;
const MIN_REGION_HEIGHT_IN: f64 = 1.0;

/// Font size tier for a title slide's title
pub fn title_font_size(title: &str) -> u32 {
    match title.chars().count() {
        n if n <= SHORT_TITLE_CHARS => TITLE_SIZE_TIERS[0],
        n if n <= MEDIUM_TITLE_CHARS => TITLE_SIZE_TIERS[1],
        _ => TITLE_SIZE_TIERS[2],
    }
}

pub fn bullet_glyph(slide_index: usize) -> char {
    BULLET_GLYPHS[slide_index % BULLET_GLYPHS.len()]
}

/// Even slides are left-justified, odd ones right-justified
pub fn column_alignment(slide_index: usize) -> Align {
    if slide_index % 2 == 0 {
        Align::Left
    } else {
        Align::Right
    }
}

/// Left column gets the larger half
pub fn split_columns(bullets: &[String]) -> (&[String], &[String]) {
    bullets.split_at((bullets.len() + 1) / 2)
}

/// Split "point - explanation" (hyphen or en dash) into its two halves
pub fn split_explainer(bullet: &str) -> (&str, Option<&str>) {
    let found = [" - ", " – "]
        .iter()
        .filter_map(|sep| bullet.find(sep).map(|at| (at, sep.len())))
        .min_by_key(|(at, _)| *at);

    if let Some((at, len)) = found {
        let point = bullet[..at].trim();
        let explainer = bullet[at + len..].trim();
        if !point.is_empty() && !explainer.is_empty() {
            return (point, Some(explainer));
        }
    }
    (bullet.trim(), None)
}

fn default_title_box(slide: &RenderedSlide) -> Geometry {
    let size = slide.size();
    let margin = inches(SIDE_MARGIN_IN);
    Geometry::new(margin, inches(0.4), size.width - 2 * margin, inches(1.1))
}

/// Compose the opening slide without adding it to the document
pub fn compose_title_slide(doc: &TemplateDocument, title: &str, presenter: &str) -> Result<RenderedSlide> {
    let layout = doc.resolve_title_layout()?;
    let mut slide = RenderedSlide::from_layout(layout, doc.slide_size());
    let size = slide.size();
    let title_pt = title_font_size(title);
    debug!("Title '{}' uses {}pt on layout '{}'", title, title_pt, layout.name);

    let title_text = TextBody::single(TextRun::new(title).sized(title_pt), None);
    let title_geometry = match slide.free_placeholder(RoleHint::Title) {
        Some(index) => {
            let shape = slide.shape_mut(index).ok_or_else(|| {
                DeckError::Validation("title placeholder vanished".to_string())
            })?;
            shape.set_text(title_text);
            shape.geometry
        }
        None => {
            let width = size.width * 4 / 5;
            let height = inches(1.5);
            let geometry = Geometry::new((size.width - width) / 2, size.height / 2 - height, width, height);
            let text = TextBody::single(TextRun::new(title).sized(title_pt), Some(Align::Center));
            slide.add_text_box("Title", RoleHint::Title, geometry, text);
            Some(geometry)
        }
    };

    let subtitle = format!("Presented by {}", presenter.trim());
    match slide.free_placeholder(RoleHint::Subtitle) {
        Some(index) => {
            if let Some(shape) = slide.shape_mut(index) {
                shape.set_text(TextBody::single(
                    TextRun::new(&subtitle).sized(SUBTITLE_FONT_PT),
                    None,
                ));
            }
        }
        None => {
            let anchor = title_geometry.unwrap_or_else(|| {
                let width = size.width * 4 / 5;
                Geometry::new((size.width - width) / 2, size.height / 2 - inches(1.5), width, inches(1.5))
            });
            let geometry = Geometry::new(anchor.left, anchor.bottom() + inches(0.2), anchor.width, inches(0.8));
            let text = TextBody::single(
                TextRun::new(&subtitle).sized(SUBTITLE_FONT_PT),
                Some(Align::Center),
            );
            slide.add_text_box("Subtitle", RoleHint::Subtitle, geometry, text);
        }
    }

    let removed = slide.remove_unused_placeholders(|_| true);
    debug!("Removed {} unused placeholders from title slide", removed);
    Ok(slide)
}

/// Compose the opening slide and append it to the document
pub fn add_title_slide(doc: &mut TemplateDocument, title: &str, presenter: &str) -> Result<usize> {
    let slide = compose_title_slide(doc, title, presenter)?;
    info!("Adding title slide");
    commit_slide(doc, slide)
}

/// Compose a content slide without adding it to the document.
///
/// Picture placeholders survive so an image can still be placed into them;
/// [`finish_slide`] removes whatever stays unused.
pub fn compose_content_slide(
    doc: &TemplateDocument,
    title: &str,
    bullets: &[String],
    slide_index: usize,
) -> Result<RenderedSlide> {
    let title_layout = doc.resolve_title_layout()?;
    let layout = doc.resolve_content_layout(title_layout)?;
    let mut slide = RenderedSlide::from_layout(layout, doc.slide_size());
    let size = slide.size();

    debug!("Slide {} uses layout '{}'", slide_index, slide.layout_name());
    let title_geometry = place_content_title(&mut slide, title);

    slide.add_decoration(
        "Accent Bar",
        Geometry::new(0, 0, inches(ACCENT_BAR_WIDTH_IN), size.height),
    );
    let divider = Geometry::new(
        title_geometry.left,
        title_geometry.bottom() + inches(DIVIDER_GAP_IN),
        title_geometry.width,
        inches(DIVIDER_HEIGHT_IN),
    );
    slide.add_decoration("Divider", divider);

    let body_index = slide
        .shapes()
        .iter()
        .position(|s| s.role == RoleHint::Body && s.is_placeholder() && !s.is_vertical() && s.geometry.is_some());
    let region = body_region(&slide, body_index, divider)
        .ok_or(DeckError::NoContentRegion { slide_index })?;

    let (left, right) = split_columns(bullets);
    let gap = inches(COLUMN_GAP_IN);
    let column_width = (region.width - gap) / 2;
    let left_geometry = Geometry::new(region.left, region.top, column_width, region.height);
    let right_geometry = Geometry::new(region.left + column_width + gap, region.top, column_width, region.height);

    let glyph = bullet_glyph(slide_index);
    let align = column_alignment(slide_index);
    debug!(
        "Slide {} '{}': {} + {} bullets, glyph {}, {:?} aligned",
        slide_index,
        title,
        left.len(),
        right.len(),
        glyph,
        align
    );

    place_column(&mut slide, body_index, left_geometry, left, glyph, align);
    if !right.is_empty() {
        let second_body = slide.shapes().iter().enumerate().position(|(i, s)| {
            Some(i) != body_index
                && s.role == RoleHint::Body
                && s.is_placeholder()
                && !s.is_vertical()
                && s.is_unused_placeholder()
        });
        place_column(&mut slide, second_body, right_geometry, right, glyph, align);
    }

    let removed = slide.remove_unused_placeholders(|s| s.role != RoleHint::Picture);
    debug!("Removed {} unused placeholders from slide {}", removed, slide_index);
    Ok(slide)
}

/// Compose a content slide and append it to the document
pub fn add_content_slide(
    doc: &mut TemplateDocument,
    title: &str,
    bullets: &[String],
    slide_index: usize,
) -> Result<usize> {
    let slide = compose_content_slide(doc, title, bullets, slide_index)?;
    commit_slide(doc, slide)
}

/// Drop every placeholder still unused, pictures included
pub fn finish_slide(slide: &mut RenderedSlide) -> usize {
    slide.remove_unused_placeholders(|_| true)
}

/// Finalise a slide and append it to the document's package
pub fn commit_slide(doc: &mut TemplateDocument, mut slide: RenderedSlide) -> Result<usize> {
    finish_slide(&mut slide);
    let part = slide.into_part()?;
    doc.package_mut().add_slide(part)
}

fn place_content_title(slide: &mut RenderedSlide, title: &str) -> Geometry {
    let fallback = default_title_box(slide);
    let mut text = TextBody::single(TextRun::new(title).sized(CONTENT_TITLE_FONT_PT), None);

    match slide.free_placeholder(RoleHint::Title) {
        Some(index) => {
            let geometry = slide
                .shape_mut(index)
                .and_then(|s| s.geometry)
                .unwrap_or(fallback);
            text.shrink_to_fit(geometry, MIN_CONTENT_TITLE_FONT_PT);
            if let Some(shape) = slide.shape_mut(index) {
                shape.set_text(text);
            }
            geometry
        }
        None => {
            text.shrink_to_fit(fallback, MIN_CONTENT_TITLE_FONT_PT);
            slide.add_text_box("Title", RoleHint::Title, fallback, text);
            fallback
        }
    }
}

/// Area below the divider that both bullet columns share.
///
/// The body placeholder's box is tried first; when it is missing or too
/// small, the margin-to-margin area under the divider is used instead.
fn body_region(slide: &RenderedSlide, body_index: Option<usize>, divider: Geometry) -> Option<Geometry> {
    let size = slide.size();
    let floor = divider.bottom() + inches(BODY_GAP_IN);
    let margin = inches(SIDE_MARGIN_IN);

    let from_placeholder = body_index
        .and_then(|i| slide.shapes().get(i))
        .and_then(|s| s.geometry)
        .map(|body| {
            let top = body.top.max(floor);
            Geometry::new(body.left, top, body.width, body.bottom() - top)
        });
    if let Some(region) = from_placeholder {
        if is_usable_region(region) {
            return Some(region);
        }
        debug!("Body placeholder region {:?} is too small, synthesising one", region);
    }

    let bottom = size.height - inches(BOTTOM_MARGIN_IN);
    let synthesised = Geometry::new(margin, floor, size.width - 2 * margin, bottom - floor);
    if is_usable_region(synthesised) {
        Some(synthesised)
    } else {
        debug!("Synthesised body region {:?} is too small", synthesised);
        None
    }
}

fn is_usable_region(region: Geometry) -> bool {
    region.width >= inches(MIN_REGION_WIDTH_IN) && region.height >= inches(MIN_REGION_HEIGHT_IN)
}

fn column_text(bullets: &[String], glyph: char, align: Align) -> TextBody {
    let mut paragraphs = Vec::with_capacity(bullets.len() * 2);
    for bullet in bullets {
        let (point, explainer) = split_explainer(bullet);

        let mut main = Paragraph::new(TextRun::new(point).sized(BODY_FONT_PT));
        main.bullet = Bullet::Char(glyph);
        main.align = Some(align);
        main.space_before_pt = Some(6);
        main.indent = Some((inches(0.3), -inches(0.3)));
        paragraphs.push(main);

        if let Some(explainer) = explainer {
            let mut detail = Paragraph::new(TextRun::new(explainer).sized(EXPLAINER_FONT_PT).italic());
            detail.level = 1;
            detail.bullet = Bullet::None;
            detail.align = Some(align);
            detail.indent = Some((inches(0.6), 0));
            paragraphs.push(detail);
        }
    }
    TextBody::new(paragraphs)
}

/// Fill a column, reusing `placeholder` when given and synthesising a text box otherwise
fn place_column(
    slide: &mut RenderedSlide,
    placeholder: Option<usize>,
    geometry: Geometry,
    bullets: &[String],
    glyph: char,
    align: Align,
) {
    let mut text = column_text(bullets, glyph, align);
    if !text.shrink_to_fit(geometry, MIN_BODY_FONT_PT) {
        debug!("Column text still overflows at {}pt", MIN_BODY_FONT_PT);
    }
    text.autofit = true;

    match placeholder.and_then(|i| slide.shape_mut(i)) {
        Some(shape) => {
            shape.set_geometry(geometry);
            shape.set_text(text);
        }
        None => {
            slide.add_text_box("Body", RoleHint::Body, geometry, text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explainer_splits_on_first_dash() {
        assert_eq!(
            split_explainer("Nodes - entities with properties - and labels"),
            ("Nodes", Some("entities with properties - and labels"))
        );
        assert_eq!(split_explainer("Edges – typed relationships"), ("Edges", Some("typed relationships")));
        assert_eq!(split_explainer("Well-known systems"), ("Well-known systems", None));
        assert_eq!(split_explainer(" - dangling"), ("- dangling", None));
    }

    #[test]
    fn glyphs_and_alignment_rotate() {
        assert_eq!(bullet_glyph(0), '•');
        assert_eq!(bullet_glyph(5), '▪');
        assert_eq!(column_alignment(2), Align::Left);
        assert_eq!(column_alignment(3), Align::Right);
    }

    #[test]
    fn single_bullet_stays_left() {
        let bullets = vec!["Only".to_string()];
        let (left, right) = split_columns(&bullets);
        assert_eq!(left.len(), 1);
        assert!(right.is_empty());
    }
}
