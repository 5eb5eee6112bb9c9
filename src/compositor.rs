// ABOUTME: Image compositing module for the slidesmith application
// ABOUTME: Fetches generated illustrations, places them on slides and keeps text clear of them

use crate::errors::{DeckError, Result};
use crate::llm::{ImageGenerator, ImageResource};
use crate::resources::ResourceFile;
use crate::slide::{inches, RenderedSlide};
use crate::template::{Geometry, RoleHint};
use image::{GenericImageView, ImageFormat, ImageOutputFormat};
use log::{debug, info, warn};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const IMAGE_WIDTH_IN: f64 = 4.0;
pub const IMAGE_TOP_IN: f64 = 1.5;
pub const IMAGE_RIGHT_MARGIN_IN: f64 = 0.5;
pub const BOTTOM_MARGIN_IN: f64 = 0.5;
/// Clearance kept between text and the image's left edge
pub const TEXT_CLEARANCE_IN: f64 = 0.2;
/// Text shapes are never narrowed below this
pub const MIN_TEXT_WIDTH_IN: f64 = 1.0;

const MIN_REFIT_FONT_PT: u32 = 12;

/// An image decoded and written to scratch storage
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub path: PathBuf,
    pub extension: &'static str,
    pub width_px: u32,
    pub height_px: u32,
}

/// Requests images and composites them onto slides
pub struct ImageCompositor<'a> {
    generator: &'a dyn ImageGenerator,
    scratch_dir: &'a Path,
    download_timeout: Duration,
}

impl<'a> ImageCompositor<'a> {
    pub fn new(generator: &'a dyn ImageGenerator, scratch_dir: &'a Path) -> Self {
        Self {
            generator,
            scratch_dir,
            download_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    /// Attach one generated image to `slide`. Any failure leaves the slide
    /// text-only and returns false.
    pub fn attach_image(&self, slide: &mut RenderedSlide, prompt: &str) -> bool {
        match self.try_attach(slide, prompt) {
            Ok(geometry) => {
                info!(
                    "Attached image at {},{} ({}x{} EMU)",
                    geometry.left, geometry.top, geometry.width, geometry.height
                );
                true
            }
            Err(e) => {
                warn!("Continuing without image: {}", e);
                false
            }
        }
    }

    fn try_attach(&self, slide: &mut RenderedSlide, prompt: &str) -> Result<Geometry> {
        let bytes = match self.generator.generate_image(prompt)? {
            ImageResource::Remote(url) => ResourceFile::new(&url)
                .with_timeout(self.download_timeout)
                .bytes()
                .map_err(|e| DeckError::ImageAttachment(format!("download failed: {}", e)))?,
            ImageResource::Inline(bytes) => bytes,
        };
        let stored = store_image(&bytes, self.scratch_dir)?;

        let picture_slot = slide
            .free_placeholder(RoleHint::Picture)
            .and_then(|i| slide.shapes()[i].geometry.map(|g| (i, g)));

        let (index, geometry) = match picture_slot {
            Some((index, slot)) => {
                let geometry = clamp_to_bottom(slide, fit_within(slot, &stored));
                let index = slide
                    .fill_picture_placeholder(index, stored.path.clone(), stored.extension, geometry)
                    .ok_or_else(|| DeckError::ImageAttachment("picture slot vanished".to_string()))?;
                (index, geometry)
            }
            None => {
                let geometry = clamp_to_bottom(slide, default_placement(slide, &stored));
                let index = slide.add_picture(stored.path.clone(), stored.extension, geometry);
                (index, geometry)
            }
        };

        clear_image_overlap(slide, geometry, index);
        Ok(geometry)
    }
}

/// Decode `bytes`, re-encoding anything but PNG and JPEG as PNG, and
/// write the result under `dir` with a unique name
pub fn store_image(bytes: &[u8], dir: &Path) -> Result<StoredImage> {
    let format = image::guess_format(bytes)
        .map_err(|e| DeckError::ImageAttachment(format!("unrecognised image: {}", e)))?;
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| DeckError::ImageAttachment(format!("undecodable image: {}", e)))?;
    let (width_px, height_px) = decoded.dimensions();
    if width_px == 0 || height_px == 0 {
        return Err(DeckError::ImageAttachment("image has no pixels".to_string()));
    }

    let (extension, data) = match format {
        ImageFormat::Png => ("png", bytes.to_vec()),
        ImageFormat::Jpeg => ("jpeg", bytes.to_vec()),
        other => {
            debug!("Re-encoding {:?} image as PNG", other);
            let mut cursor = Cursor::new(Vec::new());
            decoded
                .write_to(&mut cursor, ImageOutputFormat::Png)
                .map_err(|e| DeckError::ImageAttachment(format!("re-encoding failed: {}", e)))?;
            ("png", cursor.into_inner())
        }
    };

    let path = dir.join(format!("{}.{}", uuid::Uuid::new_v4(), extension));
    fs::write(&path, data)?;

    Ok(StoredImage {
        path,
        extension,
        width_px,
        height_px,
    })
}

/// Fixed-width region against the right edge, below the top margin
fn default_placement(slide: &RenderedSlide, image: &StoredImage) -> Geometry {
    let width = inches(IMAGE_WIDTH_IN);
    let height = scale(width, image.height_px, image.width_px);
    let left = slide.size().width - inches(IMAGE_RIGHT_MARGIN_IN) - width;
    Geometry::new(left, inches(IMAGE_TOP_IN), width, height)
}

/// Largest box with the image's aspect ratio that fits inside `slot`, centred
fn fit_within(slot: Geometry, image: &StoredImage) -> Geometry {
    let by_width = scale(slot.width, image.height_px, image.width_px);
    let (width, height) = if by_width <= slot.height {
        (slot.width, by_width)
    } else {
        (scale(slot.height, image.width_px, image.height_px), slot.height)
    };
    Geometry::new(
        slot.left + (slot.width - width) / 2,
        slot.top + (slot.height - height) / 2,
        width,
        height,
    )
}

fn scale(value: i64, numerator: u32, denominator: u32) -> i64 {
    (value as i128 * numerator as i128 / denominator.max(1) as i128) as i64
}

/// Shrink the image so it stops at the bottom margin, keeping its right edge
pub fn clamp_to_bottom(slide: &RenderedSlide, geometry: Geometry) -> Geometry {
    let limit = slide.size().height - inches(BOTTOM_MARGIN_IN);
    if geometry.bottom() <= limit || geometry.height <= 0 {
        return geometry;
    }

    let height = (limit - geometry.top).max(1);
    let width = (geometry.width as i128 * height as i128 / geometry.height as i128) as i64;
    debug!("Clamping image height from {} to {}", geometry.height, height);
    Geometry::new(geometry.right() - width, geometry.top, width, height)
}

/// Narrow every text shape and decoration reaching past the image's left edge.
///
/// Shapes keep at least [`MIN_TEXT_WIDTH_IN`] of width; one that would still
/// cross the edge at that width is moved left, but never onto the text
/// beside it. Whatever overlap remains is absorbed by shrinking the font.
pub fn clear_image_overlap(slide: &mut RenderedSlide, image: Geometry, image_index: usize) -> usize {
    let limit = image.left - inches(TEXT_CLEARANCE_IN);
    let floor = inches(MIN_TEXT_WIDTH_IN);
    let mut adjusted = 0;

    for index in 0..slide.shapes().len() {
        if index == image_index {
            continue;
        }
        let neighbour_right = text_edge_left_of(slide, index, image_index);
        let Some(shape) = slide.shape_mut(index) else {
            continue;
        };
        let competes = shape.is_text_bearing() || (shape.role == RoleHint::Other && !shape.is_placeholder());
        let Some(current) = shape.geometry else {
            continue;
        };
        if !competes || shape.is_picture() || current.right() <= limit {
            continue;
        }

        let width = (limit - current.left).max(floor);
        let left = if current.left + width > limit {
            (limit - width).max(neighbour_right).max(0)
        } else {
            current.left
        };
        let narrowed = Geometry::new(left, current.top, width, current.height);
        shape.set_geometry(narrowed);
        if let Some(text) = shape.text.as_mut() {
            text.shrink_to_fit(narrowed, MIN_REFIT_FONT_PT);
        }
        adjusted += 1;
    }

    debug!("Narrowed {} shapes beside the image", adjusted);
    adjusted
}

/// Right edge of the nearest text shape entirely left of shape `index`
/// and sharing some of its vertical span
fn text_edge_left_of(slide: &RenderedSlide, index: usize, image_index: usize) -> i64 {
    let Some(target) = slide.shapes().get(index).and_then(|s| s.geometry) else {
        return 0;
    };
    slide
        .shapes()
        .iter()
        .enumerate()
        .filter(|(i, s)| *i != index && *i != image_index && s.is_text_bearing())
        .filter_map(|(_, s)| s.geometry)
        .filter(|g| g.right() <= target.left && g.top < target.bottom() && target.top < g.bottom())
        .map(|g| g.right())
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(width_px: u32, height_px: u32) -> StoredImage {
        StoredImage {
            path: PathBuf::from("x.png"),
            extension: "png",
            width_px,
            height_px,
        }
    }

    #[test]
    fn fit_within_preserves_aspect_ratio() {
        let slot = Geometry::new(0, 0, 4000, 1000);
        let fitted = fit_within(slot, &stored(200, 100));
        assert_eq!(fitted, Geometry::new(1000, 0, 2000, 1000));

        let fitted = fit_within(slot, &stored(400, 100));
        assert_eq!(fitted, Geometry::new(0, 0, 4000, 1000));
    }

    #[test]
    fn stores_png_and_reencodes_other_formats() {
        let dir = tempfile::tempdir().unwrap();
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(8, 4, image::Rgb([10, 20, 30])));

        let mut png = Cursor::new(Vec::new());
        img.write_to(&mut png, ImageOutputFormat::Png).unwrap();
        let saved = store_image(png.get_ref(), dir.path()).unwrap();
        assert_eq!(saved.extension, "png");
        assert_eq!((saved.width_px, saved.height_px), (8, 4));
        assert!(saved.path.exists());

        let mut bmp = Cursor::new(Vec::new());
        img.write_to(&mut bmp, ImageOutputFormat::Bmp).unwrap();
        let saved = store_image(bmp.get_ref(), dir.path()).unwrap();
        assert_eq!(saved.extension, "png");
        let reread = fs::read(&saved.path).unwrap();
        assert_eq!(image::guess_format(&reread).unwrap(), ImageFormat::Png);

        assert!(store_image(b"not an image", dir.path()).is_err());
    }
}
