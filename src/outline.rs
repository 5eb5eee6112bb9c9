// ABOUTME: Outline generation module for the slidesmith application
// ABOUTME: Requests structured slide content and validates it into an ordered outline

use crate::errors::{DeckError, Result};
use crate::llm::{OutlineRequest, TextGenerator};
use log::{debug, info, warn};
use serde_json::Value;
use std::collections::HashSet;

/// Bullets kept per slide; extra ones are dropped
pub const MAX_BULLETS: usize = 5;

/// Fewer bullets than this is accepted but logged
pub const MIN_BULLETS: usize = 3;

/// One generated slide before rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideSpec {
    pub title: String,
    pub bullets: Vec<String>,
}

/// Ordered slide records with unique titles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outline {
    slides: Vec<SlideSpec>,
}

impl Outline {
    /// Build an outline from records, rejecting empty input and repeated titles
    pub fn new(slides: Vec<SlideSpec>) -> Result<Self> {
        if slides.is_empty() {
            return Err(DeckError::InsufficientContent {
                requested: 1,
                available: 0,
            });
        }
        let mut seen = HashSet::new();
        for slide in &slides {
            if !seen.insert(slide.title.as_str()) {
                return Err(DeckError::Validation(format!(
                    "Duplicate slide title: {}",
                    slide.title
                )));
            }
        }
        Ok(Self { slides })
    }

    pub fn slides(&self) -> &[SlideSpec] {
        &self.slides
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
}

/// System instructions sent with every outline request
pub fn outline_instructions(count: usize) -> String {
    let structure = if count >= 3 {
        "\n- The first slide is an agenda for the talk and the last slide is a conclusion"
    } else {
        ""
    };

    format!(
        r#"Generate a PowerPoint presentation with exactly {count} slides.
Return your response as a valid JSON object with a 'slides' array. Each slide must include:
1. title (string): a concise, engaging title, unique within the presentation
2. content (array): a list of 3-5 bullet points

Format example:
{{
    "slides": [
        {{
            "title": "Introduction",
            "content": [
                "Key point 1 - a short explanation",
                "Key point 2",
                "Key point 3"
            ]
        }}
    ]
}}

Remember:
- Keep titles concise and clear
- Each bullet point should be a complete thought
- A bullet may add a brief explanation after " - "
- Ensure the content flows logically{structure}
- Return ONLY the JSON object, no other text"#
    )
}

/// Generate an outline of exactly `count` slides for a prompt
pub fn generate_outline(
    generator: &dyn TextGenerator,
    prompt: &str,
    count: usize,
) -> Result<Outline> {
    if count == 0 {
        return Err(DeckError::Validation(
            "Slide count must be at least 1".to_string(),
        ));
    }
    if prompt.trim().is_empty() {
        return Err(DeckError::Validation("Prompt must not be empty".to_string()));
    }

    info!("Requesting outline of {} slides", count);
    let request = OutlineRequest {
        system_instructions: outline_instructions(count),
        user_prompt: prompt.to_string(),
        count,
    };

    let payload = generator.generate_outline(&request)?;
    debug!("Outline payload: {}", payload);
    parse_outline(&payload, count)
}

/// Validate a structured payload into an outline.
///
/// Slides are taken in order; a title already seen is skipped, as is a slide
/// with an empty title or no non-empty bullets. Collection stops once `count`
/// slides are gathered, and the count is only checked after every candidate
/// has been examined.
pub fn parse_outline(payload: &str, count: usize) -> Result<Outline> {
    let value: Value = serde_json::from_str(payload.trim())
        .map_err(|e| DeckError::ContentFormat(format!("Response is not JSON: {}", e)))?;

    let entries = value
        .as_object()
        .and_then(|obj| obj.get("slides"))
        .and_then(Value::as_array)
        .ok_or_else(|| {
            DeckError::ContentFormat("Expected an object with a 'slides' array".to_string())
        })?;

    let mut seen = HashSet::new();
    let mut slides = Vec::with_capacity(count);

    for (position, entry) in entries.iter().enumerate() {
        if slides.len() == count {
            break;
        }

        let spec = parse_entry(entry, position)?;
        if spec.title.is_empty() || spec.bullets.is_empty() {
            warn!("Skipping empty slide at position {}", position);
            continue;
        }
        if !seen.insert(spec.title.clone()) {
            warn!("Skipping duplicate slide title: {}", spec.title);
            continue;
        }
        if spec.bullets.len() < MIN_BULLETS {
            warn!(
                "Slide '{}' has only {} bullets",
                spec.title,
                spec.bullets.len()
            );
        }
        slides.push(spec);
    }

    if slides.len() < count {
        return Err(DeckError::InsufficientContent {
            requested: count,
            available: slides.len(),
        });
    }

    Outline::new(slides)
}

fn parse_entry(entry: &Value, position: usize) -> Result<SlideSpec> {
    let obj = entry.as_object().ok_or_else(|| {
        DeckError::ContentFormat(format!("Slide {} is not an object", position))
    })?;

    let title = obj.get("title").and_then(Value::as_str).ok_or_else(|| {
        DeckError::ContentFormat(format!("Slide {} has no string 'title'", position))
    })?;

    let content = obj.get("content").and_then(Value::as_array).ok_or_else(|| {
        DeckError::ContentFormat(format!("Slide {} has no 'content' array", position))
    })?;

    let mut bullets = Vec::with_capacity(content.len().min(MAX_BULLETS));
    for item in content {
        let text = item.as_str().ok_or_else(|| {
            DeckError::ContentFormat(format!(
                "Slide {} content must be an array of strings",
                position
            ))
        })?;
        let text = text.trim();
        if !text.is_empty() && bullets.len() < MAX_BULLETS {
            bullets.push(text.to_string());
        }
    }

    Ok(SlideSpec {
        title: title.trim().to_string(),
        bullets,
    })
}
