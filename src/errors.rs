// ABOUTME: Error types for the slidesmith application
// ABOUTME: Provides structured error handling for each stage of the deck pipeline

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("Failed to read or write file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to fetch remote resource: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Template has no slide layouts: {0}")]
    EmptyTemplate(String),

    #[error("No usable content region on slide {slide_index}")]
    NoContentRegion { slide_index: usize },

    #[error("Generated outline has an unexpected format: {0}")]
    ContentFormat(String),

    #[error("Generated outline has {available} usable slides, {requested} requested")]
    InsufficientContent { requested: usize, available: usize },

    #[error("Image attachment failed: {0}")]
    ImageAttachment(String),

    #[error("Title polishing failed: {0}")]
    TitlePolish(String),

    #[error("Generation provider error: {0}")]
    Provider(String),

    #[error("PPTX package error: {0}")]
    Pptx(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Input validation error: {0}")]
    Validation(String),

    #[error("HTTP server error: {0}")]
    Server(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}

impl DeckError {
    /// Whether this error ends the generation request.
    ///
    /// Image and title-polish failures degrade the output instead and never
    /// leave the component that produced them.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DeckError::ImageAttachment(_) | DeckError::TitlePolish(_))
    }
}

impl From<zip::result::ZipError> for DeckError {
    fn from(err: zip::result::ZipError) -> Self {
        DeckError::Pptx(format!("ZIP operation failed: {}", err))
    }
}

impl From<quick_xml::Error> for DeckError {
    fn from(err: quick_xml::Error) -> Self {
        DeckError::Xml(err.to_string())
    }
}

impl From<serde_json::Error> for DeckError {
    fn from(err: serde_json::Error) -> Self {
        DeckError::ContentFormat(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DeckError>;
