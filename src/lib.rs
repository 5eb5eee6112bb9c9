// ABOUTME: Library module for the slidesmith program.
// ABOUTME: Turns prompts into outlines and renders them into PPTX decks against third-party templates.

// Reexport modules
pub mod assembler;
pub mod builtin;
pub mod composer;
pub mod compositor;
pub mod config;
pub mod errors;
pub mod llm;
pub mod outline;
pub mod pptx;
pub mod resources;
pub mod server;
pub mod slide;
pub mod template;
pub mod utils;

// Reexport common types and functions
pub use assembler::{AssembledDeck, Assembler, DeckRequest};
pub use config::Config;
pub use errors::{DeckError, Result};
pub use llm::{ImageGenerator, ImageResource, OfflineProvider, OpenAiClient, OutlineRequest, TextGenerator};
pub use outline::{generate_outline, parse_outline, Outline, SlideSpec};
pub use pptx::PptxPackage;
pub use server::DeckServer;
pub use slide::RenderedSlide;
pub use template::{RoleHint, TemplateDocument, TemplateSource, TemplateStore};
