// ABOUTME: Document assembly module for the slidesmith application
// ABOUTME: Orchestrates outline generation, slide composition, image attachment and saving a deck

use crate::compositor::ImageCompositor;
use crate::composer;
use crate::config::Config;
use crate::errors::{DeckError, Result};
use crate::llm::{ImageGenerator, OpenAiClient, TextGenerator};
use crate::outline::{generate_outline, Outline, SlideSpec};
use crate::template::{TemplateDocument, TemplateStore};
use crate::utils::{ensure_directory_exists, sanitize_filename};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_SLIDE_COUNT: usize = 5;
pub const MAX_SLIDE_COUNT: usize = 20;

/// Everything a caller supplies for one presentation
#[derive(Debug, Clone)]
pub struct DeckRequest {
    pub prompt: String,
    pub presenter: String,
    /// Used verbatim when present; otherwise a title is polished from the prompt
    pub title: Option<String>,
    pub template_style: String,
    pub include_images: bool,
    pub slide_count: usize,
}

impl DeckRequest {
    pub fn new(prompt: &str, presenter: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            presenter: presenter.to_string(),
            title: None,
            template_style: String::new(),
            include_images: false,
            slide_count: DEFAULT_SLIDE_COUNT,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(DeckError::Validation("Prompt must not be empty".to_string()));
        }
        if self.presenter.trim().is_empty() {
            return Err(DeckError::Validation(
                "Presenter must not be empty".to_string(),
            ));
        }
        if self.slide_count == 0 || self.slide_count > MAX_SLIDE_COUNT {
            return Err(DeckError::Validation(format!(
                "Slide count must be between 1 and {}",
                MAX_SLIDE_COUNT
            )));
        }
        Ok(())
    }
}

/// A deck written to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledDeck {
    pub filename: String,
    pub path: PathBuf,
    pub title: String,
    pub slide_count: usize,
}

/// Builds decks from outlines against templates resolved by style name.
///
/// Cheap to clone; every assembly loads its own copy of the template.
#[derive(Clone)]
pub struct Assembler {
    store: TemplateStore,
    output_dir: PathBuf,
    text: Arc<dyn TextGenerator>,
    images: Arc<dyn ImageGenerator>,
    download_timeout: Duration,
}

impl Assembler {
    pub fn new(
        store: TemplateStore,
        output_dir: &Path,
        text: Arc<dyn TextGenerator>,
        images: Arc<dyn ImageGenerator>,
    ) -> Self {
        Self {
            store,
            output_dir: output_dir.to_path_buf(),
            text,
            images,
            download_timeout: Duration::from_secs(30),
        }
    }

    /// Wire the assembler to the configured provider, templates and output directory
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Arc::new(OpenAiClient::from_config(config)?);
        let mut assembler = Self::new(
            TemplateStore::from_config(config),
            &config.output_dir,
            client.clone(),
            client,
        );
        assembler.download_timeout = Duration::from_millis(config.timeout_ms);
        Ok(assembler)
    }

    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Generate an outline for the request and assemble it
    pub fn generate(&self, request: &DeckRequest) -> Result<AssembledDeck> {
        request.validate()?;
        let outline = generate_outline(self.text.as_ref(), &request.prompt, request.slide_count)?;
        self.assemble(&outline, request)
    }

    /// Render `outline` into a new deck and save it.
    ///
    /// Nothing is written unless every slide was composed.
    pub fn assemble(&self, outline: &Outline, request: &DeckRequest) -> Result<AssembledDeck> {
        let source = self.store.resolve(&request.template_style);
        info!("Assembling {} slides from {:?}", outline.len(), source);

        let mut doc = TemplateDocument::load(&source)?;
        doc.package_mut().strip_slides();

        let title = self.presentation_title(request);
        composer::add_title_slide(&mut doc, &title, &request.presenter)?;

        let scratch = if request.include_images {
            Some(tempfile::tempdir()?)
        } else {
            None
        };
        let compositor = scratch.as_ref().map(|dir| {
            ImageCompositor::new(self.images.as_ref(), dir.path())
                .with_download_timeout(self.download_timeout)
        });

        for (slide_index, spec) in outline.slides().iter().enumerate() {
            info!("Composing slide {}: {}", slide_index + 1, spec.title);
            match &compositor {
                Some(compositor) => {
                    let mut slide = composer::compose_content_slide(
                        &doc,
                        &spec.title,
                        &spec.bullets,
                        slide_index,
                    )?;
                    compositor.attach_image(&mut slide, &image_prompt(spec, &request.prompt));
                    composer::commit_slide(&mut doc, slide)?;
                }
                None => {
                    composer::add_content_slide(&mut doc, &spec.title, &spec.bullets, slide_index)?;
                }
            }
        }

        ensure_directory_exists(&self.output_dir)?;
        let filename = format!("{}.pptx", sanitize_filename(&title));
        let path = self.output_dir.join(&filename);
        let slide_count = doc.package().slide_count();
        doc.package_mut().save(&path, &title)?;

        info!("Saved '{}' with {} slides as {}", title, slide_count, filename);
        Ok(AssembledDeck {
            filename,
            path,
            title,
            slide_count,
        })
    }

    fn presentation_title(&self, request: &DeckRequest) -> String {
        if let Some(title) = request.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            return title.to_string();
        }
        match self.text.polish_title(&request.prompt) {
            Ok(title) => title,
            Err(e) => {
                warn!("Using the prompt as title: {}", e);
                request.prompt.trim().to_string()
            }
        }
    }
}

fn image_prompt(spec: &SlideSpec, topic: &str) -> String {
    format!(
        "A clean, professional illustration for a presentation slide titled '{}' in a talk about {}. \
         Simple composition, no text or lettering.",
        spec.title,
        topic.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_validation() {
        let request = DeckRequest::new("Graph databases", "Ada");
        assert!(request.validate().is_ok());

        let mut blank = request.clone();
        blank.presenter = "  ".to_string();
        assert!(matches!(blank.validate(), Err(DeckError::Validation(_))));

        let mut too_many = request;
        too_many.slide_count = MAX_SLIDE_COUNT + 1;
        assert!(too_many.validate().is_err());
    }
}
