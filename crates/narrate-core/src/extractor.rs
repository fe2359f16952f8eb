//! Story text extraction from uploaded markup documents.

use crate::error::{NarrateError, NarrateResult};
use crate::queue::CleaningProfile;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Story container on generic story pages
const REGULAR_STORY_SELECTOR: &str = ".storytext.xcontrast_txt.nocopy";
/// Story container on site-specific reader pages
const SITE_STORY_SELECTOR: &str = ".wattpad-specific-class";
/// Paragraphs counted as story text inside a container
const PARAGRAPH_SELECTOR: &str = "p.panel-reading, p.panel";

/// Leading paragraphs in a story container that are page chrome
const SKIP_LEADING: usize = 3;
/// Trailing paragraphs in a story container that are page chrome
const SKIP_TRAILING: usize = 2;

/// Pure transform from markup to plain story text
///
/// When nothing in `markup` matches the profile's structure, implementations
/// return `markup` unchanged.
pub trait TextExtractor: Send + Sync {
    /// Extract plain text from `markup` using `profile`
    fn extract(&self, markup: &str, profile: CleaningProfile) -> String;
}

/// Outcome of cleaning one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// A story container matched; paragraphs joined by newlines
    Cleaned(String),
    /// No story container matched
    NoMatch,
}

/// CSS-selector based extractor for story pages
#[derive(Debug, Clone)]
pub struct MarkupCleaner {
    regular: Selector,
    site_specific: Selector,
    paragraphs: Selector,
}

impl MarkupCleaner {
    /// Create a cleaner with the built-in profile selectors
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in selector fails to parse.
    pub fn new() -> NarrateResult<Self> {
        Ok(Self {
            regular: parse_selector(REGULAR_STORY_SELECTOR)?,
            site_specific: parse_selector(SITE_STORY_SELECTOR)?,
            paragraphs: parse_selector(PARAGRAPH_SELECTOR)?,
        })
    }

    /// Locate the profile's story container and collect its paragraphs
    #[must_use]
    pub fn clean(&self, markup: &str, profile: CleaningProfile) -> Extraction {
        let document = Html::parse_document(markup);
        let container = match profile {
            CleaningProfile::Regular => &self.regular,
            CleaningProfile::SiteSpecific => &self.site_specific,
        };

        let Some(story) = document.select(container).next() else {
            return Extraction::NoMatch;
        };

        let paragraphs: Vec<String> = story.select(&self.paragraphs).map(text_content).collect();
        let end = paragraphs.len().saturating_sub(SKIP_TRAILING);
        let kept = paragraphs.get(SKIP_LEADING..end).unwrap_or_default();

        Extraction::Cleaned(kept.join("\n"))
    }
}

impl TextExtractor for MarkupCleaner {
    fn extract(&self, markup: &str, profile: CleaningProfile) -> String {
        match self.clean(markup, profile) {
            Extraction::Cleaned(text) => text,
            Extraction::NoMatch => {
                debug!("ExtractionNoMatch: no {} story region, passing markup through", profile);
                markup.to_string()
            }
        }
    }
}

fn parse_selector(css: &str) -> NarrateResult<Selector> {
    Selector::parse(css)
        .map_err(|e| NarrateError::configuration(format!("Invalid selector '{css}': {e}")))
}

fn text_content(element: ElementRef<'_>) -> String {
    element.text().collect()
}
