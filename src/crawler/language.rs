//! Language filtering of extracted text

use std::sync::Arc;

/// Detects the language of a text
pub trait LanguageDetector: Send + Sync {
    /// Returns an ISO 639-3 code, or `None` when the language is unknown
    fn detect(&self, text: &str) -> Option<String>;
}

/// Trigram-based detection backed by `whatlang`
#[derive(Debug, Default, Clone, Copy)]
pub struct WhatlangDetector;

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Option<String> {
        whatlang::detect_lang(text).map(|lang| lang.code().to_string())
    }
}

/// Accepts text written in one target language
#[derive(Clone)]
pub struct LanguageFilter {
    target: String,
    detector: Arc<dyn LanguageDetector>,
}

impl LanguageFilter {
    pub fn new(target: impl Into<String>, detector: Arc<dyn LanguageDetector>) -> Self {
        Self {
            target: target.into(),
            detector,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns true if the detected language equals the target
    ///
    /// Text whose language cannot be detected is rejected.
    pub fn accepts(&self, text: &str) -> bool {
        match self.detector.detect(text) {
            Some(code) if code == self.target => true,
            Some(code) => {
                tracing::debug!("Detected language {} (want {})", code, self.target);
                false
            }
            None => {
                tracing::debug!("Language not detected (want {})", self.target);
                false
            }
        }
    }
}

impl std::fmt::Debug for LanguageFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageFilter")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}
