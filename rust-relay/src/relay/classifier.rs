//! Content classifiers deciding whether a message is worth forwarding.

use async_trait::async_trait;
use thiserror::Error;

/// A classifier could not reach a verdict, e.g. its scoring service failed.
#[derive(Debug, Error)]
#[error("classification failed: {0}")]
pub struct ClassifierError(String);

impl ClassifierError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Decides whether the text of an eligible message qualifies for forwarding.
///
/// Async so that an implementation may call out to a remote scoring service.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<bool, ClassifierError>;
}

/// Forwards every eligible message.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

#[async_trait]
impl Classifier for AcceptAll {
    async fn classify(&self, _text: &str) -> Result<bool, ClassifierError> {
        Ok(true)
    }
}

/// Accepts text containing any of the configured keywords, ignoring case.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    keywords: Vec<String>,
}

impl KeywordClassifier {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Result<bool, ClassifierError> {
        Ok(self.matches(text))
    }
}
