use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::Document;

/// A completion suggestion shown in the line editor's dropdown
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Suggestion {
    /// The actual value to insert
    pub text: String,

    /// Human-readable description shown next to the value
    #[serde(default)]
    pub description: String,
}

impl Suggestion {
    pub fn new(text: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            description: description.into(),
        }
    }

    /// A suggestion that only carries a note for the user, e.g.
    /// "no instances found". Its text is blank.
    pub fn message(description: impl Into<String>) -> Self {
        Self::new(" ", description)
    }

    /// Blank text with a non-blank description
    pub fn is_message(&self) -> bool {
        self.text.trim().is_empty() && !self.description.trim().is_empty()
    }

    /// Neither text nor description carries anything
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty() && self.description.trim().is_empty()
    }
}

/// Keep suggestions whose text starts with `filter`, ignoring case.
///
/// Message suggestions always pass and get a single-space text so line
/// editors that drop empty entries still render them. Blank entries are
/// dropped.
pub fn filter_suggestions(suggestions: &[Suggestion], filter: &str) -> Vec<Suggestion> {
    let filter = filter.to_lowercase();
    suggestions
        .iter()
        .filter_map(|s| {
            if s.is_message() {
                Some(Suggestion::message(s.description.clone()))
            } else if !s.is_blank() && s.text.to_lowercase().starts_with(&filter) {
                Some(s.clone())
            } else {
                None
            }
        })
        .collect()
}

/// Drop suggestions whose text already occurs anywhere in the typed line.
///
/// Matching is by substring, so an id contained in an unrelated token is
/// dropped too. Message suggestions are always kept.
pub fn drop_already_typed(suggestions: Vec<Suggestion>, line: &str) -> Vec<Suggestion> {
    suggestions
        .into_iter()
        .filter(|s| s.is_message() || !line.contains(s.text.as_str()))
        .collect()
}

/// Anything that turns the current document into suggestions.
///
/// Completers never fail: problems degrade to an empty or stale list.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, document: &Document) -> Vec<Suggestion>;
}
