/// The input line as handed over by the line editor on each redraw.
///
/// The cursor is assumed to sit at the end of the line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    /// Original input string
    text: String,

    /// Whitespace-split tokens
    tokens: Vec<String>,
}

impl Document {
    /// Create a Document with simple whitespace tokenization
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let tokens = text.split_whitespace().map(String::from).collect();
        Self { text, tokens }
    }

    /// Get the original input string
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Get the last token, whether or not it is still being typed
    pub fn last_token(&self) -> Option<&str> {
        self.tokens.last().map(|s| s.as_str())
    }

    /// True when the last word has been accepted with a space
    pub fn ends_with_space(&self) -> bool {
        self.text.ends_with(char::is_whitespace)
    }

    /// Get the partial word being completed
    pub fn word_before_cursor(&self) -> &str {
        if self.ends_with_space() {
            "" // Completing a new word
        } else {
            self.last_token().unwrap_or("")
        }
    }

    /// Split into the accepted tokens and the in-progress filter word.
    ///
    /// With a trailing space every token is accepted and the filter is empty.
    pub fn split_filter(&self) -> (&[String], &str) {
        match self.tokens.split_last() {
            Some((last, rest)) if !self.ends_with_space() => (rest, last.as_str()),
            _ => (&self.tokens, ""),
        }
    }
}

impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_space_accepts_all_tokens() {
        let doc = Document::new("instance show ");
        assert!(doc.ends_with_space());
        assert_eq!(doc.word_before_cursor(), "");

        let (accepted, filter) = doc.split_filter();
        assert_eq!(accepted, ["instance", "show"]);
        assert_eq!(filter, "");
    }

    #[test]
    fn test_in_progress_word_becomes_filter() {
        let doc = Document::new("instance sh");
        assert_eq!(doc.word_before_cursor(), "sh");

        let (accepted, filter) = doc.split_filter();
        assert_eq!(accepted, ["instance"]);
        assert_eq!(filter, "sh");
    }

    #[test]
    fn test_empty_line() {
        let doc = Document::new("");
        assert!(!doc.ends_with_space());
        assert!(doc.tokens().is_empty());
        let (accepted, filter) = doc.split_filter();
        assert!(accepted.is_empty());
        assert_eq!(filter, "");
    }

    #[test]
    fn test_tabs_count_as_whitespace() {
        let doc = Document::new("a\tb\t");
        assert_eq!(doc.tokens(), ["a", "b"]);
        assert!(doc.ends_with_space());
    }
}
