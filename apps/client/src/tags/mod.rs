//! Tag Builder — turns free text into the ordered, de-duplicated field list of a custom schema.

/// Input events the builder reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagInput {
    /// A printable character typed into the buffer.
    Char(char),
    /// Enter or comma: commits the buffer.
    Delimiter,
    /// Delete-backward. Edits the buffer, or pops the last tag when the buffer is empty.
    Backspace,
    /// Input lost focus: commits a non-empty buffer.
    Blur,
}

/// Lowercases, joins whitespace runs with `_` and drops anything outside `[a-z0-9_]`.
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect()
}

/// Tokens are unique and never empty.
#[derive(Debug, Clone, Default)]
pub struct TagBuilder {
    tokens: Vec<String>,
    buffer: String,
}

impl TagBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Returns whether a token was appended. The buffer is cleared only on append.
    pub fn add(&mut self, raw: &str) -> bool {
        let token = normalize(raw);
        if token.is_empty() || self.tokens.contains(&token) {
            return false;
        }
        self.tokens.push(token);
        self.buffer.clear();
        true
    }

    pub fn remove(&mut self, token: &str) {
        if let Some(pos) = self.tokens.iter().position(|t| t == token) {
            self.tokens.remove(pos);
        }
    }

    pub fn remove_last(&mut self) {
        self.tokens.pop();
    }

    pub fn handle(&mut self, input: TagInput) {
        match input {
            TagInput::Char(c) if c == ',' || c == '\n' => self.commit_buffer(),
            TagInput::Char(c) => self.buffer.push(c),
            TagInput::Delimiter => self.commit_buffer(),
            TagInput::Backspace => {
                if self.buffer.pop().is_none() {
                    self.remove_last();
                }
            }
            TagInput::Blur => {
                if !self.buffer.trim().is_empty() {
                    self.commit_buffer();
                }
            }
        }
    }

    /// Line-oriented entry: each comma-separated segment is typed into the buffer
    /// and committed with a delimiter. Returns the segments that were rejected
    /// (empty after normalizing, or duplicates); the buffer is left empty.
    pub fn add_line(&mut self, line: &str) -> Vec<String> {
        let mut rejected = Vec::new();
        for segment in line.split([',', '\n']) {
            if segment.trim().is_empty() {
                continue;
            }
            for c in segment.chars() {
                self.handle(TagInput::Char(c));
            }
            self.handle(TagInput::Delimiter);
            if !self.buffer.is_empty() {
                rejected.push(segment.trim().to_string());
                self.buffer.clear();
            }
        }
        rejected
    }

    pub fn is_valid(&self) -> bool {
        !self.tokens.is_empty()
    }

    /// Tokens as shown to the user, underscores as spaces.
    pub fn display_tokens(&self) -> Vec<String> {
        self.tokens.iter().map(|t| t.replace('_', " ")).collect()
    }

    fn commit_buffer(&mut self) {
        let raw = self.buffer.clone();
        self.add(&raw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_and_joins() {
        assert_eq!(normalize("  Years of Experience! "), "years_of_experience");
        assert_eq!(normalize("3 years exp"), "3_years_exp");
        assert_eq!(normalize("E-mail\tAddress"), "email_address");
        // whitespace is joined before symbols are stripped
        assert_eq!(normalize("!!! ??"), "_");
    }

    #[test]
    fn test_normalize_empty_when_nothing_survives() {
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("!!!"), "");
        assert_eq!(normalize("日本"), "");
    }

    #[test]
    fn test_add_duplicate_is_noop() {
        let mut builder = TagBuilder::new();
        assert!(builder.add("Name"));
        for c in "NAME ".chars() {
            builder.handle(TagInput::Char(c));
        }
        assert!(!builder.add("NAME "));
        assert_eq!(builder.tokens(), ["name"]);
        // buffer is kept when nothing was added
        assert_eq!(builder.buffer(), "NAME ");
    }

    #[test]
    fn test_add_empty_is_noop() {
        let mut builder = TagBuilder::new();
        assert!(!builder.add("@@@"));
        assert!(builder.tokens().is_empty());
        assert!(!builder.is_valid());
    }

    #[test]
    fn test_remove_and_remove_last() {
        let mut builder = TagBuilder::new();
        builder.remove_last();
        assert!(builder.tokens().is_empty());

        builder.add("name");
        builder.add("email");
        builder.add("phone");
        builder.remove("email");
        builder.remove("missing");
        assert_eq!(builder.tokens(), ["name", "phone"]);

        builder.remove_last();
        assert_eq!(builder.tokens(), ["name"]);
    }

    #[test]
    fn test_delimiter_never_enters_buffer() {
        let mut builder = TagBuilder::new();
        for c in "skills,".chars() {
            builder.handle(TagInput::Char(c));
        }
        assert_eq!(builder.tokens(), ["skills"]);
        assert_eq!(builder.buffer(), "");
    }

    #[test]
    fn test_backspace_edits_buffer_then_pops_tag() {
        let mut builder = TagBuilder::new();
        builder.add("name");
        builder.handle(TagInput::Char('x'));

        builder.handle(TagInput::Backspace);
        assert_eq!(builder.buffer(), "");
        assert_eq!(builder.tokens(), ["name"]);

        builder.handle(TagInput::Backspace);
        assert!(builder.tokens().is_empty());
    }

    #[test]
    fn test_blur_commits_non_empty_buffer() {
        let mut builder = TagBuilder::new();
        builder.handle(TagInput::Blur);
        assert!(builder.tokens().is_empty());

        for c in "Portfolio URL".chars() {
            builder.handle(TagInput::Char(c));
        }
        builder.handle(TagInput::Blur);
        assert_eq!(builder.tokens(), ["portfolio_url"]);
    }

    #[test]
    fn test_add_line_with_commas() {
        let mut builder = TagBuilder::new();
        let rejected = builder.add_line("name, 3 years exp, name, ?!, email, 2024");
        assert_eq!(builder.tokens(), ["name", "3_years_exp", "email", "2024"]);
        assert_eq!(rejected, vec!["name", "?!"]);
        assert_eq!(builder.buffer(), "");
        assert_eq!(
            builder.display_tokens(),
            vec!["name", "3 years exp", "email", "2024"]
        );
    }
}
