/// Default wrap width used to size text blocks in the terminal.
pub const DEFAULT_WIDTH: usize = 80;

/// A read-only text area that grows to fit its content.
///
/// `rows` is recomputed every time the text changes: each line takes
/// `ceil(chars / width)` rows, and an empty line still takes one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    text: String,
    width: usize,
    rows: usize,
}

impl TextBlock {
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_width(text, DEFAULT_WIDTH)
    }

    pub fn with_width(text: impl Into<String>, width: usize) -> Self {
        let mut block = Self {
            text: String::new(),
            width: width.max(1),
            rows: 1,
        };
        block.set_text(text);
        block
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.rows = fit_rows(&self.text, self.width);
    }

    pub fn set_width(&mut self, width: usize) {
        self.width = width.max(1);
        self.rows = fit_rows(&self.text, self.width);
    }

    /// The text broken at `width` characters: exactly `rows()` display lines.
    pub fn lines(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.rows());
        for line in self.text.split('\n') {
            let chars: Vec<char> = line.chars().collect();
            if chars.is_empty() {
                out.push(String::new());
            } else {
                out.extend(chars.chunks(self.width()).map(|chunk| chunk.iter().collect::<String>()));
            }
        }
        out
    }
}

fn fit_rows(text: &str, width: usize) -> usize {
    text.split('\n')
        .map(|line| line.chars().count().div_ceil(width).max(1))
        .sum()
}
