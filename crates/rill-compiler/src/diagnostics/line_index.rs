use rowan::{TextRange, TextSize};

/// Byte offset to 1-based line/column lookup over one source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    starts: Vec<TextSize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut starts = vec![TextSize::from(0)];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                starts.push(TextSize::from(i as u32 + 1));
            }
        }
        Self { starts }
    }

    /// 1-based line of `offset`.
    pub fn line(&self, offset: TextSize) -> u32 {
        match self.starts.binary_search(&offset) {
            Ok(i) => i as u32 + 1,
            Err(i) => i as u32,
        }
    }

    /// 1-based line and column; columns count characters, not bytes.
    pub fn line_col(&self, source: &str, offset: TextSize) -> (u32, u32) {
        let line = self.line(offset);
        let start = usize::from(self.starts[line as usize - 1]);
        let end = usize::from(offset).min(source.len());
        let col = source.get(start..end).map_or(0, |s| s.chars().count());
        (line, col as u32 + 1)
    }

    pub fn range_start(&self, source: &str, range: TextRange) -> (u32, u32) {
        self.line_col(source, range.start())
    }
}
