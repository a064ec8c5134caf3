/// A hunk represents a contiguous block of changes in a diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// Every line of the hunk body, in patch order
    pub lines: Vec<DiffLine>,
}

impl Hunk {
    /// Lines that exist in the new file and can carry a suggestion
    pub fn right_side_lines(&self) -> impl Iterator<Item = &DiffLine> {
        self.lines.iter().filter(|l| l.new_line.is_some())
    }
}

/// A single line of a hunk body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    /// Line text without the leading `+`, `-` or space
    pub content: String,
    /// Line number in the new file (None for deletions)
    pub new_line: Option<u32>,
}
