//! Tracking of `#` comment blocks in expectation files.
//!
//! A block is a run of consecutive comment lines. It stays in effect for the
//! entries that follow it until a blank line or the next block starts.

/// The comment block currently in effect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentBlock {
    lines: Vec<String>,
    /// Whether the previous line was a comment; a comment after an entry
    /// starts a new block.
    open: bool,
}

impl CommentBlock {
    /// Feed one trimmed line. Returns `true` if the line was consumed as a
    /// comment or separator.
    pub fn observe(&mut self, line: &str) -> bool {
        if line.is_empty() {
            self.lines.clear();
            self.open = false;
            return true;
        }
        if let Some(text) = line.strip_prefix('#') {
            if !self.open {
                self.lines.clear();
                self.open = true;
            }
            let text = text.trim();
            if !text.is_empty() {
                self.lines.push(text.to_string());
            }
            return true;
        }
        self.open = false;
        false
    }

    /// The block as one line of text, or `None` if empty.
    pub fn text(&self) -> Option<String> {
        if self.lines.is_empty() {
            None
        } else {
            Some(self.lines.join(" "))
        }
    }

    /// Case-insensitive search in the block.
    pub fn contains(&self, needle: &str) -> bool {
        let needle = needle.to_ascii_lowercase();
        self.lines
            .iter()
            .any(|line| line.to_ascii_lowercase().contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_accumulates_and_resets_on_blank_line() {
        let mut block = CommentBlock::default();
        assert!(block.observe("# first"));
        assert!(block.observe("# second"));
        assert_eq!(block.text().as_deref(), Some("first second"));

        assert!(!block.observe("path/to/test.html"));
        assert_eq!(block.text().as_deref(), Some("first second"));

        assert!(block.observe(""));
        assert!(block.text().is_none());
    }

    #[test]
    fn test_comment_after_entry_starts_new_block() {
        let mut block = CommentBlock::default();
        block.observe("# old");
        block.observe("a.html");
        block.observe("# new");
        assert_eq!(block.text().as_deref(), Some("new"));
        assert!(block.contains("NEW"));
        assert!(!block.contains("old"));
    }
}
