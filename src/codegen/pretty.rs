//! A small indentation-tracking string writer used by every emitter in
//! [`crate::codegen`], grounded on the `PrettyWriter` helper pattern (track an
//! indent depth, hand out an indented sub-writer for nested blocks, track
//! whether a blank-line separator is still owed).
use std::fmt::Write as _;

/// Accumulates generated C source text with consistent indentation.
pub struct PrettyWriter {
    buf: String,
    indent: usize,
    at_line_start: bool,
}

impl PrettyWriter {
    /// An empty writer at indentation zero.
    pub fn new() -> PrettyWriter {
        PrettyWriter {
            buf: String::new(),
            indent: 0,
            at_line_start: true,
        }
    }

    /// Write one line, indented to the writer's current depth.
    pub fn writeln(&mut self, line: impl AsRef<str>) -> &mut Self {
        if self.at_line_start {
            for _ in 0..self.indent {
                self.buf.push_str("    ");
            }
        }
        self.buf.push_str(line.as_ref());
        self.buf.push('\n');
        self.at_line_start = true;
        self
    }

    /// Write a block of text verbatim, line by line, applying the current
    /// indentation to each line (used for multi-line prelude text).
    pub fn writeln_block(&mut self, block: &str) -> &mut Self {
        for line in block.lines() {
            self.writeln(line);
        }
        self
    }

    /// Emit a blank separator line, unless the last thing written already
    /// was one (so callers can call `eob()` liberally without stacking up
    /// runs of blank lines between sections).
    pub fn eob(&mut self) -> &mut Self {
        if !self.buf.ends_with("\n\n") && !self.buf.is_empty() {
            let _ = writeln!(self.buf);
        }
        self
    }

    /// A sibling writer one indentation level deeper, for a brace block's
    /// body; its output is appended to `self` when it's dropped into
    /// [`Self::append_block`].
    pub fn new_block(&self) -> PrettyWriter {
        PrettyWriter {
            buf: String::new(),
            indent: self.indent + 1,
            at_line_start: true,
        }
    }

    /// Splice a block written with [`Self::new_block`] into this writer.
    pub fn append_block(&mut self, block: PrettyWriter) -> &mut Self {
        self.buf.push_str(&block.buf);
        self.at_line_start = true;
        self
    }

    /// Consume the writer, returning the accumulated source text.
    pub fn finish(self) -> String {
        self.buf
    }
}

impl Default for PrettyWriter {
    fn default() -> Self {
        PrettyWriter::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_block_is_indented_one_level() {
        let mut w = PrettyWriter::new();
        w.writeln("struct Foo {");
        let mut body = w.new_block();
        body.writeln("int x;");
        w.append_block(body);
        w.writeln("};");
        assert_eq!(w.finish(), "struct Foo {\n    int x;\n};\n");
    }

    #[test]
    fn eob_never_emits_more_than_one_blank_line() {
        let mut w = PrettyWriter::new();
        w.writeln("a");
        w.eob();
        w.eob();
        w.writeln("b");
        assert_eq!(w.finish(), "a\n\nb\n");
    }
}
