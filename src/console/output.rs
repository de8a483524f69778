//! Output sinks for rendered console text.
//!
//! Descriptor text carries `<info>`, `<comment>`, `<error>` and `<question>`
//! style tags. A sink decides what to do with them when asked to decorate.

use std::io::{self, Write};

const STYLE_TAGS: [&str; 4] = ["info", "comment", "error", "question"];

/// Destination for descriptor output.
pub trait OutputSink {
    /// Write `text`. When `decorated` is false the text must be emitted
    /// exactly as given, tags included.
    fn write(&mut self, text: &str, decorated: bool) -> io::Result<()>;
}

/// Collects output in memory, markup untouched.
#[derive(Debug, Default, Clone)]
pub struct BufferedOutput {
    buffer: String,
}

impl BufferedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> &str {
        &self.buffer
    }

    pub fn into_string(self) -> String {
        self.buffer
    }
}

impl OutputSink for BufferedOutput {
    fn write(&mut self, text: &str, _decorated: bool) -> io::Result<()> {
        self.buffer.push_str(text);
        Ok(())
    }
}

/// Writes to any [`Write`]; decorated text is rendered without style tags.
#[derive(Debug)]
pub struct StreamOutput<W: Write> {
    writer: W,
}

impl<W: Write> StreamOutput<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputSink for StreamOutput<W> {
    fn write(&mut self, text: &str, decorated: bool) -> io::Result<()> {
        if decorated {
            self.writer.write_all(strip_tags(text).as_bytes())
        } else {
            self.writer.write_all(text.as_bytes())
        }
    }
}

/// Remove style tags, leaving any other `<...>` text (e.g. `<id>`) alone.
pub fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match style_tag_len(tail) {
            Some(len) => rest = &tail[len..],
            None => {
                out.push('<');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn style_tag_len(tail: &str) -> Option<usize> {
    let inner = tail.strip_prefix('<')?;
    let (closing, inner) = match inner.strip_prefix('/') {
        Some(inner) => (true, inner),
        None => (false, inner),
    };
    let end = inner.find('>')?;
    let name = &inner[..end];
    if STYLE_TAGS.contains(&name) || (closing && name.is_empty()) {
        Some(1 + usize::from(closing) + end + 1)
    } else {
        None
    }
}
