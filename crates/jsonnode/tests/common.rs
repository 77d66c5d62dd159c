#![allow(missing_docs, dead_code)]

use std::io::{self, Read};

use jsonnode::{JsonNodeReader, NodeKind, ReaderError, ReaderOptions, ReaderQuotas};

/// A document touching every node shape.
pub const SHAPES: &str = r#"
{
    "__type": "Drawing:#Shapes",
    "title": "two \"shapes\"",
    "shapes": [
        { "kind": "circle", "center": { "x": 0, "y": -1.5 }, "radius": 1e2 },
        { "kind": "polygon", "points": [[0, 0], [4, 0], [4, 3]], "closed": true }
    ],
    "notes": null,
    "layers": {},
    "tags": []
}
"#;

/// Hands out at most `chunk` bytes per read.
pub struct Trickle<'a> {
    pub data: &'a [u8],
    pub chunk: usize,
}

impl Read for Trickle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.chunk).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

pub fn window(max_bytes_per_read: usize) -> ReaderOptions {
    ReaderOptions {
        quotas: ReaderQuotas {
            max_bytes_per_read,
            ..ReaderQuotas::default()
        },
        ..ReaderOptions::default()
    }
}

/// Renders one node per line, indented by depth. Complex text chunks are
/// prefixed with `~`.
pub fn render(input: &[u8], options: ReaderOptions, chunk: usize) -> Result<String, ReaderError> {
    let mut reader = JsonNodeReader::with_options(Trickle { data: input, chunk }, options);
    let mut lines = Vec::new();
    while reader.read_next()? {
        let indent = "  ".repeat(reader.depth());
        let line = match reader.node_kind() {
            NodeKind::Element => {
                let mut line = format!("{indent}<{}", reader.local_name());
                for index in 0..reader.attribute_count() {
                    reader.move_to_attribute_at(index);
                    line.push_str(&format!(" {}={}", reader.local_name(), reader.value()));
                }
                reader.move_to_element();
                line + ">"
            }
            NodeKind::EndElement => format!("{indent}</{}>", reader.local_name()),
            NodeKind::ComplexText => format!("{indent}~{:?}", reader.value()),
            _ => format!("{indent}{:?}", reader.value()),
        };
        lines.push(line);
    }
    Ok(lines.join("\n"))
}
