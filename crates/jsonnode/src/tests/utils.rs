use std::{
    fmt::Write as _,
    io::{self, Read},
};

use crate::{
    JsonNodeReader, JsonNodeWriter, NodeKind, ReaderError, ReaderOptions, ReaderQuotas, WriterError,
    transcode,
};

/// Number of quickcheck cases per property.
pub(crate) fn quickcheck_tests() -> u64 {
    if is_ci::cached() { 10_000 } else { 1_000 }
}

/// Hands out at most `chunk` bytes per read.
pub(crate) struct ChunkedReader<'a> {
    data: &'a [u8],
    chunk: usize,
}

impl<'a> ChunkedReader<'a> {
    pub(crate) fn new(data: &'a [u8], chunk: usize) -> Self {
        assert!(chunk > 0);
        Self { data, chunk }
    }
}

impl Read for ChunkedReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.chunk).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

/// Yields `data`, then fails every read with `kind`.
pub(crate) struct FailingReader<'a> {
    data: &'a [u8],
    kind: io::ErrorKind,
}

impl<'a> FailingReader<'a> {
    pub(crate) fn new(data: &'a [u8], kind: io::ErrorKind) -> Self {
        Self { data, kind }
    }
}

impl Read for FailingReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.data.is_empty() {
            return Err(self.kind.into());
        }
        self.data.read(buf)
    }
}

pub(crate) fn options_with_window(max_bytes_per_read: usize) -> ReaderOptions {
    ReaderOptions {
        quotas: ReaderQuotas {
            max_bytes_per_read,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// One line per node: depth, then `<name attr=value>`, `</name>`, `"text"`
/// for atomic text or `~"text"` for a chunk of complex text.
pub(crate) fn render_node<R: Read>(reader: &mut JsonNodeReader<R>) -> String {
    let depth = reader.depth();
    match reader.node_kind() {
        NodeKind::Element => {
            let mut line = format!("{depth} <{}", reader.local_name());
            while reader.move_to_next_attribute() {
                let _ = write!(line, " {}={}", reader.local_name(), reader.value());
            }
            reader.move_to_element();
            line.push('>');
            line
        }
        NodeKind::EndElement => format!("{depth} </{}>", reader.local_name()),
        NodeKind::AtomicText => format!("{depth} {:?}", reader.value()),
        NodeKind::ComplexText => format!("{depth} ~{:?}", reader.value()),
        other => format!("{depth} {other:?}"),
    }
}

/// Reads `input` through a stream of `chunk`-sized reads and a window of
/// `max_bytes_per_read` bytes.
pub(crate) fn trace_with(
    input: &[u8],
    max_bytes_per_read: usize,
    chunk: usize,
) -> Result<Vec<String>, ReaderError> {
    let mut reader = JsonNodeReader::with_options(
        ChunkedReader::new(input, chunk),
        options_with_window(max_bytes_per_read),
    );
    let mut lines = Vec::new();
    while reader.read_next()? {
        lines.push(render_node(&mut reader));
    }
    Ok(lines)
}

pub(crate) fn trace(input: &str) -> Vec<String> {
    trace_with(input.as_bytes(), 4096, 4096).unwrap()
}

/// Reads every node and returns the first error.
pub(crate) fn read_to_end(input: &[u8]) -> Result<usize, ReaderError> {
    let mut reader = JsonNodeReader::new(input);
    let mut nodes = 0;
    while reader.read_next()? {
        nodes += 1;
    }
    Ok(nodes)
}

/// Transcodes `input` read as in [`trace_with`] and returns the JSON written.
pub(crate) fn transcode_with(
    input: &[u8],
    max_bytes_per_read: usize,
    chunk: usize,
) -> Result<Vec<u8>, WriterError> {
    let mut reader = JsonNodeReader::with_options(
        ChunkedReader::new(input, chunk),
        options_with_window(max_bytes_per_read),
    );
    let mut writer = JsonNodeWriter::new(Vec::new());
    transcode(&mut reader, &mut writer)?;
    writer.close()
}
