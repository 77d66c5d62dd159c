use std::io::{Read, Write};

use crate::{JsonNodeReader, JsonNodeWriter, WriterError};

/// Copies the whole document under `reader` into `writer` and flushes it.
///
/// The output is the input minus insignificant whitespace. Number and
/// string spellings are carried over as read, so escapes are normalised
/// but `1.0e2` stays `1.0e2`.
///
/// ```rust
/// let mut reader = jsonnode::JsonNodeReader::new(&b" { \"a\" : [ 1.0e2 , \"\\u0041\" ] } "[..]);
/// let mut writer = jsonnode::JsonNodeWriter::new(Vec::new());
/// jsonnode::transcode(&mut reader, &mut writer)?;
/// assert_eq!(writer.close()?, br#"{"a":[1.0e2,"A"]}"#);
/// # Ok::<(), jsonnode::WriterError>(())
/// ```
///
/// # Errors
///
/// Propagates the first reader or writer error.
pub fn transcode<R: Read, W: Write>(
    reader: &mut JsonNodeReader<R>,
    writer: &mut JsonNodeWriter<W>,
) -> Result<(), WriterError> {
    writer.write_node(reader)?;
    writer.flush()
}
