//! Push writer that turns element, attribute and text calls back into JSON.
//!
//! The writer accepts the node shape produced by
//! [`JsonNodeReader`](crate::JsonNodeReader): a `root` element, a `type`
//! attribute per element, `item` children inside arrays and an optional
//! `__type` attribute on objects. Elements without a `type` attribute take
//! their type from their first content.

mod escape;

#[cfg(test)]
mod tests;

use std::{
    fmt,
    io::{Read, Write},
};

use base64::Engine as _;

use self::escape::{escape_str, escape_utf16};
use crate::{
    codec::trim_xml_whitespace,
    error::WriterError,
    handle::ConstantName,
    json_type::JsonType,
    node::NodeKind,
    options::WriterOptions,
    reader::{JsonNodeReader, number::is_valid_number},
    value::Value,
};

/// An element whose start tag was written but whose value has not begun.
#[derive(Debug)]
struct PendingElement {
    name: String,
    json_type: Option<JsonType>,
    server_type: Option<String>,
    item: Option<String>,
}

/// What forces a pending element to commit to a type.
#[derive(Debug, Clone, Copy)]
enum Content {
    Element,
    Text,
    Value(JsonType),
    End,
}

/// An element whose value is being written.
#[derive(Debug, Clone, Copy)]
struct Scope {
    json_type: JsonType,
    /// Members or items written so far; a non-zero count needs a `,` before
    /// the next one.
    children: usize,
}

/// A forward-only JSON writer driven by node calls.
///
/// # Examples
///
/// ```rust
/// use jsonnode::JsonNodeWriter;
///
/// let mut writer = JsonNodeWriter::new(Vec::new());
/// writer.start_element("root")?;
/// writer.write_attribute("type", "object")?;
/// writer.start_element("x")?;
/// writer.write_attribute("type", "string")?;
/// writer.write_string("hi")?;
/// writer.end_element()?;
/// writer.end_element()?;
/// assert_eq!(writer.close()?, br#"{"x":"hi"}"#);
/// # Ok::<(), jsonnode::WriterError>(())
/// ```
pub struct JsonNodeWriter<W: Write> {
    sink: Option<W>,
    out: Vec<u8>,
    options: WriterOptions,
    scopes: Vec<Scope>,
    pending: Option<PendingElement>,
    /// Text of the current number or boolean element, validated when the
    /// element ends.
    text: String,
    /// Bytes of a `write_base64` call that did not fill a 3-byte group.
    base64_carry: Vec<u8>,
    root_written: bool,
    faulted: bool,
}

impl<W: Write> fmt::Debug for JsonNodeWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonNodeWriter")
            .field("scopes", &self.scopes)
            .field("pending", &self.pending)
            .field("buffered", &self.out.len())
            .field("faulted", &self.faulted)
            .finish_non_exhaustive()
    }
}

impl<W: Write> JsonNodeWriter<W> {
    /// A writer with default [`WriterOptions`].
    pub fn new(sink: W) -> Self {
        Self::with_options(sink, WriterOptions::default())
    }

    /// A writer with explicit options.
    pub fn with_options(sink: W, options: WriterOptions) -> Self {
        Self {
            sink: Some(sink),
            out: Vec::with_capacity(options.buffer_capacity),
            options,
            scopes: Vec::new(),
            pending: None,
            text: String::new(),
            base64_carry: Vec::with_capacity(3),
            root_written: false,
            faulted: false,
        }
    }

    /// Runs `op`, faulting the writer if it fails.
    fn guarded<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, WriterError>,
    ) -> Result<T, WriterError> {
        if self.sink.is_none() {
            return Err(WriterError::WriterClosed);
        }
        if self.faulted {
            return Err(WriterError::Faulted);
        }
        let result = op(self).and_then(|value| {
            self.flush_if_full()?;
            Ok(value)
        });
        if let Err(e) = &result {
            if !matches!(e, WriterError::Reader(_)) {
                self.faulted = true;
            }
        }
        result
    }

    fn flush_if_full(&mut self) -> Result<(), WriterError> {
        if self.out.len() >= self.options.buffer_capacity {
            self.flush_buffer()?;
        }
        Ok(())
    }

    fn flush_buffer(&mut self) -> Result<(), WriterError> {
        if let Some(sink) = self.sink.as_mut() {
            sink.write_all(&self.out)?;
        }
        self.out.clear();
        Ok(())
    }

    /// Number of open elements, a pending one included.
    pub fn depth(&self) -> usize {
        self.scopes.len() + usize::from(self.pending.is_some())
    }

    /// Opens an element. The first one must be `root`, children of an
    /// array must be `item`.
    ///
    /// # Errors
    ///
    /// A protocol violation, which faults the writer.
    pub fn start_element(&mut self, name: &str) -> Result<(), WriterError> {
        self.guarded(|w| w.start_element_inner(name))
    }

    fn start_element_inner(&mut self, name: &str) -> Result<(), WriterError> {
        if self.pending.is_some() {
            self.commit(Content::Element)?;
        }
        match self.scopes.last() {
            None if self.root_written => return Err(WriterError::MultipleRootElements),
            None if name != ConstantName::Root.as_str() => {
                return Err(WriterError::InvalidRootElementName(name.to_owned()));
            }
            None => {}
            Some(scope) => match scope.json_type {
                JsonType::Object => {}
                JsonType::Array if name == ConstantName::Item.as_str() => {}
                JsonType::Array => return Err(WriterError::InvalidArrayItemName(name.to_owned())),
                other => return Err(WriterError::ElementNotAllowed(other)),
            },
        }
        self.pending = Some(PendingElement {
            name: name.to_owned(),
            json_type: None,
            server_type: None,
            item: None,
        });
        Ok(())
    }

    /// Writes one attribute of the element just started.
    ///
    /// Recognized names are `type`, `__type` and `item`. An attribute is
    /// written in one call, so text can never land inside it.
    pub fn write_attribute(&mut self, name: &str, value: &str) -> Result<(), WriterError> {
        self.guarded(|w| {
            let Some(pending) = w.pending.as_mut() else {
                return Err(WriterError::AttributeAfterContent(name.to_owned()));
            };
            let slot = match name {
                "type" => {
                    if pending.json_type.is_some() {
                        return Err(WriterError::DuplicateAttribute(name.to_owned()));
                    }
                    let json_type = value
                        .parse()
                        .map_err(|_| WriterError::InvalidTypeAttribute(value.to_owned()))?;
                    pending.json_type = Some(json_type);
                    return Ok(());
                }
                "__type" => &mut pending.server_type,
                "item" => &mut pending.item,
                _ => return Err(WriterError::UnknownAttribute(name.to_owned())),
            };
            if slot.is_some() {
                return Err(WriterError::DuplicateAttribute(name.to_owned()));
            }
            *slot = Some(value.to_owned());
            Ok(())
        })
    }

    fn push_separator(&mut self) {
        if let Some(parent) = self.scopes.last_mut() {
            if parent.children > 0 {
                self.out.push(b',');
            }
            parent.children += 1;
        }
    }

    fn push_string(&mut self, text: &str) {
        self.out.push(b'"');
        escape_str(&mut self.out, text, self.options.escape_solidus);
        self.out.push(b'"');
    }

    /// Writes the pending element's key and opening token.
    fn commit(&mut self, content: Content) -> Result<JsonType, WriterError> {
        let Some(pending) = self.pending.take() else {
            return Ok(self.scopes.last().map_or(JsonType::String, |s| s.json_type));
        };
        let json_type = match (pending.json_type, content) {
            (Some(json_type), _) => json_type,
            (None, _) if pending.server_type.is_some() => JsonType::Object,
            (None, Content::Element) => JsonType::Object,
            (None, Content::Value(json_type)) => json_type,
            (None, Content::Text | Content::End) => JsonType::String,
        };
        if pending.server_type.is_some() && json_type != JsonType::Object {
            return Err(WriterError::ServerTypeNotAllowed(json_type));
        }

        let in_object = self
            .scopes
            .last()
            .is_some_and(|parent| parent.json_type == JsonType::Object);
        self.push_separator();
        if in_object {
            let key = match &pending.item {
                Some(item) if pending.name == ConstantName::Item.as_str() => item.as_str(),
                _ => pending.name.as_str(),
            };
            self.push_string(key);
            self.out.push(b':');
        }
        if self.scopes.is_empty() {
            self.root_written = true;
        }

        let mut children = 0;
        match json_type {
            JsonType::Object => {
                self.out.push(b'{');
                if let Some(server_type) = &pending.server_type {
                    self.push_string(ConstantName::ServerType.as_str());
                    self.out.push(b':');
                    self.push_string(server_type);
                    children = 1;
                }
            }
            JsonType::Array => self.out.push(b'['),
            JsonType::String => self.out.push(b'"'),
            JsonType::Number | JsonType::Boolean => self.text.clear(),
            JsonType::Null => {}
        }
        self.scopes.push(Scope {
            json_type,
            children,
        });
        Ok(json_type)
    }

    /// Type of the element receiving text, committing a pending one.
    fn text_target(&mut self, content: Content) -> Result<JsonType, WriterError> {
        if self.pending.is_none() && self.scopes.is_empty() {
            return Err(WriterError::TextOutsideElement);
        }
        self.commit(content)
    }

    fn flush_base64(&mut self) {
        if self.base64_carry.is_empty() {
            return;
        }
        let mut encoded = String::with_capacity(4);
        base64::engine::general_purpose::STANDARD.encode_string(&self.base64_carry, &mut encoded);
        self.base64_carry.clear();
        escape_str(&mut self.out, &encoded, self.options.escape_solidus);
    }

    /// Writes text content. Inside object and array elements only
    /// whitespace is accepted, and it is dropped.
    pub fn write_string(&mut self, text: &str) -> Result<(), WriterError> {
        self.guarded(|w| {
            if w.pending.is_none()
                && w.scopes.is_empty()
                && trim_xml_whitespace(text.as_bytes()).is_empty()
            {
                return Ok(());
            }
            match w.text_target(Content::Text)? {
                JsonType::String => {
                    w.flush_base64();
                    escape_str(&mut w.out, text, w.options.escape_solidus);
                }
                JsonType::Number | JsonType::Boolean => w.text.push_str(text),
                JsonType::Null if text.is_empty() => {}
                JsonType::Null => return Err(WriterError::ContentInNullElement),
                JsonType::Object | JsonType::Array
                    if trim_xml_whitespace(text.as_bytes()).is_empty() => {}
                json_type => return Err(WriterError::TextNotAllowed(json_type)),
            }
            Ok(())
        })
    }

    /// Writes a typed value as the content of the current element.
    pub fn write_value(&mut self, value: Value<'_>) -> Result<(), WriterError> {
        self.guarded(|w| w.write_value_inner(value))
    }

    fn write_value_inner(&mut self, value: Value<'_>) -> Result<(), WriterError> {
        match self.text_target(Content::Value(value.natural_type()))? {
            JsonType::String => {
                self.flush_base64();
                let solidus = self.options.escape_solidus;
                match value {
                    Value::Str(s) => escape_str(&mut self.out, s, solidus),
                    Value::Utf16(units) => escape_utf16(&mut self.out, units, solidus),
                    other => {
                        let mut text = String::new();
                        other.append_text(&mut text);
                        escape_str(&mut self.out, &text, solidus);
                    }
                }
            }
            JsonType::Number | JsonType::Boolean => value.append_text(&mut self.text),
            JsonType::Null if value == Value::Null => {}
            JsonType::Null => return Err(WriterError::ContentInNullElement),
            json_type => return Err(WriterError::TextNotAllowed(json_type)),
        }
        Ok(())
    }

    /// Writes bytes as base64 string content. Consecutive calls form one
    /// base64 text.
    pub fn write_base64(&mut self, bytes: &[u8]) -> Result<(), WriterError> {
        self.guarded(|w| {
            match w.text_target(Content::Value(JsonType::String))? {
                JsonType::String => {}
                json_type => return Err(WriterError::TextNotAllowed(json_type)),
            }
            let mut input = bytes;
            if !w.base64_carry.is_empty() {
                let take = (3 - w.base64_carry.len()).min(input.len());
                w.base64_carry.extend_from_slice(&input[..take]);
                input = &input[take..];
                if w.base64_carry.len() < 3 {
                    return Ok(());
                }
                w.flush_base64();
            }
            let whole = input.len() - input.len() % 3;
            let mut encoded = String::with_capacity(whole / 3 * 4);
            base64::engine::general_purpose::STANDARD.encode_string(&input[..whole], &mut encoded);
            escape_str(&mut w.out, &encoded, w.options.escape_solidus);
            w.base64_carry.extend_from_slice(&input[whole..]);
            Ok(())
        })
    }

    /// Writes every value as a sibling element named `name`.
    pub fn write_array(&mut self, name: &str, values: &[Value<'_>]) -> Result<(), WriterError> {
        for &value in values {
            self.start_element(name)?;
            self.write_value(value)?;
            self.end_element()?;
        }
        Ok(())
    }

    /// Closes the innermost open element.
    ///
    /// # Errors
    ///
    /// [`WriterError::EndElementNoOpenNodes`] when nothing is open.
    pub fn end_element(&mut self) -> Result<(), WriterError> {
        self.guarded(Self::end_element_inner)
    }

    fn end_element_inner(&mut self) -> Result<(), WriterError> {
        if self.pending.is_some() {
            self.commit(Content::End)?;
        }
        let Some(scope) = self.scopes.pop() else {
            return Err(WriterError::EndElementNoOpenNodes);
        };
        match scope.json_type {
            JsonType::Object => self.out.push(b'}'),
            JsonType::Array => self.out.push(b']'),
            JsonType::String => {
                self.flush_base64();
                self.out.push(b'"');
            }
            JsonType::Number => {
                let text = trim_xml_whitespace(self.text.as_bytes());
                if !is_valid_number(text) {
                    return Err(WriterError::InvalidNumber(self.text.clone()));
                }
                self.out.extend_from_slice(text);
            }
            JsonType::Boolean => {
                let text = trim_xml_whitespace(self.text.as_bytes());
                if !matches!(text, b"true" | b"false") {
                    return Err(WriterError::InvalidBoolean(self.text.clone()));
                }
                self.out.extend_from_slice(text);
            }
            JsonType::Null => self.out.extend_from_slice(b"null"),
        }
        Ok(())
    }

    /// Copies the reader's current node to the writer. On an element the
    /// whole subtree is copied, and the reader is left on the node after
    /// its end element. A reader that has not started is read from the
    /// beginning.
    ///
    /// # Errors
    ///
    /// [`WriterError::Reader`] when reading fails. It does not fault the
    /// writer.
    pub fn write_node<R: Read>(&mut self, reader: &mut JsonNodeReader<R>) -> Result<(), WriterError> {
        if reader.node_kind() == NodeKind::Initial && !reader.read_next()? {
            return Ok(());
        }
        reader.move_to_element();
        let start_kind = reader.node_kind();
        let start_depth = reader.depth();
        loop {
            self.copy_node(reader)?;
            let done = start_kind != NodeKind::Element
                || (reader.node_kind() == NodeKind::EndElement && reader.depth() == start_depth);
            if !reader.read_next()? || done {
                return Ok(());
            }
        }
    }

    fn copy_node<R: Read>(&mut self, reader: &mut JsonNodeReader<R>) -> Result<(), WriterError> {
        match reader.node_kind() {
            NodeKind::Element => {
                self.start_element(&reader.local_name())?;
                for index in 0..reader.attribute_count() {
                    reader.move_to_attribute_at(index);
                    self.write_attribute(&reader.local_name(), &reader.value())?;
                }
                reader.move_to_element();
            }
            NodeKind::EndElement => self.end_element()?,
            NodeKind::AtomicText
            | NodeKind::ComplexText
            | NodeKind::CData
            | NodeKind::Whitespace => self.write_string(&reader.value())?,
            _ => {}
        }
        Ok(())
    }

    /// Hands buffered output to the sink and flushes it.
    pub fn flush(&mut self) -> Result<(), WriterError> {
        self.guarded(|w| {
            w.flush_buffer()?;
            if let Some(sink) = w.sink.as_mut() {
                sink.flush()?;
            }
            Ok(())
        })
    }

    /// Finishes the document and returns the sink.
    ///
    /// # Errors
    ///
    /// [`WriterError::UnclosedElements`] while elements are open. Once
    /// closed, every call fails with [`WriterError::WriterClosed`].
    pub fn close(&mut self) -> Result<W, WriterError> {
        self.guarded(|w| {
            let open = w.depth();
            if open > 0 {
                return Err(WriterError::UnclosedElements(open));
            }
            w.flush_buffer()?;
            let Some(mut sink) = w.sink.take() else {
                return Err(WriterError::WriterClosed);
            };
            sink.flush()?;
            Ok(sink)
        })
    }

    /// Starts a new document on `sink`, dropping any state of the previous
    /// one.
    pub fn reset(&mut self, sink: W) {
        self.sink = Some(sink);
        self.out.clear();
        self.scopes.clear();
        self.pending = None;
        self.text.clear();
        self.base64_carry.clear();
        self.root_written = false;
        self.faulted = false;
    }
}
