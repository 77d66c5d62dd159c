//! Pull reader that exposes a JSON document as element, attribute and text
//! nodes.
//!
//! Each JSON value becomes an element carrying a synthetic `type`
//! attribute. Object members are named after their key, array items are
//! named `item`, and the document value is named `root`. An object whose
//! first member is `"__type"` also carries a `__type` attribute holding that
//! member's string value.
//!
//! The reader never builds a tree. It keeps one window of the input (see
//! [`ReaderQuotas::max_bytes_per_read`]) and hands out names and values as
//! handles into it, decoding them only when a caller asks.

pub(crate) mod escape;
mod literal;
pub(crate) mod number;


use std::{borrow::Cow, fmt, io::Read, time::Instant};

use tracing::debug;

use self::{
    escape::{EscapeScan, scan_escape},
    literal::{ExpectedLiteralBuffer, Literal, Step},
    number::{NumberState, is_delimiter},
};
use crate::{
    codec::{DateTime, Decimal, FromJsonText, TimeSpan, UniqueId, is_xml_whitespace},
    error::{ErrorSource, QuotaError, ReaderError, SyntaxError},
    handle::{ConstantName, NameHandle, ValueHandle},
    json_type::JsonType,
    node::{NodeKind, NodeType, ReadState},
    options::{MIN_BYTES_PER_READ, ReaderOptions, ReaderQuotas},
    window::{ByteWindow, Fill},
};

const ATTRIBUTE_NAMES: [ConstantName; 2] = [ConstantName::Type, ConstantName::ServerType];

/// Syntactic container the cursor is inside of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// Inside an element whose value has not been fully read.
    Element,
    Object { has_members: bool },
    Collection { has_items: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComplexTextMode {
    QuotedText,
    NumericalText,
}

/// What the next call to `read_next` produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Next {
    Root,
    Content,
    /// The current element's value was fully reported.
    EndCurrent,
    ComplexText(ComplexTextMode),
    /// Only whitespace may follow the root element.
    Trailing,
    Done,
}

/// An open element. Entries are pooled and reused across siblings.
#[derive(Debug)]
struct ElementNode {
    name: NameHandle,
    /// Holds the name once it was copied out of the window.
    detached: String,
    json_type: JsonType,
    server_type: ValueHandle,
}

impl ElementNode {
    fn new() -> Self {
        Self {
            name: NameHandle::Empty,
            detached: String::new(),
            json_type: JsonType::Null,
            server_type: ValueHandle::Empty,
        }
    }
}

enum Scanned {
    /// The closing quote was consumed.
    Closed {
        offset: usize,
        len: usize,
        escaped: bool,
    },
    /// The string continues past the window ceiling.
    Cut {
        offset: usize,
        len: usize,
        escaped: bool,
    },
}

/// A forward-only reader over a JSON document.
///
/// # Examples
///
/// ```rust
/// use jsonnode::{JsonNodeReader, NodeType};
///
/// let mut reader = JsonNodeReader::new(&br#"{"a":1}"#[..]);
/// assert!(reader.read_next()?);
/// assert_eq!(reader.local_name(), "root");
/// assert_eq!(reader.get_attribute("type").as_deref(), Some("object"));
///
/// assert!(reader.read_next()?);
/// assert_eq!(reader.local_name(), "a");
/// assert_eq!(reader.read_element_content_as::<i32>()?, 1);
/// assert_eq!(reader.node_type(), NodeType::EndElement);
/// # Ok::<(), jsonnode::ReaderError>(())
/// ```
pub struct JsonNodeReader<R> {
    window: ByteWindow<R>,
    quotas: ReaderQuotas,
    kind: NodeKind,
    next: Next,
    scopes: Vec<Scope>,
    elements: Vec<ElementNode>,
    /// Number of open elements.
    element_depth: usize,
    /// Index of the element the current node belongs to.
    current: usize,
    attribute: usize,
    value: ValueHandle,
    number: NumberState,
    /// A `,` was consumed and the next member or item is mandatory.
    after_separator: bool,
    /// A member name sits in `elements[element_depth]` before its element
    /// is opened.
    staged_name: bool,
    faulted: bool,
}

impl<R> fmt::Debug for JsonNodeReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonNodeReader")
            .field("kind", &self.kind)
            .field("next", &self.next)
            .field("element_depth", &self.element_depth)
            .field("scopes", &self.scopes)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl<R: Read> JsonNodeReader<R> {
    /// Creates a reader with default [`ReaderOptions`].
    pub fn new(stream: R) -> Self {
        Self::with_options(stream, ReaderOptions::default())
    }

    /// Creates a reader with explicit quotas and deadline. A
    /// `max_bytes_per_read` below [`MIN_BYTES_PER_READ`] is raised to it.
    pub fn with_options(stream: R, options: ReaderOptions) -> Self {
        let mut quotas = options.quotas;
        quotas.max_bytes_per_read = quotas.max_bytes_per_read.max(MIN_BYTES_PER_READ);
        Self {
            window: ByteWindow::new(stream, quotas.max_bytes_per_read, options.deadline),
            quotas,
            kind: NodeKind::Initial,
            next: Next::Root,
            scopes: Vec::new(),
            elements: Vec::new(),
            element_depth: 0,
            current: 0,
            attribute: 0,
            value: ValueHandle::Empty,
            number: NumberState::Start,
            after_separator: false,
            staged_name: false,
            faulted: false,
        }
    }

    /// Advances to the next node. Returns `false` at the end of the
    /// document.
    ///
    /// # Errors
    ///
    /// Malformed input, an exceeded quota, a failing stream or an expired
    /// deadline. All of them fault the reader.
    pub fn read_next(&mut self) -> Result<bool, ReaderError> {
        if self.faulted {
            return Err(self.error(ErrorSource::Faulted));
        }
        match self.step() {
            Ok(more) => {
                debug_assert!(self.scopes.len() >= self.depth());
                Ok(more)
            }
            Err(e) => {
                if e.is_fatal() {
                    self.faulted = true;
                }
                Err(e)
            }
        }
    }

    fn step(&mut self) -> Result<bool, ReaderError> {
        if self.kind == NodeKind::Closed {
            return Ok(false);
        }
        self.reanchor();
        self.value = ValueHandle::Empty;
        self.attribute = 0;
        match self.next {
            Next::Root => self.read_root(),
            Next::Content => match self.scopes.last().copied() {
                Some(Scope::Element) => self.read_value(),
                Some(Scope::Object { has_members }) => self.read_member(has_members),
                Some(Scope::Collection { has_items }) => self.read_item(has_items),
                None => self.read_trailing(),
            },
            Next::EndCurrent => {
                self.end_element();
                Ok(true)
            }
            Next::ComplexText(ComplexTextMode::QuotedText) => self.read_string_value(false),
            Next::ComplexText(ComplexTextMode::NumericalText) => self.read_number_value(false),
            Next::Trailing => self.read_trailing(),
            Next::Done => {
                self.kind = NodeKind::EndOfFile;
                Ok(false)
            }
        }
    }

    /// Starts a new window at the cursor. Past the compaction point the
    /// names of open elements are copied out first, since compacting moves
    /// the bytes they refer to.
    fn reanchor(&mut self) {
        let length = self.quotas.max_bytes_per_read;
        if !self.window.past_compaction_point() {
            self.window.set_window(self.window.offset(), length);
            return;
        }
        let bytes = self.window.bytes();
        let named = self.element_depth + usize::from(self.staged_name);
        for element in self.elements[..named].iter_mut().rev() {
            match element.name {
                NameHandle::Detached => break,
                name if name.is_slice() => {
                    let resolved = name.resolve(bytes, "");
                    element.detached.clear();
                    element.detached.push_str(&resolved);
                    element.name = NameHandle::Detached;
                }
                _ => {}
            }
        }
        self.window.set_window(0, length);
    }

    fn error(&self, source: impl Into<ErrorSource>) -> ReaderError {
        ReaderError::new(source, self.window.position())
    }

    fn eof(&self) -> ReaderError {
        self.error(SyntaxError::UnexpectedEndOfFile)
    }

    fn invalid_operation(&self, message: &'static str) -> ReaderError {
        self.error(ErrorSource::InvalidOperation(message))
    }

    /// Skips whitespace and peeks the byte after it, `None` at the end of
    /// input. With `reanchor` a run of whitespace longer than the window
    /// starts a new window instead of failing.
    fn skip_whitespace(&mut self, reanchor: bool) -> Result<Option<u8>, ReaderError> {
        loop {
            let available = self.window.available();
            let (run, found) = match available.iter().position(|&b| !is_xml_whitespace(b)) {
                Some(i) => (i, Some(available[i])),
                None => (available.len(), None),
            };
            self.window.skip(run);
            if found.is_some() {
                return Ok(found);
            }
            match self.window.try_ensure(1)? {
                Fill::Ready => {}
                Fill::Eof => return Ok(None),
                Fill::WindowFull if reanchor => self.reanchor(),
                Fill::WindowFull => return Err(self.window.window_error()),
            }
        }
    }

    /// Like [`Self::skip_whitespace`], but treats the window ceiling like
    /// the end of input. Used for optional look-ahead.
    fn peek_past_whitespace(&mut self) -> Result<Option<u8>, ReaderError> {
        loop {
            let available = self.window.available();
            let (run, found) = match available.iter().position(|&b| !is_xml_whitespace(b)) {
                Some(i) => (i, Some(available[i])),
                None => (available.len(), None),
            };
            self.window.skip(run);
            if found.is_some() {
                return Ok(found);
            }
            match self.window.try_ensure(1)? {
                Fill::Ready => {}
                Fill::Eof | Fill::WindowFull => return Ok(None),
            }
        }
    }

    fn check_depth(&self) -> Result<(), ReaderError> {
        if self.element_depth >= self.quotas.max_depth {
            return Err(self.error(QuotaError::MaxDepthExceeded(self.quotas.max_depth)));
        }
        Ok(())
    }

    fn value_type(&self, first: u8) -> Result<JsonType, ReaderError> {
        JsonType::from_first_byte(first)
            .ok_or_else(|| self.error(SyntaxError::UnexpectedCharacter(first)))
    }

    fn read_root(&mut self) -> Result<bool, ReaderError> {
        let Some(first) = self.skip_whitespace(true)? else {
            self.kind = NodeKind::EndOfFile;
            self.next = Next::Done;
            return Ok(false);
        };
        let json_type = self.value_type(first)?;
        self.check_depth()?;
        self.open_element(NameHandle::Constant(ConstantName::Root), json_type)?;
        Ok(true)
    }

    /// The pooled entry for the next element.
    fn element_slot(&mut self) -> usize {
        let index = self.element_depth;
        if index == self.elements.len() {
            self.elements.push(ElementNode::new());
        }
        index
    }

    /// Emits an element node. The cursor is on the first byte of its value.
    fn open_element(&mut self, name: NameHandle, json_type: JsonType) -> Result<(), ReaderError> {
        let index = self.element_slot();
        self.staged_name = false;
        let element = &mut self.elements[index];
        element.name = name;
        element.json_type = json_type;
        element.server_type = ValueHandle::Empty;

        self.element_depth += 1;
        self.current = index;
        self.kind = NodeKind::Element;
        self.next = Next::Content;
        self.after_separator = false;
        self.scopes.push(Scope::Element);
        match json_type {
            JsonType::Object => {
                self.window.skip(1);
                self.scopes.push(Scope::Object { has_members: false });
                self.read_server_type()?;
            }
            JsonType::Array => {
                self.window.skip(1);
                self.scopes.push(Scope::Collection { has_items: false });
            }
            _ => {}
        }
        Ok(())
    }

    /// Looks for `"__type"` as the first member of the object just opened.
    /// The look-ahead gets a fresh window starting at the member, so the
    /// outcome does not depend on how much of the window the object's own
    /// name used. Leaves the cursor on the member when it is not there.
    fn read_server_type(&mut self) -> Result<(), ReaderError> {
        if self.skip_whitespace(true)? != Some(b'"') {
            return Ok(());
        }
        self.reanchor();
        let start = self.window.offset();
        if !self.try_server_type()? {
            let consumed = self.window.offset() - start;
            self.window.unread(consumed);
        }
        Ok(())
    }

    fn try_server_type(&mut self) -> Result<bool, ReaderError> {
        const KEY: &[u8] = b"\"__type\"";

        if self.window.try_ensure(KEY.len())? != Fill::Ready
            || self.window.advance_and_get(KEY.len())? != KEY
        {
            return Ok(false);
        }
        if self.peek_past_whitespace()? != Some(b':') {
            return Ok(false);
        }
        self.window.skip(1);
        if self.peek_past_whitespace()? != Some(b'"') {
            return Ok(false);
        }

        self.window.skip(1);
        let (offset, len, escaped) = match self.scan_string()? {
            Scanned::Closed {
                offset,
                len,
                escaped,
            } => (offset, len, escaped),
            Scanned::Cut { .. } => return Err(self.window.window_error()),
        };
        self.elements[self.current].server_type = ValueHandle::slice(offset, len, escaped);
        if self.peek_past_whitespace()? == Some(b',') {
            self.window.skip(1);
            self.after_separator = true;
        }
        if let Some(Scope::Object { has_members }) = self.scopes.last_mut() {
            *has_members = true;
        }
        Ok(true)
    }

    fn end_element(&mut self) {
        let popped = self.scopes.pop();
        debug_assert_eq!(popped, Some(Scope::Element));
        self.element_depth -= 1;
        self.current = self.element_depth;
        self.kind = NodeKind::EndElement;
        self.next = if self.element_depth == 0 {
            Next::Trailing
        } else {
            Next::Content
        };
    }

    fn read_member(&mut self, has_members: bool) -> Result<bool, ReaderError> {
        loop {
            let Some(b) = self.skip_whitespace(true)? else {
                return Err(self.eof());
            };
            match b {
                b'}' if !self.after_separator => {
                    self.window.skip(1);
                    self.scopes.pop();
                    self.end_element();
                    return Ok(true);
                }
                b',' if has_members && !self.after_separator => {
                    self.window.skip(1);
                    self.after_separator = true;
                }
                b'"' if !has_members || self.after_separator => {
                    self.read_member_element()?;
                    return Ok(true);
                }
                found if has_members && !self.after_separator => {
                    return Err(self.error(SyntaxError::TokenExpected {
                        expected: b',',
                        found: Some(found),
                    }));
                }
                found => return Err(self.error(SyntaxError::UnexpectedCharacter(found))),
            }
        }
    }

    fn read_member_element(&mut self) -> Result<(), ReaderError> {
        self.check_depth()?;
        self.window.skip(1);
        let name = match self.scan_string()? {
            Scanned::Closed {
                offset,
                len,
                escaped,
            } => NameHandle::slice(offset, len, escaped),
            Scanned::Cut { .. } => return Err(self.window.window_error()),
        };
        let index = self.element_slot();
        self.elements[index].name = name;
        self.staged_name = true;

        match self.skip_whitespace(true)? {
            Some(b':') => self.window.skip(1),
            found => {
                return Err(self.error(SyntaxError::TokenExpected {
                    expected: b':',
                    found,
                }));
            }
        }
        let Some(first) = self.skip_whitespace(true)? else {
            return Err(self.eof());
        };
        let json_type = self.value_type(first)?;
        if let Some(Scope::Object { has_members }) = self.scopes.last_mut() {
            *has_members = true;
        }
        // Re-read: a long run of whitespace may have detached the name.
        let name = self.elements[index].name;
        self.open_element(name, json_type)
    }

    fn read_item(&mut self, has_items: bool) -> Result<bool, ReaderError> {
        loop {
            let Some(b) = self.skip_whitespace(true)? else {
                return Err(self.eof());
            };
            match b {
                b']' if !self.after_separator => {
                    self.window.skip(1);
                    self.scopes.pop();
                    self.end_element();
                    return Ok(true);
                }
                b',' if has_items && !self.after_separator => {
                    self.window.skip(1);
                    self.after_separator = true;
                }
                first if !has_items || self.after_separator => {
                    let json_type = self.value_type(first)?;
                    self.check_depth()?;
                    if let Some(Scope::Collection { has_items }) = self.scopes.last_mut() {
                        *has_items = true;
                    }
                    self.open_element(NameHandle::Constant(ConstantName::Item), json_type)?;
                    return Ok(true);
                }
                found => {
                    return Err(self.error(SyntaxError::TokenExpected {
                        expected: b',',
                        found: Some(found),
                    }));
                }
            }
        }
    }

    fn read_trailing(&mut self) -> Result<bool, ReaderError> {
        match self.skip_whitespace(true)? {
            None => {
                self.kind = NodeKind::EndOfFile;
                self.next = Next::Done;
                Ok(false)
            }
            Some(_) => Err(self.error(SyntaxError::MultipleRootElementsNotAllowed)),
        }
    }

    /// Reads the scalar value of the current element.
    fn read_value(&mut self) -> Result<bool, ReaderError> {
        let Some(first) = self.skip_whitespace(true)? else {
            return Err(self.eof());
        };
        match first {
            b'"' => {
                self.window.skip(1);
                self.read_string_value(true)
            }
            b'-' | b'0'..=b'9' => {
                self.number = NumberState::Start;
                self.read_number_value(true)
            }
            b't' | b'f' | b'n' => self.read_literal(first),
            other => Err(self.error(SyntaxError::UnexpectedCharacter(other))),
        }
    }

    fn emit_text(&mut self, kind: NodeKind, value: ValueHandle, next: Next) {
        self.kind = kind;
        self.value = value;
        self.next = next;
        self.current = self.element_depth - 1;
    }

    fn read_string_value(&mut self, first_chunk: bool) -> Result<bool, ReaderError> {
        match self.scan_string()? {
            Scanned::Closed { len: 0, .. } => self.end_element(),
            Scanned::Closed {
                offset,
                len,
                escaped,
            } => {
                let kind = if first_chunk {
                    NodeKind::AtomicText
                } else {
                    NodeKind::ComplexText
                };
                self.emit_text(kind, ValueHandle::slice(offset, len, escaped), Next::EndCurrent);
            }
            Scanned::Cut {
                offset,
                len,
                escaped,
            } => self.emit_text(
                NodeKind::ComplexText,
                ValueHandle::slice(offset, len, escaped),
                Next::ComplexText(ComplexTextMode::QuotedText),
            ),
        }
        Ok(true)
    }

    /// Scans string content. The cursor is just past the opening quote, or
    /// at the start of the next chunk of a cut string.
    fn scan_string(&mut self) -> Result<Scanned, ReaderError> {
        let start = self.window.offset();
        let mut escaped = false;
        let mut non_ascii = false;
        loop {
            let available = self.window.available();
            let found = memchr::memchr2(b'"', b'\\', available);
            let run = &available[..found.unwrap_or(available.len())];
            if let Some(i) = run.iter().position(|&b| b < 0x20) {
                let control = run[i];
                self.window.skip(i);
                return Err(self.error(SyntaxError::UnexpectedCharacter(control)));
            }
            non_ascii |= !run.is_ascii();
            let stop = found.map(|i| available[i]);
            let run_len = run.len();
            self.window.skip(run_len);

            match stop {
                Some(b'"') => {
                    let len = self.window.offset() - start;
                    if non_ascii && std::str::from_utf8(self.window.slice(start, len)).is_err() {
                        return Err(self.error(SyntaxError::InvalidUtf8));
                    }
                    self.window.skip(1);
                    return Ok(Scanned::Closed {
                        offset: start,
                        len,
                        escaped,
                    });
                }
                Some(_) => {
                    escaped = true;
                    match self.scan_escape_at_cursor()? {
                        Some(len) => self.window.skip(len),
                        None => return self.cut_string(start, escaped, non_ascii),
                    }
                }
                None => match self.window.try_ensure(1)? {
                    Fill::Ready => {}
                    Fill::Eof => return Err(self.eof()),
                    Fill::WindowFull => return self.cut_string(start, escaped, non_ascii),
                },
            }
        }
    }

    /// Validates the escape under the cursor. `None` when it reaches past
    /// the window ceiling.
    fn scan_escape_at_cursor(&mut self) -> Result<Option<usize>, ReaderError> {
        let mut needed = 2;
        loop {
            let fill = self.window.try_ensure(needed)?;
            match scan_escape(self.window.available()) {
                EscapeScan::Complete(len) => return Ok(Some(len)),
                EscapeScan::Invalid(e) => return Err(self.error(e)),
                EscapeScan::NeedMore(n) => match fill {
                    Fill::Ready => needed = n,
                    Fill::Eof => return Err(self.eof()),
                    Fill::WindowFull => return Ok(None),
                },
            }
        }
    }

    /// Ends a chunk of string content at the cursor, backing up over a
    /// partial UTF-8 sequence.
    fn cut_string(
        &mut self,
        start: usize,
        escaped: bool,
        non_ascii: bool,
    ) -> Result<Scanned, ReaderError> {
        let mut len = self.window.offset() - start;
        if non_ascii {
            match std::str::from_utf8(self.window.slice(start, len)) {
                Ok(_) => {}
                Err(e) if e.error_len().is_none() => {
                    let keep = e.valid_up_to();
                    self.window.unread(len - keep);
                    len = keep;
                }
                Err(_) => return Err(self.error(SyntaxError::InvalidUtf8)),
            }
        }
        if len == 0 {
            return Err(self.window.window_error());
        }
        Ok(Scanned::Cut {
            offset: start,
            len,
            escaped,
        })
    }

    fn read_number_value(&mut self, first_chunk: bool) -> Result<bool, ReaderError> {
        let start = self.window.offset();
        loop {
            let available = self.window.available();
            let consumed = self.number.scan(available);
            let stop = available.get(consumed).copied();
            self.window.skip(consumed);

            if let Some(b) = stop {
                if !self.number.is_accepting() || !is_delimiter(b) {
                    return Err(self.error(SyntaxError::UnexpectedCharacter(b)));
                }
                break;
            }
            match self.window.try_ensure(1)? {
                Fill::Ready => {}
                Fill::Eof if self.number.is_accepting() => break,
                Fill::Eof => return Err(self.eof()),
                Fill::WindowFull => {
                    let len = self.window.offset() - start;
                    if len == 0 {
                        return Err(self.window.window_error());
                    }
                    self.emit_text(
                        NodeKind::ComplexText,
                        ValueHandle::slice(start, len, false),
                        Next::ComplexText(ComplexTextMode::NumericalText),
                    );
                    return Ok(true);
                }
            }
        }

        let len = self.window.offset() - start;
        if len == 0 {
            // The previous chunk ended exactly at the end of the literal.
            self.end_element();
        } else if first_chunk {
            let value = self.number_handle(start, len);
            self.emit_text(NodeKind::AtomicText, value, Next::EndCurrent);
        } else {
            self.emit_text(
                NodeKind::ComplexText,
                ValueHandle::slice(start, len, false),
                Next::EndCurrent,
            );
        }
        Ok(true)
    }

    fn number_handle(&self, start: usize, len: usize) -> ValueHandle {
        let text = self.window.slice(start, len);
        if !self.number.is_integer() {
            return ValueHandle::slice(start, len, false);
        }
        match text {
            b"0" => ValueHandle::SmallInt(0),
            b"1" => ValueHandle::SmallInt(1),
            b"-0" => ValueHandle::slice(start, len, false),
            _ => i64::from_json_text(text)
                .map_or(ValueHandle::slice(start, len, false), ValueHandle::Int64),
        }
    }

    fn read_literal(&mut self, first: u8) -> Result<bool, ReaderError> {
        let mut matcher = ExpectedLiteralBuffer::new(first);
        self.window.skip(1);
        let literal = loop {
            let b = self.window.peek_byte()?.ok_or_else(|| self.eof())?;
            match matcher.step(b) {
                Step::NeedMore => self.window.skip(1),
                Step::Done(literal) => {
                    self.window.skip(1);
                    break literal;
                }
                Step::Reject => return Err(self.error(SyntaxError::UnexpectedCharacter(b))),
            }
        };
        if self.window.try_ensure(1)? == Fill::Ready {
            let b = self.window.available()[0];
            if !is_delimiter(b) {
                return Err(self.error(SyntaxError::UnexpectedCharacter(b)));
            }
        }
        match literal {
            Literal::Null => self.end_element(),
            Literal::True => {
                self.emit_text(NodeKind::AtomicText, ValueHandle::Bool(true), Next::EndCurrent);
            }
            Literal::False => {
                self.emit_text(NodeKind::AtomicText, ValueHandle::Bool(false), Next::EndCurrent);
            }
        }
        Ok(true)
    }

    /// The kind of the current node.
    pub fn node_kind(&self) -> NodeKind {
        self.kind
    }

    /// The public classification of the current node.
    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    /// Where the reader is in its lifecycle.
    pub fn read_state(&self) -> ReadState {
        if self.faulted {
            return ReadState::Error;
        }
        match self.kind {
            NodeKind::Initial => ReadState::Initial,
            NodeKind::EndOfFile => ReadState::EndOfFile,
            NodeKind::Closed => ReadState::Closed,
            _ => ReadState::Interactive,
        }
    }

    /// Nesting depth of the current node. The root element has depth 0,
    /// its attributes and text have depth 1.
    pub fn depth(&self) -> usize {
        match self.kind {
            NodeKind::Initial | NodeKind::EndOfFile | NodeKind::Closed => 0,
            kind => self.current + kind.caps().depth_delta,
        }
    }

    /// Name of the current element or attribute, empty for other nodes.
    pub fn local_name(&self) -> Cow<'_, str> {
        match self.kind {
            NodeKind::Element | NodeKind::EndElement => {
                let element = &self.elements[self.current];
                element.name.resolve(self.window.bytes(), &element.detached)
            }
            NodeKind::Attribute => Cow::Borrowed(ATTRIBUTE_NAMES[self.attribute].as_str()),
            _ => Cow::Borrowed(""),
        }
    }

    /// The decoded value of the current text or attribute node.
    pub fn value(&self) -> Cow<'_, str> {
        match self.kind {
            NodeKind::Attribute | NodeKind::AttributeText => self.attribute_value(self.attribute),
            kind if kind.caps().has_value => self.value.resolve(self.window.bytes()),
            _ => Cow::Borrowed(""),
        }
    }

    /// Whether [`Self::value`] has text for the current node.
    pub fn has_value(&self) -> bool {
        self.kind.caps().has_value
    }

    /// Always `false`: every element has an explicit end element node.
    pub fn is_empty_element(&self) -> bool {
        false
    }

    /// JSON type of the element the current node belongs to.
    pub fn json_type(&self) -> Option<JsonType> {
        match self.kind {
            NodeKind::Initial | NodeKind::EndOfFile | NodeKind::Closed => None,
            _ => Some(self.elements[self.current].json_type),
        }
    }

    fn on_element(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Element | NodeKind::Attribute | NodeKind::AttributeText
        )
    }

    fn attribute_value(&self, index: usize) -> Cow<'_, str> {
        let element = &self.elements[self.current];
        let handle = if index == 0 {
            ValueHandle::Constant(element.json_type)
        } else {
            element.server_type
        };
        handle.resolve(self.window.bytes())
    }

    fn attribute_index(&self, name: &str) -> Option<usize> {
        ATTRIBUTE_NAMES[..self.attribute_count()]
            .iter()
            .position(|attribute| attribute.as_str() == name)
    }

    /// `type`, plus `__type` when the object declared one.
    pub fn attribute_count(&self) -> usize {
        if !self.on_element() {
            return 0;
        }
        1 + usize::from(!self.elements[self.current].server_type.is_empty())
    }

    /// The value of attribute `name` on the current element.
    pub fn get_attribute(&self, name: &str) -> Option<Cow<'_, str>> {
        self.attribute_index(name)
            .map(|index| self.attribute_value(index))
    }

    /// The value of the attribute at `index`, `type` first.
    pub fn get_attribute_at(&self, index: usize) -> Option<Cow<'_, str>> {
        (index < self.attribute_count()).then(|| self.attribute_value(index))
    }

    /// Moves onto attribute `name`. Returns `false` and stays put when
    /// there is none.
    pub fn move_to_attribute(&mut self, name: &str) -> bool {
        match self.attribute_index(name) {
            Some(index) => self.move_to_attribute_at(index),
            None => false,
        }
    }

    /// Moves onto the attribute at `index`.
    pub fn move_to_attribute_at(&mut self, index: usize) -> bool {
        if index >= self.attribute_count() {
            return false;
        }
        self.attribute = index;
        self.kind = NodeKind::Attribute;
        true
    }

    /// Moves onto `type`.
    pub fn move_to_first_attribute(&mut self) -> bool {
        self.move_to_attribute_at(0)
    }

    /// From an element moves onto its first attribute, from an attribute
    /// onto the next one.
    pub fn move_to_next_attribute(&mut self) -> bool {
        match self.kind {
            NodeKind::Element => self.move_to_attribute_at(0),
            NodeKind::Attribute | NodeKind::AttributeText => {
                self.move_to_attribute_at(self.attribute + 1)
            }
            _ => false,
        }
    }

    /// Returns from an attribute to its element.
    pub fn move_to_element(&mut self) -> bool {
        if !self.kind.is_attribute() {
            return false;
        }
        self.kind = NodeKind::Element;
        true
    }

    /// Steps from an attribute onto its text.
    pub fn read_attribute_value(&mut self) -> bool {
        if self.kind != NodeKind::Attribute {
            return false;
        }
        self.kind = NodeKind::AttributeText;
        true
    }

    /// Parses the value of the current node as `T`.
    ///
    /// # Errors
    ///
    /// A [`ConvertError`](crate::ConvertError) when the text does not
    /// parse. The reader stays usable.
    pub fn value_as<T: FromJsonText>(&self) -> Result<T, ReaderError> {
        T::from_json_text(self.value().as_bytes()).map_err(|e| self.error(e))
    }

    /// The handle of the current text node, if it holds a lexed value.
    fn text_handle(&self) -> ValueHandle {
        if self.kind.is_text() {
            self.value
        } else {
            ValueHandle::Empty
        }
    }

    /// The current value as a boolean.
    ///
    /// # Errors
    ///
    /// A conversion error when the text is not `true` or `false`.
    pub fn as_bool(&self) -> Result<bool, ReaderError> {
        match self.text_handle().as_bool() {
            Some(b) => Ok(b),
            None => self.value_as(),
        }
    }

    /// The current value as an `i32`. Integers lexed by the reader are
    /// not parsed again.
    pub fn as_i32(&self) -> Result<i32, ReaderError> {
        match self.text_handle().as_i64().map(i32::try_from) {
            Some(Ok(n)) => Ok(n),
            _ => self.value_as(),
        }
    }

    /// The current value as an `i64`.
    pub fn as_i64(&self) -> Result<i64, ReaderError> {
        match self.text_handle().as_i64() {
            Some(n) => Ok(n),
            None => self.value_as(),
        }
    }

    /// The current value as a `u64`.
    pub fn as_u64(&self) -> Result<u64, ReaderError> {
        match self.text_handle().as_i64().map(u64::try_from) {
            Some(Ok(n)) => Ok(n),
            _ => self.value_as(),
        }
    }

    /// The current value as an `f32`. `INF`, `-INF` and `NaN` are
    /// accepted.
    pub fn as_f32(&self) -> Result<f32, ReaderError> {
        self.value_as()
    }

    /// The current value as an `f64`.
    pub fn as_f64(&self) -> Result<f64, ReaderError> {
        self.value_as()
    }

    /// The current value as a [`Decimal`], keeping its scale.
    pub fn as_decimal(&self) -> Result<Decimal, ReaderError> {
        match self.text_handle().as_i64() {
            Some(n) => Ok(Decimal::from(n)),
            None => self.value_as(),
        }
    }

    /// The current value as a [`DateTime`].
    pub fn as_datetime(&self) -> Result<DateTime, ReaderError> {
        self.value_as()
    }

    /// The current value as a [`TimeSpan`].
    pub fn as_timespan(&self) -> Result<TimeSpan, ReaderError> {
        self.value_as()
    }

    /// The current value as a GUID.
    pub fn as_guid(&self) -> Result<uuid::Uuid, ReaderError> {
        self.value_as()
    }

    /// The current value as a [`UniqueId`].
    pub fn as_unique_id(&self) -> Result<UniqueId, ReaderError> {
        self.value_as()
    }

    /// Decodes the value as standard base64.
    pub fn as_bytes(&self) -> Result<Vec<u8>, ReaderError> {
        self.value_as()
    }

    /// The current value, decoded.
    pub fn as_string(&self) -> String {
        self.value().into_owned()
    }

    /// Skips whitespace and comment nodes and returns the type of the node
    /// the reader stops on. An attribute moves back to its element.
    pub fn move_to_content(&mut self) -> Result<NodeType, ReaderError> {
        self.move_to_element();
        loop {
            match self.kind {
                NodeKind::Element
                | NodeKind::EndElement
                | NodeKind::AtomicText
                | NodeKind::ComplexText
                | NodeKind::CData
                | NodeKind::EndOfFile
                | NodeKind::Closed => return Ok(self.node_type()),
                _ => {
                    if !self.read_next()? {
                        return Ok(self.node_type());
                    }
                }
            }
        }
    }

    /// Whether the reader, after [`Self::move_to_content`], is on an element
    /// named `name` (or any element for `None`).
    pub fn is_start_element(&mut self, name: Option<&str>) -> Result<bool, ReaderError> {
        Ok(self.move_to_content()? == NodeType::Element
            && name.is_none_or(|name| self.current_name_equals(name)))
    }

    fn current_name_equals(&self, name: &str) -> bool {
        let element = &self.elements[self.current];
        element
            .name
            .equals(self.window.bytes(), &element.detached, name)
    }

    /// Consumes a start element, optionally checking its name.
    pub fn read_start_element(&mut self, name: Option<&str>) -> Result<(), ReaderError> {
        if !self.is_start_element(name)? {
            return Err(self.invalid_operation("the reader is not on the expected start element"));
        }
        self.read_next()?;
        Ok(())
    }

    /// Consumes an end element.
    ///
    /// # Errors
    ///
    /// [`ErrorSource::InvalidOperation`] when the reader is on anything else.
    pub fn read_end_element(&mut self) -> Result<(), ReaderError> {
        if self.move_to_content()? != NodeType::EndElement {
            return Err(self.invalid_operation("the reader is not on an end element"));
        }
        self.read_next()?;
        Ok(())
    }

    /// Concatenates consecutive text nodes starting at the current node and
    /// stops on the first node that is not text.
    ///
    /// # Errors
    ///
    /// [`QuotaError::MaxStringContentLengthExceeded`] when the text grows
    /// past [`ReaderQuotas::max_string_content_length`].
    pub fn read_content_as_string(&mut self) -> Result<String, ReaderError> {
        let limit = self.quotas.max_string_content_length;
        let mut out = String::new();
        if self.kind.is_attribute() {
            out.push_str(&self.value());
        } else {
            while self.kind.is_text() || self.kind == NodeKind::Comment {
                if !self.kind.caps().skip_value_on_read {
                    let value = self.value();
                    if out.len() + value.len() > limit {
                        return Err(self.error(QuotaError::MaxStringContentLengthExceeded(limit)));
                    }
                    out.push_str(&value);
                }
                if !self.read_next()? {
                    break;
                }
            }
        }
        if out.len() > limit {
            return Err(self.error(QuotaError::MaxStringContentLengthExceeded(limit)));
        }
        Ok(out)
    }

    /// Reads the text of a simple element and moves past its end element.
    pub fn read_element_content_as_string(&mut self) -> Result<String, ReaderError> {
        if self.move_to_content()? != NodeType::Element {
            return Err(self.invalid_operation("the reader is not on a start element"));
        }
        self.read_next()?;
        let text = self.read_content_as_string()?;
        if self.kind != NodeKind::EndElement {
            return Err(self.invalid_operation("the element has child elements"));
        }
        self.read_next()?;
        Ok(text)
    }

    /// Reads the text of a simple element as `T` and moves past its end
    /// element.
    pub fn read_element_content_as<T: FromJsonText>(&mut self) -> Result<T, ReaderError> {
        let text = self.read_element_content_as_string()?;
        T::from_json_text(text.as_bytes()).map_err(|e| self.error(e))
    }

    /// Moves past the current node. On an element, skips its whole subtree
    /// including the matching end element.
    pub fn skip(&mut self) -> Result<(), ReaderError> {
        self.move_to_element();
        if self.kind == NodeKind::Element {
            let depth = self.depth();
            while self.read_next()? {
                if self.kind == NodeKind::EndElement && self.depth() == depth {
                    break;
                }
            }
        }
        self.read_next()?;
        Ok(())
    }

    /// Starts over on a new stream, keeping the allocated buffers.
    pub fn reset(&mut self, stream: R) {
        self.window.reset(stream);
        self.scopes.clear();
        self.element_depth = 0;
        self.current = 0;
        self.attribute = 0;
        self.kind = NodeKind::Initial;
        self.next = Next::Root;
        self.value = ValueHandle::Empty;
        self.after_separator = false;
        self.staged_name = false;
        self.faulted = false;
        debug!("reader reset");
    }

    /// Releases the stream. Every further read returns `false`.
    pub fn close(&mut self) {
        self.window.close();
        self.scopes.clear();
        self.element_depth = 0;
        self.current = 0;
        self.kind = NodeKind::Closed;
        self.next = Next::Done;
        self.value = ValueHandle::Empty;
        self.faulted = false;
        debug!("reader closed");
    }

    /// Replaces the deadline checked before each refill.
    pub fn set_deadline(&mut self, deadline: Option<Instant>) {
        self.window.set_deadline(deadline);
    }

    /// The quotas in effect.
    pub fn quotas(&self) -> &ReaderQuotas {
        &self.quotas
    }

    /// Number of open syntactic scopes, exposed for fuzzing invariants.
    #[cfg(feature = "fuzzing")]
    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }
}
