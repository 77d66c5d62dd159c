use std::io;

use bstr::BStr;
use thiserror::Error;

use crate::json_type::JsonType;

/// An error raised by [`JsonNodeReader`](crate::JsonNodeReader).
///
/// Grammar, quota and I/O errors are fatal for the document: the reader is
/// left faulted and every further read reports [`ErrorSource::Faulted`].
#[derive(Error, Debug)]
#[error("{source} at byte {position}")]
pub struct ReaderError {
    pub(crate) source: ErrorSource,
    pub(crate) position: u64,
}

impl ReaderError {
    pub(crate) fn new(source: impl Into<ErrorSource>, position: u64) -> Self {
        Self {
            source: source.into(),
            position,
        }
    }

    /// What went wrong.
    #[must_use]
    pub fn kind(&self) -> &ErrorSource {
        &self.source
    }

    /// Absolute offset in the input stream at which the error was detected.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Consumes the error and returns its source.
    #[must_use]
    pub fn into_source(self) -> ErrorSource {
        self.source
    }

    /// Returns `true` for malformed input.
    #[must_use]
    pub fn is_syntax(&self) -> bool {
        matches!(self.source, ErrorSource::Syntax(_))
    }

    /// Returns `true` when a configured [`ReaderQuotas`](crate::ReaderQuotas)
    /// limit was hit.
    #[must_use]
    pub fn is_quota(&self) -> bool {
        matches!(self.source, ErrorSource::Quota(_))
    }

    /// Returns `true` when the backing stream failed.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self.source, ErrorSource::Io(_))
    }

    pub(crate) fn is_fatal(&self) -> bool {
        !matches!(
            self.source,
            ErrorSource::Conversion(_) | ErrorSource::InvalidOperation(_)
        )
    }
}

/// The cause of a [`ReaderError`].
#[derive(Error, Debug)]
pub enum ErrorSource {
    /// Malformed input.
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    /// A configured limit was hit.
    #[error("quota exceeded: {0}")]
    Quota(#[from] QuotaError),
    /// The stream failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// A typed accessor could not convert the current value.
    #[error("conversion error: {0}")]
    Conversion(#[from] ConvertError),
    /// A navigation call that does not apply to the current node.
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),
    /// The deadline passed before the stream produced data.
    #[error("deadline exceeded while waiting for input")]
    DeadlineExceeded,
    /// An earlier fatal error stopped the reader.
    #[error("the reader was faulted by an earlier error")]
    Faulted,
}

/// Input that is not a well-formed JSON document.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    /// A byte that cannot start or continue the current token.
    #[error("unexpected character {:?}", BStr::new(core::slice::from_ref(.0)))]
    UnexpectedCharacter(u8),
    /// A separator was required here.
    #[error("expected {:?} but found {}", BStr::new(core::slice::from_ref(.expected)), found_display(*.found))]
    TokenExpected {
        /// The separator.
        expected: u8,
        /// The byte found instead, `None` at the end of input.
        found: Option<u8>,
    },
    /// A `\u` escape that is not four hex digits, or a lone low surrogate.
    #[error("invalid character reference {0:?}")]
    InvalidCharacterReference(String),
    /// A high surrogate escape without a low surrogate escape after it.
    #[error("high surrogate \\u{0:04X} is not followed by a low surrogate")]
    InvalidLowSurrogate(u32),
    /// The input ended inside a value.
    #[error("unexpected end of input")]
    UnexpectedEndOfFile,
    /// Non-whitespace after the root value.
    #[error("a JSON document can only contain one root value")]
    MultipleRootElementsNotAllowed,
    /// String content that is not valid UTF-8.
    #[error("string contains invalid UTF-8")]
    InvalidUtf8,
}

fn found_display(found: Option<u8>) -> String {
    match found {
        Some(b) => format!("{:?}", BStr::new(core::slice::from_ref(&b))),
        None => "end of input".into(),
    }
}

/// A [`ReaderQuotas`](crate::ReaderQuotas) limit, with the configured value.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QuotaError {
    /// [`ReaderQuotas::max_depth`](crate::ReaderQuotas::max_depth).
    #[error("maximum nesting depth of {0} exceeded")]
    MaxDepthExceeded(usize),
    /// [`ReaderQuotas::max_bytes_per_read`](crate::ReaderQuotas::max_bytes_per_read).
    #[error("maximum of {0} bytes per read exceeded")]
    MaxBytesPerReadExceeded(usize),
    /// [`ReaderQuotas::max_string_content_length`](crate::ReaderQuotas::max_string_content_length).
    #[error("maximum string content length of {0} exceeded")]
    MaxStringContentLengthExceeded(usize),
}

/// A text value that could not be converted to the requested type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// The text does not have the target's syntax.
    #[error("{text:?} is not a valid {target}")]
    Invalid {
        /// Name of the target type.
        target: &'static str,
        /// The rejected text.
        text: String,
    },
    /// The text parses but does not fit the target.
    #[error("{text:?} is out of range for {target}")]
    Overflow {
        /// Name of the target type.
        target: &'static str,
        /// The rejected text.
        text: String,
    },
}

impl ConvertError {
    pub(crate) fn invalid(target: &'static str, text: &[u8]) -> Self {
        Self::Invalid {
            target,
            text: String::from_utf8_lossy(text).into_owned(),
        }
    }

    pub(crate) fn overflow(target: &'static str, text: &[u8]) -> Self {
        Self::Overflow {
            target,
            text: String::from_utf8_lossy(text).into_owned(),
        }
    }
}

/// An error raised by [`JsonNodeWriter`](crate::JsonNodeWriter). Every error
/// except [`WriterError::Reader`] leaves the writer faulted.
#[derive(Error, Debug)]
pub enum WriterError {
    /// The sink failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// The reader given to `write_node` failed. Does not fault the writer.
    #[error("reading the source node failed: {0}")]
    Reader(#[from] ReaderError),
    /// The first element was not named `root`.
    #[error("the root element must be named \"root\", found {0:?}")]
    InvalidRootElementName(String),
    /// A second element after the root was closed.
    #[error("a JSON document can only contain one root element")]
    MultipleRootElements,
    /// `end_element` without a matching `start_element`.
    #[error("end_element called with no open elements")]
    EndElementNoOpenNodes,
    /// Only `type`, `__type` and `item` are understood.
    #[error("unknown attribute {0:?}")]
    UnknownAttribute(String),
    /// The same attribute written twice on one element.
    #[error("attribute {0:?} was written twice")]
    DuplicateAttribute(String),
    /// A `type` attribute that is not one of the six JSON types.
    #[error("{0:?} is not a valid value for the type attribute")]
    InvalidTypeAttribute(String),
    /// An attribute written after the element's first content.
    #[error("attribute {0:?} was written after the element content started")]
    AttributeAfterContent(String),
    /// Text inside an object or array.
    #[error("text is not allowed inside an element of type {0}")]
    TextNotAllowed(JsonType),
    /// Text before the root element or after it was closed.
    #[error("text is not allowed outside the root element")]
    TextOutsideElement,
    /// A child element inside a scalar element.
    #[error("child elements are not allowed inside an element of type {0}")]
    ElementNotAllowed(JsonType),
    /// A child of an array not named `item`.
    #[error("array items must be named \"item\", found {0:?}")]
    InvalidArrayItemName(String),
    /// Text of a `number` element that is not a JSON number.
    #[error("{0:?} is not a valid JSON number")]
    InvalidNumber(String),
    /// Text of a `boolean` element other than `true` or `false`.
    #[error("{0:?} is not a valid JSON boolean")]
    InvalidBoolean(String),
    /// Content inside a `null` element.
    #[error("elements of type null cannot have content")]
    ContentInNullElement,
    /// `__type` on an element that is not an object.
    #[error("the __type attribute is only allowed on object elements, found {0}")]
    ServerTypeNotAllowed(JsonType),
    /// `close` was called with elements still open.
    #[error("{0} element(s) are still open")]
    UnclosedElements(usize),
    /// The writer was already closed.
    #[error("the writer is closed")]
    WriterClosed,
    /// An earlier error stopped the writer.
    #[error("the writer was faulted by an earlier error")]
    Faulted,
}
