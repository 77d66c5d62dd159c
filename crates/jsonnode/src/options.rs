use std::time::Instant;

/// The smallest window a reader accepts. Every escape sequence (a surrogate
/// pair spells 12 bytes) must fit into one window.
pub const MIN_BYTES_PER_READ: usize = 16;

/// Limits enforced while reading a document.
///
/// Exceeding any of them fails the read with a
/// [`QuotaError`](crate::QuotaError), which callers can use to reject
/// oversized payloads.
///
/// # Examples
///
/// ```rust
/// use jsonnode::{JsonNodeReader, ReaderOptions, ReaderQuotas};
///
/// let options = ReaderOptions {
///     quotas: ReaderQuotas {
///         max_depth: 8,
///         ..Default::default()
///     },
///     ..Default::default()
/// };
/// let reader = JsonNodeReader::with_options(&b"{}"[..], options);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderQuotas {
    /// Maximum number of nested elements, the implicit `root` element
    /// included.
    ///
    /// # Default
    ///
    /// `32`
    pub max_depth: usize,

    /// Maximum number of bytes a single node may span in the input.
    ///
    /// Member names must fit into one window. String and number values that
    /// do not fit are reported as a sequence of complex text nodes. Values
    /// below [`MIN_BYTES_PER_READ`] are raised to it.
    ///
    /// # Default
    ///
    /// `4096`
    pub max_bytes_per_read: usize,

    /// Maximum length, in bytes, of the text accumulated by
    /// `read_content_as_string` and the `read_element_content_as*` family.
    ///
    /// # Default
    ///
    /// `8192`
    pub max_string_content_length: usize,
}

impl ReaderQuotas {
    /// Quotas that never trigger.
    #[must_use]
    pub const fn max() -> Self {
        Self {
            max_depth: usize::MAX,
            max_bytes_per_read: usize::MAX,
            max_string_content_length: usize::MAX,
        }
    }
}

impl Default for ReaderQuotas {
    fn default() -> Self {
        Self {
            max_depth: 32,
            max_bytes_per_read: 4096,
            max_string_content_length: 8192,
        }
    }
}

/// Configuration of a [`JsonNodeReader`](crate::JsonNodeReader).
#[derive(Debug, Clone, Copy, Default)]
pub struct ReaderOptions {
    /// Size limits, see [`ReaderQuotas`].
    pub quotas: ReaderQuotas,

    /// Point in time after which blocking reads on the backing stream are
    /// refused with [`ErrorSource::DeadlineExceeded`](crate::ErrorSource).
    ///
    /// The deadline is only checked before a read on the stream is issued;
    /// parsing bytes that are already buffered never fails because of it.
    ///
    /// # Default
    ///
    /// `None`
    pub deadline: Option<Instant>,
}

/// Configuration of a [`JsonNodeWriter`](crate::JsonNodeWriter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    /// Whether `/` is written as `\/`.
    ///
    /// # Default
    ///
    /// `true`
    pub escape_solidus: bool,

    /// Number of encoded bytes collected before they are handed to the sink.
    ///
    /// # Default
    ///
    /// `512`
    pub buffer_capacity: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            escape_solidus: true,
            buffer_capacity: 512,
        }
    }
}
