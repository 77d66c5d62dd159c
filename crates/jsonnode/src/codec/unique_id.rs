use core::{fmt, str::FromStr};

use uuid::Uuid;

use super::{FromJsonText, ToJsonText, trim_xml_whitespace};
use crate::ConvertError;

const URN_PREFIX: &str = "urn:uuid:";

/// An identifier that is either a GUID, written as `urn:uuid:<guid>`, or an
/// arbitrary non-empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniqueId(Repr);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Repr {
    Guid(Uuid),
    Text(Box<str>),
}

impl UniqueId {
    /// An id backed by a GUID.
    #[must_use]
    pub fn from_guid(guid: Uuid) -> Self {
        Self(Repr::Guid(guid))
    }

    /// Wraps `text`, recognizing the `urn:uuid:` form.
    ///
    /// # Errors
    ///
    /// Fails for the empty string.
    pub fn new(text: &str) -> Result<Self, ConvertError> {
        Self::from_json_text(text.as_bytes())
    }

    /// The GUID, when the id holds one.
    #[must_use]
    pub fn as_guid(&self) -> Option<Uuid> {
        match self.0 {
            Repr::Guid(guid) => Some(guid),
            Repr::Text(_) => None,
        }
    }
}

impl From<Uuid> for UniqueId {
    fn from(guid: Uuid) -> Self {
        Self::from_guid(guid)
    }
}

impl FromJsonText for UniqueId {
    const TARGET: &'static str = "unique id";

    fn from_json_text(text: &[u8]) -> Result<Self, ConvertError> {
        let invalid = || ConvertError::invalid(Self::TARGET, text);
        let text = core::str::from_utf8(text).map_err(|_| invalid())?;
        if text.is_empty() {
            return Err(invalid());
        }
        let trimmed = trim_xml_whitespace(text.as_bytes());
        if let Some(guid) = trimmed.strip_prefix(URN_PREFIX.as_bytes()) {
            if let Ok(guid) = Uuid::try_parse_ascii(guid) {
                return Ok(Self(Repr::Guid(guid)));
            }
        }
        Ok(Self(Repr::Text(text.into())))
    }
}

impl ToJsonText for UniqueId {
    fn append_json_text(&self, out: &mut String) {
        match &self.0 {
            Repr::Guid(guid) => {
                out.push_str(URN_PREFIX);
                guid.append_json_text(out);
            }
            Repr::Text(text) => out.push_str(text),
        }
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json_text())
    }
}

impl FromStr for UniqueId {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
