//! The node model exposed by [`JsonNodeReader`](crate::JsonNodeReader).

use std::fmt;

/// What the reader is positioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Before the first `read_next`.
    Initial,
    /// The start of an element.
    Element,
    /// The end of an element.
    EndElement,
    /// The `type` or `__type` attribute.
    Attribute,
    /// The text of an attribute.
    AttributeText,
    /// A value that fit into one window.
    AtomicText,
    /// One chunk of a value that spans several windows.
    ComplexText,
    /// Insignificant whitespace. JSON input never produces it.
    Whitespace,
    /// Never produced by JSON input.
    Comment,
    /// Never produced by JSON input.
    CData,
    /// Past the end of the document.
    EndOfFile,
    /// After `close`.
    Closed,
}

/// Fixed capabilities of a [`NodeKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct NodeCaps {
    /// Attributes of the owning element can be read.
    pub can_get_attribute: bool,
    /// `move_to_element` leads back to the owning element.
    pub can_move_to_element: bool,
    /// `value` returns text.
    pub has_value: bool,
    /// The value is complete in this one node.
    pub is_atomic_value: bool,
    /// Content reads pass over the node without collecting its value.
    pub skip_value_on_read: bool,
    /// Stops `move_to_content`.
    pub has_content: bool,
    /// Added to the depth of the owning element.
    pub depth_delta: usize,
}

impl NodeCaps {
    const NONE: NodeCaps = NodeCaps {
        can_get_attribute: false,
        can_move_to_element: false,
        has_value: false,
        is_atomic_value: false,
        skip_value_on_read: false,
        has_content: false,
        depth_delta: 0,
    };

    const TEXT: NodeCaps = NodeCaps {
        has_value: true,
        has_content: true,
        depth_delta: 1,
        ..NodeCaps::NONE
    };

    const ATTRIBUTE: NodeCaps = NodeCaps {
        can_get_attribute: true,
        can_move_to_element: true,
        has_value: true,
        is_atomic_value: true,
        depth_delta: 1,
        ..NodeCaps::NONE
    };
}

impl NodeKind {
    /// The capabilities of this kind.
    #[must_use]
    pub const fn caps(self) -> NodeCaps {
        match self {
            NodeKind::Initial | NodeKind::EndOfFile | NodeKind::Closed => NodeCaps::NONE,
            NodeKind::Element => NodeCaps {
                can_get_attribute: true,
                has_content: true,
                ..NodeCaps::NONE
            },
            NodeKind::EndElement => NodeCaps {
                has_content: true,
                ..NodeCaps::NONE
            },
            NodeKind::Attribute | NodeKind::AttributeText => NodeCaps::ATTRIBUTE,
            NodeKind::AtomicText => NodeCaps {
                is_atomic_value: true,
                ..NodeCaps::TEXT
            },
            NodeKind::ComplexText | NodeKind::CData => NodeCaps::TEXT,
            NodeKind::Whitespace => NodeCaps {
                is_atomic_value: true,
                ..NodeCaps::TEXT
            },
            NodeKind::Comment => NodeCaps {
                skip_value_on_read: true,
                has_content: false,
                ..NodeCaps::TEXT
            },
        }
    }

    /// The public [`NodeType`] of this kind.
    #[must_use]
    pub const fn node_type(self) -> NodeType {
        match self {
            NodeKind::Initial | NodeKind::EndOfFile | NodeKind::Closed => NodeType::None,
            NodeKind::Element => NodeType::Element,
            NodeKind::EndElement => NodeType::EndElement,
            NodeKind::Attribute => NodeType::Attribute,
            NodeKind::AttributeText | NodeKind::AtomicText | NodeKind::ComplexText => {
                NodeType::Text
            }
            NodeKind::Whitespace => NodeType::Whitespace,
            NodeKind::Comment => NodeType::Comment,
            NodeKind::CData => NodeType::CData,
        }
    }

    pub(crate) const fn is_attribute(self) -> bool {
        matches!(self, NodeKind::Attribute | NodeKind::AttributeText)
    }

    pub(crate) const fn is_text(self) -> bool {
        matches!(
            self,
            NodeKind::AtomicText | NodeKind::ComplexText | NodeKind::Whitespace | NodeKind::CData
        )
    }
}

/// Public classification of the current node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeType {
    /// No current node.
    None,
    /// A start element.
    Element,
    /// An end element.
    EndElement,
    /// An attribute.
    Attribute,
    /// Attribute text or a value.
    Text,
    /// Insignificant whitespace.
    Whitespace,
    /// A comment.
    Comment,
    /// A CDATA section.
    CData,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Lifecycle of a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReadState {
    /// `read_next` was not called yet.
    Initial,
    /// Positioned on a node.
    Interactive,
    /// The document was read to its end.
    EndOfFile,
    /// `close` was called.
    Closed,
    /// A fatal error occurred.
    Error,
}
