//! The four tracked aspects of an item.

use crate::{DepsError, DepsResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four aspects of an item that a dependent can rely on.
///
/// The set is closed. Variant order is the canonical order used by the
/// compact textual form of [`DependencyProps`](crate::DependencyProps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    /// The unprocessed source content.
    RawContent,
    /// The item's attributes (front matter, metadata).
    Attributes,
    /// The output produced by compiling the item.
    CompiledContent,
    /// The output path the item is written to.
    Path,
}

impl Facet {
    /// All facets in canonical order.
    pub const ALL: [Facet; 4] = [
        Facet::RawContent,
        Facet::Attributes,
        Facet::CompiledContent,
        Facet::Path,
    ];

    /// Configuration key naming this facet.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Facet::RawContent => "raw_content",
            Facet::Attributes => "attributes",
            Facet::CompiledContent => "compiled_content",
            Facet::Path => "path",
        }
    }

    /// Letter shown in the compact textual form when the facet is active.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Facet::RawContent => 'r',
            Facet::Attributes => 'a',
            Facet::CompiledContent => 'c',
            Facet::Path => 'p',
        }
    }

    /// Whether reliance on this facet can be restricted to sub-identifiers.
    #[must_use]
    pub const fn supports_partial(self) -> bool {
        matches!(self, Facet::RawContent | Facet::Attributes)
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Facet {
    type Err = DepsError;

    fn from_str(s: &str) -> DepsResult<Self> {
        Facet::ALL
            .into_iter()
            .find(|facet| facet.name() == s)
            .ok_or_else(|| DepsError::InvalidDescriptor(format!("unknown facet `{s}`")))
    }
}
