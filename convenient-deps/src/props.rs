//! Dependency descriptors and their merge algebra.
//!
//! A [`DependencyProps`] records which facets of a source item a dependent
//! relies on. Two observations of the same reliance combine with
//! [`DependencyProps::merge`], which keeps the more permissive state per
//! facet:
//!
//! ```text
//! Inactive < Partial(ids) < Full
//! Partial(a) + Partial(b) = Partial(a ∪ b)
//! ```
//!
//! # Example
//!
//! ```
//! use convenient_deps::{DependencyProps, FacetState};
//!
//! let a = DependencyProps::new().with_attributes(FacetState::partial(["title"]));
//! let b = DependencyProps::new()
//!     .with_attributes(FacetState::partial(["author"]))
//!     .with_compiled_content(true);
//!
//! let merged = a.merge(&b);
//! assert_eq!(merged.to_string(), "_ac_");
//! assert_eq!(merged.attributes().identifiers().map(|ids| ids.len()), Some(2));
//! ```

use crate::{DepsError, DepsResult, Facet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Activeness of a single facet within a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "FacetStateRepr", into = "FacetStateRepr")]
pub enum FacetState {
    /// The facet is not relied upon.
    #[default]
    Inactive,
    /// Any change to the facet is relevant.
    Full,
    /// Only changes touching one of these identifiers are relevant.
    ///
    /// An empty set is a distinct value from [`FacetState::Inactive`] but
    /// answers every activeness query the same way.
    Partial(BTreeSet<String>),
}

impl FacetState {
    /// Build a partial state from any collection of identifiers.
    pub fn partial<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FacetState::Partial(ids.into_iter().map(Into::into).collect())
    }

    /// Full, or partial with at least one identifier.
    #[must_use]
    pub fn is_active(&self) -> bool {
        match self {
            FacetState::Inactive => false,
            FacetState::Full => true,
            FacetState::Partial(ids) => !ids.is_empty(),
        }
    }

    /// Identifiers of a partial state, `None` for inactive and full.
    #[must_use]
    pub fn identifiers(&self) -> Option<&BTreeSet<String>> {
        match self {
            FacetState::Partial(ids) => Some(ids),
            FacetState::Inactive | FacetState::Full => None,
        }
    }

    /// Combine two states, keeping the more permissive one.
    #[must_use]
    pub fn merge(&self, other: &FacetState) -> FacetState {
        match (self, other) {
            (FacetState::Inactive, FacetState::Inactive) => FacetState::Inactive,
            (FacetState::Inactive, FacetState::Partial(ids))
            | (FacetState::Partial(ids), FacetState::Inactive) => FacetState::Partial(ids.clone()),
            (FacetState::Partial(a), FacetState::Partial(b)) => {
                FacetState::Partial(a.union(b).cloned().collect())
            }
            (FacetState::Full, _) | (_, FacetState::Full) => FacetState::Full,
        }
    }
}

impl From<bool> for FacetState {
    fn from(active: bool) -> Self {
        if active {
            FacetState::Full
        } else {
            FacetState::Inactive
        }
    }
}

// Wire shape: `false`, `true`, or an array of identifiers. Keeps the
// inactive / empty-partial distinction.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum FacetStateRepr {
    Flag(bool),
    Ids(BTreeSet<String>),
}

impl From<FacetStateRepr> for FacetState {
    fn from(repr: FacetStateRepr) -> Self {
        match repr {
            FacetStateRepr::Flag(flag) => flag.into(),
            FacetStateRepr::Ids(ids) => FacetState::Partial(ids),
        }
    }
}

impl From<FacetState> for FacetStateRepr {
    fn from(state: FacetState) -> Self {
        match state {
            FacetState::Inactive => FacetStateRepr::Flag(false),
            FacetState::Full => FacetStateRepr::Flag(true),
            FacetState::Partial(ids) => FacetStateRepr::Ids(ids),
        }
    }
}

/// Which facets of a source item a dependent relies on.
///
/// `raw_content` and `attributes` support partial reliance;
/// `compiled_content` and `path` are on or off.
///
/// The serde form keeps every state distinction and is suitable for
/// persistence. [`DependencyProps::flags`] and the [`Display`](fmt::Display)
/// form are lossy summaries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencyProps {
    raw_content: FacetState,
    attributes: FacetState,
    compiled_content: bool,
    path: bool,
}

impl DependencyProps {
    /// A descriptor with every facet inactive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A descriptor with every facet fully active.
    #[must_use]
    pub fn all() -> Self {
        Self {
            raw_content: FacetState::Full,
            attributes: FacetState::Full,
            compiled_content: true,
            path: true,
        }
    }

    /// Set the raw content state.
    #[must_use]
    pub fn with_raw_content(mut self, state: impl Into<FacetState>) -> Self {
        self.raw_content = state.into();
        self
    }

    /// Set the attributes state.
    #[must_use]
    pub fn with_attributes(mut self, state: impl Into<FacetState>) -> Self {
        self.attributes = state.into();
        self
    }

    /// Set whether compiled content is relied upon.
    #[must_use]
    pub fn with_compiled_content(mut self, active: bool) -> Self {
        self.compiled_content = active;
        self
    }

    /// Set whether the output path is relied upon.
    #[must_use]
    pub fn with_path(mut self, active: bool) -> Self {
        self.path = active;
        self
    }

    /// Build a descriptor from a configuration object.
    ///
    /// Keys are facet names; values are `false`, `true`, or an array of
    /// identifier strings. Omitted facets are inactive. An identifier array
    /// given for `compiled_content` or `path` collapses to `true` when
    /// non-empty and `false` when empty.
    ///
    /// # Errors
    ///
    /// Returns `DepsError::InvalidDescriptor` for a non-object root, an
    /// unknown facet key, or a value that is neither a boolean nor an array
    /// of strings.
    pub fn from_config(config: &Value) -> DepsResult<Self> {
        let Value::Object(entries) = config else {
            return Err(DepsError::InvalidDescriptor(format!(
                "expected an object of facets, got {config}"
            )));
        };

        let mut props = Self::new();
        for (key, value) in entries {
            let facet: Facet = key.parse()?;
            let state = parse_state(facet, value)?;
            match facet {
                Facet::RawContent => props.raw_content = state,
                Facet::Attributes => props.attributes = state,
                Facet::CompiledContent => props.compiled_content = state.is_active(),
                Facet::Path => props.path = state.is_active(),
            }
        }
        Ok(props)
    }

    /// State of the raw content facet.
    #[must_use]
    pub fn raw_content(&self) -> &FacetState {
        &self.raw_content
    }

    /// State of the attributes facet.
    #[must_use]
    pub fn attributes(&self) -> &FacetState {
        &self.attributes
    }

    /// State of the given facet. Boolean facets map to `Full` / `Inactive`.
    #[must_use]
    pub fn state(&self, facet: Facet) -> FacetState {
        match facet {
            Facet::RawContent => self.raw_content.clone(),
            Facet::Attributes => self.attributes.clone(),
            Facet::CompiledContent => self.compiled_content.into(),
            Facet::Path => self.path.into(),
        }
    }

    /// Whether raw content is relied upon.
    #[must_use]
    pub fn raw_content_active(&self) -> bool {
        self.raw_content.is_active()
    }

    /// Whether attributes are relied upon.
    #[must_use]
    pub fn attributes_active(&self) -> bool {
        self.attributes.is_active()
    }

    /// Whether compiled content is relied upon.
    #[must_use]
    pub fn compiled_content_active(&self) -> bool {
        self.compiled_content
    }

    /// Whether the output path is relied upon.
    #[must_use]
    pub fn path_active(&self) -> bool {
        self.path
    }

    /// Whether the given facet is relied upon.
    #[must_use]
    pub fn is_active(&self, facet: Facet) -> bool {
        match facet {
            Facet::RawContent => self.raw_content_active(),
            Facet::Attributes => self.attributes_active(),
            Facet::CompiledContent => self.compiled_content,
            Facet::Path => self.path,
        }
    }

    /// Set of active facets.
    #[must_use]
    pub fn active(&self) -> BTreeSet<Facet> {
        Facet::ALL
            .into_iter()
            .filter(|facet| self.is_active(*facet))
            .collect()
    }

    /// Coarse per-facet summary. Partial identifiers are not retained.
    #[must_use]
    pub fn flags(&self) -> BTreeMap<Facet, bool> {
        Facet::ALL
            .into_iter()
            .map(|facet| (facet, self.is_active(facet)))
            .collect()
    }

    /// Debug form, e.g. `Props(_ac_)`.
    #[must_use]
    pub fn inspect(&self) -> String {
        format!("Props({self})")
    }

    /// Combine with another descriptor. Neither operand is modified.
    #[must_use]
    pub fn merge(&self, other: &DependencyProps) -> DependencyProps {
        DependencyProps {
            raw_content: self.raw_content.merge(&other.raw_content),
            attributes: self.attributes.merge(&other.attributes),
            compiled_content: self.compiled_content || other.compiled_content,
            path: self.path || other.path,
        }
    }
}

fn parse_state(facet: Facet, value: &Value) -> DepsResult<FacetState> {
    match value {
        Value::Bool(flag) => Ok((*flag).into()),
        Value::Array(items) => {
            let ids = items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_owned).ok_or_else(|| {
                        DepsError::InvalidDescriptor(format!(
                            "{facet}: identifiers must be strings, got {item}"
                        ))
                    })
                })
                .collect::<DepsResult<BTreeSet<_>>>()?;
            if facet.supports_partial() {
                Ok(FacetState::Partial(ids))
            } else {
                Ok((!ids.is_empty()).into())
            }
        }
        other => Err(DepsError::InvalidDescriptor(format!(
            "{facet}: expected a boolean or a list of identifiers, got {other}"
        ))),
    }
}

impl fmt::Display for DependencyProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for facet in Facet::ALL {
            let c = if self.is_active(facet) { facet.letter() } else { '_' };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(state: impl Into<FacetState>) -> DependencyProps {
        DependencyProps::new().with_attributes(state)
    }

    fn raw(state: impl Into<FacetState>) -> DependencyProps {
        DependencyProps::new().with_raw_content(state)
    }

    #[test]
    fn test_inspect() {
        assert_eq!(DependencyProps::new().inspect(), "Props(____)");
        assert_eq!(attrs(true).inspect(), "Props(_a__)");
        assert_eq!(
            attrs(true).with_compiled_content(true).inspect(),
            "Props(_ac_)"
        );
        assert_eq!(
            DependencyProps::new().with_compiled_content(true).inspect(),
            "Props(__c_)"
        );
    }

    #[test]
    fn test_to_string() {
        assert_eq!(DependencyProps::new().to_string(), "____");
        assert_eq!(attrs(true).to_string(), "_a__");
        assert_eq!(attrs(true).with_compiled_content(true).to_string(), "_ac_");
        assert_eq!(DependencyProps::all().to_string(), "racp");
        assert_eq!(raw(FacetState::partial(["/x.*"])).to_string(), "r___");
    }

    #[test]
    fn test_raw_content_predicate() {
        assert!(!DependencyProps::new().raw_content_active());
        assert!(raw(true).raw_content_active());
        assert!(raw(true).with_compiled_content(true).raw_content_active());
        assert!(!DependencyProps::new().with_compiled_content(true).raw_content_active());
        assert!(DependencyProps::all().raw_content_active());
        assert!(!raw(FacetState::partial(Vec::<String>::new())).raw_content_active());
        assert!(raw(FacetState::partial(["/asdf.*"])).raw_content_active());
    }

    #[test]
    fn test_attributes_predicate() {
        assert!(!DependencyProps::new().attributes_active());
        assert!(attrs(true).attributes_active());
        assert!(!DependencyProps::new().with_compiled_content(true).attributes_active());
        assert!(!attrs(FacetState::partial(Vec::<String>::new())).attributes_active());
        assert!(attrs(FacetState::partial(["donkey"])).attributes_active());
    }

    #[test]
    fn test_boolean_predicates() {
        let props = DependencyProps::new().with_path(true);
        assert!(props.path_active());
        assert!(!props.compiled_content_active());
        assert!(DependencyProps::all().compiled_content_active());
    }

    #[test]
    fn test_empty_partial_is_distinct_but_inactive() {
        let empty = raw(FacetState::partial(Vec::<String>::new()));
        let off = raw(false);
        assert_ne!(empty, off);
        assert!(empty.active().is_empty());
        assert_eq!(empty.flags(), off.flags());
        assert_eq!(empty.to_string(), "____");
    }

    #[test]
    fn test_active() {
        assert!(DependencyProps::new().active().is_empty());
        assert_eq!(raw(true).active(), BTreeSet::from([Facet::RawContent]));
        assert_eq!(
            DependencyProps::new().with_path(true).active(),
            BTreeSet::from([Facet::Path])
        );
        assert_eq!(
            attrs(true).with_compiled_content(true).active(),
            BTreeSet::from([Facet::Attributes, Facet::CompiledContent])
        );
        assert_eq!(DependencyProps::all().active(), BTreeSet::from(Facet::ALL));
    }

    #[test]
    fn test_flags() {
        let flags = attrs(true).with_compiled_content(true).flags();
        assert_eq!(
            flags,
            BTreeMap::from([
                (Facet::RawContent, false),
                (Facet::Attributes, true),
                (Facet::CompiledContent, true),
                (Facet::Path, false),
            ])
        );
        assert!(DependencyProps::all().flags().values().all(|v| *v));
        assert!(DependencyProps::new().flags().values().all(|v| !*v));
    }

    #[test]
    fn test_merge_active_table() {
        let none = DependencyProps::new();
        let some = DependencyProps::new().with_compiled_content(true);
        let others = raw(true);
        let all = DependencyProps::all();

        assert!(none.merge(&none).active().is_empty());
        assert_eq!(none.merge(&others).active(), BTreeSet::from([Facet::RawContent]));
        assert_eq!(none.merge(&all).active(), all.active());
        assert_eq!(some.merge(&none).active(), BTreeSet::from([Facet::CompiledContent]));
        assert_eq!(
            some.merge(&others).active(),
            BTreeSet::from([Facet::RawContent, Facet::CompiledContent])
        );
        assert_eq!(some.merge(&all).active(), all.active());
        assert_eq!(all.merge(&none).active(), all.active());
        assert_eq!(all.merge(&some).active(), all.active());
        assert_eq!(all.merge(&all).active(), all.active());
    }

    #[test]
    fn test_merge_attribute_states() {
        let off = attrs(false);
        let on = attrs(true);
        let list_a = attrs(FacetState::partial(["donkey", "giraffe"]));
        let list_b = attrs(FacetState::partial(["giraffe", "zebra"]));

        assert_eq!(off.merge(&off).attributes(), &FacetState::Inactive);
        assert_eq!(off.merge(&on).attributes(), &FacetState::Full);
        assert_eq!(
            off.merge(&list_a).attributes(),
            &FacetState::partial(["donkey", "giraffe"])
        );
        assert_eq!(on.merge(&off).attributes(), &FacetState::Full);
        assert_eq!(on.merge(&on).attributes(), &FacetState::Full);
        assert_eq!(on.merge(&list_a).attributes(), &FacetState::Full);
        assert_eq!(
            list_a.merge(&off).attributes(),
            &FacetState::partial(["donkey", "giraffe"])
        );
        assert_eq!(list_a.merge(&on).attributes(), &FacetState::Full);

        let union = list_a.merge(&list_b);
        let ids = union.attributes().identifiers().unwrap();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains("donkey") && ids.contains("giraffe") && ids.contains("zebra"));
    }

    #[test]
    fn test_merge_raw_content_states() {
        let list_a = raw(FacetState::partial(["donkey", "giraffe"]));
        let list_b = raw(FacetState::partial(["giraffe", "zebra"]));

        assert_eq!(raw(false).merge(&raw(true)).raw_content(), &FacetState::Full);
        assert_eq!(list_a.merge(&raw(true)).raw_content(), &FacetState::Full);
        assert_eq!(
            list_a.merge(&list_b).raw_content(),
            &FacetState::partial(["donkey", "giraffe", "zebra"])
        );
    }

    #[test]
    fn test_merge_does_not_mutate_operands() {
        let a = attrs(FacetState::partial(["title"]));
        let b = attrs(FacetState::partial(["author"]));
        let _ = a.merge(&b);
        assert_eq!(a, attrs(FacetState::partial(["title"])));
        assert_eq!(b, attrs(FacetState::partial(["author"])));
    }

    #[test]
    fn test_from_config() {
        let props = DependencyProps::from_config(&json!({
            "raw_content": ["/posts/*"],
            "attributes": true,
            "compiled_content": false,
        }))
        .unwrap();
        assert_eq!(props.raw_content(), &FacetState::partial(["/posts/*"]));
        assert_eq!(props.attributes(), &FacetState::Full);
        assert!(!props.compiled_content_active());
        assert!(!props.path_active());

        let empty = DependencyProps::from_config(&json!({})).unwrap();
        assert_eq!(empty, DependencyProps::new());
    }

    #[test]
    fn test_from_config_collapses_boolean_facets() {
        let props =
            DependencyProps::from_config(&json!({ "compiled_content": ["x"], "path": [] })).unwrap();
        assert!(props.compiled_content_active());
        assert!(!props.path_active());
        assert_eq!(props.state(Facet::CompiledContent), FacetState::Full);
        assert_eq!(props.state(Facet::Path), FacetState::Inactive);

        // Facets with sub-identifiers keep the empty list as its own state.
        let props = DependencyProps::from_config(&json!({ "attributes": [] })).unwrap();
        assert_eq!(props.attributes(), &FacetState::Partial(BTreeSet::new()));
    }

    #[test]
    fn test_from_config_rejects_malformed() {
        for config in [
            json!({ "content": true }),
            json!({ "attributes": 1 }),
            json!({ "attributes": "title" }),
            json!({ "attributes": null }),
            json!({ "raw_content": [1, 2] }),
            json!({ "path": { "x": true } }),
            json!(["attributes"]),
        ] {
            let result = DependencyProps::from_config(&config);
            assert!(
                matches!(result, Err(DepsError::InvalidDescriptor(_))),
                "accepted {config}"
            );
        }
    }

    #[test]
    fn test_serde_keeps_state_distinctions() {
        let props = raw(FacetState::partial(Vec::<String>::new()))
            .with_attributes(FacetState::partial(["title"]))
            .with_path(true);
        let encoded = serde_json::to_value(&props).unwrap();
        assert_eq!(
            encoded,
            json!({
                "raw_content": [],
                "attributes": ["title"],
                "compiled_content": false,
                "path": true,
            })
        );
        let decoded: DependencyProps = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, props);
    }
}
