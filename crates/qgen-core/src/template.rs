//! Query template document and placeholder parsing.
//!
//! A document is a JSON object keyed by verb:
//!
//! ```json
//! {
//!   "select": {
//!     "weight": 3,
//!     "queries": ["SELECT {{ all }} FROM {{ random_table }}"]
//!   },
//!   "update": {
//!     "weight": 1,
//!     "queries": [
//!       "UPDATE {{random_table}} SET {{second_random_column}} = '{{appropriate_value}}' WHERE {{random_column}} = '{{random_value}}'"
//!     ]
//!   }
//! }
//! ```
//!
//! Every template is parsed once at load time into literal text and
//! [`Placeholder`] segments, so rendering never re-scans strings.

use crate::error::TemplateError;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

/// Named values available to a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Placeholder {
    /// `*`
    All,
    RandomTable,
    RandomColumn,
    /// A value stored in `random_column` of `random_table`.
    RandomValue,
    /// A synthetic value fitting `second_random_column`.
    AppropriateValue,
    SecondRandomColumn,
}

impl Placeholder {
    pub const ALL: [Placeholder; 6] = [
        Placeholder::All,
        Placeholder::RandomTable,
        Placeholder::RandomColumn,
        Placeholder::RandomValue,
        Placeholder::AppropriateValue,
        Placeholder::SecondRandomColumn,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Placeholder::All => "all",
            Placeholder::RandomTable => "random_table",
            Placeholder::RandomColumn => "random_column",
            Placeholder::RandomValue => "random_value",
            Placeholder::AppropriateValue => "appropriate_value",
            Placeholder::SecondRandomColumn => "second_random_column",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/// A parsed statement template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    text: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse `{{ name }}` placeholders out of `text`.
    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = text;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let after_open = &rest[start + 2..];
            let end = after_open
                .find("}}")
                .ok_or_else(|| TemplateError::Unclosed(text.to_string()))?;
            let name = after_open[..end].trim();
            let placeholder =
                Placeholder::from_name(name).ok_or_else(|| TemplateError::UnknownPlaceholder {
                    name: name.to_string(),
                    template: text.to_string(),
                })?;
            segments.push(Segment::Placeholder(placeholder));
            rest = &after_open[end + 2..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            text: text.to_string(),
            segments,
        })
    }

    /// The template source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Placeholders referenced by this template.
    pub fn placeholders(&self) -> BTreeSet<Placeholder> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Placeholder(p) => Some(*p),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    pub fn references(&self, placeholder: Placeholder) -> bool {
        self.segments
            .iter()
            .any(|s| *s == Segment::Placeholder(placeholder))
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Templates registered for one verb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerbTemplates {
    pub weight: u32,
    pub templates: Vec<Template>,
}

#[derive(Deserialize)]
struct RawVerbEntry {
    weight: u32,
    queries: Vec<String>,
}

/// Verb weights and statement templates, read-only after loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryTemplateDocument {
    verbs: BTreeMap<String, VerbTemplates>,
}

impl QueryTemplateDocument {
    /// Parse and validate a JSON template document.
    pub fn from_json(json: &str) -> Result<Self, TemplateError> {
        let raw: BTreeMap<String, RawVerbEntry> = serde_json::from_str(json)?;
        let mut verbs = BTreeMap::new();
        for (verb, entry) in raw {
            if entry.weight == 0 {
                return Err(TemplateError::ZeroWeight(verb));
            }
            if entry.queries.is_empty() {
                return Err(TemplateError::NoQueries(verb));
            }
            let templates = entry
                .queries
                .iter()
                .map(|q| Template::parse(q))
                .collect::<Result<Vec<_>, _>>()?;
            verbs.insert(
                verb,
                VerbTemplates {
                    weight: entry.weight,
                    templates,
                },
            );
        }
        Ok(Self { verbs })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TemplateError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn verb(&self, verb: &str) -> Option<&VerbTemplates> {
        self.verbs.get(verb)
    }

    /// Verbs in name order, with their original casing.
    pub fn verbs(&self) -> impl Iterator<Item = (&str, &VerbTemplates)> {
        self.verbs.iter().map(|(v, t)| (v.as_str(), t))
    }

    pub fn is_empty(&self) -> bool {
        self.verbs.is_empty()
    }
}

/// Case-insensitive set of verbs that may be selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedVerbs(BTreeSet<String>);

impl AllowedVerbs {
    pub const DEFAULT_VERB: &'static str = "select";

    /// Build from a verb list; an empty list means `{select}`.
    pub fn new<I, S>(verbs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: BTreeSet<String> = verbs
            .into_iter()
            .map(|v| v.as_ref().trim().to_lowercase())
            .filter(|v| !v.is_empty())
            .collect();
        if set.is_empty() {
            Self::default()
        } else {
            Self(set)
        }
    }

    pub fn contains(&self, verb: &str) -> bool {
        self.0.contains(&verb.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for AllowedVerbs {
    fn default() -> Self {
        Self(BTreeSet::from([Self::DEFAULT_VERB.to_string()]))
    }
}
