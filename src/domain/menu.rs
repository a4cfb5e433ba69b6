//! Menu entries as delivered by the content host, and the organized tree.
//!
//! Only `id`, `parent` and `children` carry meaning here. Every other field
//! the host sends is kept verbatim in [`MenuEntry::attributes`] so a tree
//! read back from the cache is indistinguishable from a freshly built one.

use std::{fmt, num::ParseIntError, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use serde_json::{Map, Value};

/// Parent id used by top-level entries.
pub const ROOT_PARENT: u64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuId(u64);

impl MenuId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MenuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for MenuId {
    type Err = ParseIntError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value.trim().parse().map(Self)
    }
}

impl From<u64> for MenuId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuEntry {
    #[serde(alias = "ID", deserialize_with = "deserialize_entry_id")]
    pub id: u64,
    #[serde(
        rename = "parent",
        alias = "parent_id",
        alias = "parentId",
        alias = "menu_item_parent",
        default,
        deserialize_with = "deserialize_entry_id"
    )]
    pub parent_id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(default)]
    pub menu_order: i64,
    /// Host fields this crate does not interpret.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuEntry>,
}

impl MenuEntry {
    pub fn new(id: u64, parent_id: u64) -> Self {
        Self {
            id,
            parent_id,
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_id == ROOT_PARENT
    }
}

/// Hosts disagree on whether ids are numbers or numeric strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntryId {
    Number(u64),
    Text(String),
}

fn deserialize_entry_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match RawEntryId::deserialize(deserializer)? {
        RawEntryId::Number(value) => Ok(value),
        RawEntryId::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(ROOT_PARENT);
            }
            trimmed
                .parse()
                .map_err(|err| D::Error::custom(format!("invalid menu entry id `{text}`: {err}")))
        }
    }
}

/// Ordered root-level entries, each carrying its descendants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuTree {
    roots: Vec<MenuEntry>,
}

impl MenuTree {
    pub fn new(roots: Vec<MenuEntry>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[MenuEntry] {
        &self.roots
    }

    pub fn into_roots(self) -> Vec<MenuEntry> {
        self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of entries at every depth.
    pub fn len(&self) -> usize {
        self.walk().count()
    }

    /// Pre-order traversal yielding `(depth, entry)`, roots at depth 0.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: self.roots.iter().rev().map(|entry| (0, entry)).collect(),
        }
    }
}

pub struct Walk<'a> {
    stack: Vec<(usize, &'a MenuEntry)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a MenuEntry);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, entry) = self.stack.pop()?;
        self.stack
            .extend(entry.children.iter().rev().map(|child| (depth + 1, child)));
        Some((depth, entry))
    }
}
