//! List-view state carried in URL query parameters.
//!
//! Two independent sub-schemas share one parameter bag: [`ListQuery`]
//! (search, sort, page, perPage) and [`SelectionState`] (`<entity>Id`).
//! Each produces a [`QueryPatch`] that [`Location::apply`] merges into the
//! current URL, so encoding one never clobbers the other.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::domain::EntityKind;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 5;

pub const SEARCH_PARAM: &str = "search";
pub const SORT_PARAM: &str = "sort";
pub const PAGE_PARAM: &str = "page";
pub const PER_PAGE_PARAM: &str = "perPage";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Store default order.
    #[default]
    None,
    Asc,
    Desc,
}

impl SortOrder {
    /// Only the exact strings `asc` and `desc` select an order.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "asc" => SortOrder::Asc,
            "desc" => SortOrder::Desc,
            _ => SortOrder::None,
        }
    }

    pub fn as_param(self) -> Option<&'static str> {
        match self {
            SortOrder::None => None,
            SortOrder::Asc => Some("asc"),
            SortOrder::Desc => Some("desc"),
        }
    }

    /// Next order for a column-header toggle: none -> asc -> desc -> asc.
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::None | SortOrder::Desc => SortOrder::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListQuery {
    pub search: Option<String>,
    pub sort: SortOrder,
    pub page: u32,
    pub per_page: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: None,
            sort: SortOrder::None,
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl ListQuery {
    /// Decodes list state from query pairs. Never fails: anything missing or
    /// malformed falls back to the defaults. The first occurrence of a key wins.
    pub fn decode<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut search = None;
        let mut sort = None;
        let mut page = None;
        let mut per_page = None;

        for (key, value) in params {
            let value = value.as_ref();
            match key.as_ref() {
                SEARCH_PARAM if search.is_none() => search = Some(value.to_string()),
                SORT_PARAM if sort.is_none() => sort = Some(SortOrder::parse(value)),
                PAGE_PARAM if page.is_none() => page = Some(parse_positive(value)),
                PER_PAGE_PARAM if per_page.is_none() => per_page = Some(parse_positive(value)),
                _ => {}
            }
        }

        Self {
            search: search.filter(|s| !s.is_empty()),
            sort: sort.unwrap_or_default(),
            page: page.flatten().unwrap_or(DEFAULT_PAGE),
            per_page: per_page.flatten().unwrap_or(DEFAULT_PER_PAGE),
        }
    }

    pub fn from_query_str(raw: &str) -> Self {
        Self::decode(form_urlencoded::parse(raw.trim_start_matches('?').as_bytes()))
    }

    pub fn from_location(location: &Location) -> Self {
        Self::decode(location.params().iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    /// Patch that writes this state into a URL. Defaults encode as removals
    /// so the URL stays minimal.
    pub fn patch(&self) -> QueryPatch {
        let mut patch = QueryPatch::new();
        patch = match self.search.as_deref() {
            Some(search) if !search.is_empty() => patch.set(SEARCH_PARAM, search),
            _ => patch.clear(SEARCH_PARAM),
        };
        patch = match self.sort.as_param() {
            Some(sort) => patch.set(SORT_PARAM, sort),
            None => patch.clear(SORT_PARAM),
        };
        patch = if self.page == DEFAULT_PAGE {
            patch.clear(PAGE_PARAM)
        } else {
            patch.set(PAGE_PARAM, self.page.to_string())
        };
        if self.per_page == DEFAULT_PER_PAGE {
            patch.clear(PER_PAGE_PARAM)
        } else {
            patch.set(PER_PAGE_PARAM, self.per_page.to_string())
        }
    }

    pub fn encode(&self, current: &Location) -> String {
        encode(&self.patch(), current)
    }

    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self.clone()
        }
    }

    pub fn with_per_page(&self, per_page: u32) -> Self {
        Self {
            per_page: if per_page == 0 { DEFAULT_PER_PAGE } else { per_page },
            page: DEFAULT_PAGE,
            ..self.clone()
        }
    }

    /// Changing the filter returns to the first page.
    pub fn with_search(&self, search: Option<&str>) -> Self {
        Self {
            search: search.filter(|s| !s.is_empty()).map(str::to_string),
            page: DEFAULT_PAGE,
            ..self.clone()
        }
    }

    pub fn with_sort(&self, sort: SortOrder) -> Self {
        Self {
            sort,
            page: DEFAULT_PAGE,
            ..self.clone()
        }
    }
}

fn parse_positive(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|value| *value >= 1)
}

/// Row targeted by a pending destructive action, read from `<entity>Id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SelectionState {
    pub active_id: Option<i64>,
}

impl SelectionState {
    pub fn selected(id: i64) -> Self {
        Self {
            active_id: Some(id),
        }
    }

    pub fn decode<I, K, V>(params: I, kind: EntityKind) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let name = kind.selection_param();
        let active_id = params
            .into_iter()
            .find(|(key, _)| key.as_ref() == name)
            .and_then(|(_, value)| value.as_ref().trim().parse::<i64>().ok());
        Self { active_id }
    }

    pub fn from_location(location: &Location, kind: EntityKind) -> Self {
        Self::decode(
            location.params().iter().map(|(k, v)| (k.as_str(), v.as_str())),
            kind,
        )
    }

    pub fn is_open(&self) -> bool {
        self.active_id.is_some()
    }

    pub fn patch(&self, kind: EntityKind) -> QueryPatch {
        match self.active_id {
            Some(id) => QueryPatch::new().set(kind.selection_param(), id.to_string()),
            None => QueryPatch::new().clear(kind.selection_param()),
        }
    }
}

/// Ordered set of parameter overrides. An entry whose value is `None` or
/// empty removes the key; keys not named by the patch are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPatch {
    entries: Vec<(String, Option<String>)>,
}

impl QueryPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key.into(), Some(value.into()));
        self
    }

    pub fn clear(mut self, key: impl Into<String>) -> Self {
        self.push(key.into(), None);
        self
    }

    pub fn merge(mut self, other: QueryPatch) -> Self {
        for (key, value) in other.entries {
            self.push(key, value);
        }
        self
    }

    pub fn entries(&self) -> &[(String, Option<String>)] {
        &self.entries
    }

    fn push(&mut self, key: String, value: Option<String>) {
        if let Some(existing) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            existing.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }
}

/// A path plus its decoded query parameters, in URL order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    path: String,
    params: Vec<(String, String)>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: Vec::new(),
        }
    }

    /// Parses `path?query#fragment`; the fragment is dropped.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.split('#').next().unwrap_or_default();
        let (path, query) = raw.split_once('?').unwrap_or((raw, ""));
        Self {
            path: path.to_string(),
            params: form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        }
    }

    pub fn with_query(path: impl Into<String>, raw_query: Option<&str>) -> Self {
        Self {
            path: path.into(),
            params: raw_query
                .map(|q| {
                    form_urlencoded::parse(q.trim_start_matches('?').as_bytes())
                        .into_owned()
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Same path, no parameters.
    pub fn bare(&self) -> Location {
        Location::new(self.path.clone())
    }

    /// Merge-and-override: existing keys are replaced in place, new keys are
    /// appended, empty or null values remove the key.
    pub fn apply(&self, patch: &QueryPatch) -> Location {
        let mut params = self.params.clone();
        for (key, value) in patch.entries() {
            match value.as_deref().filter(|v| !v.is_empty()) {
                Some(value) => {
                    let mut replaced = false;
                    params.retain_mut(|(k, v)| {
                        if k != key {
                            return true;
                        }
                        if replaced {
                            return false;
                        }
                        *v = value.to_string();
                        replaced = true;
                        true
                    });
                    if !replaced {
                        params.push((key.clone(), value.to_string()));
                    }
                }
                None => params.retain(|(k, _)| k != key),
            }
        }
        // Empty values that were already present are dropped too.
        params.retain(|(_, v)| !v.is_empty());
        Location {
            path: self.path.clone(),
            params,
        }
    }

    pub fn query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            f.write_str(&self.path)
        } else {
            write!(f, "{}?{}", self.path, self.query_string())
        }
    }
}

/// Applies `patch` to `current` and renders the resulting URL.
pub fn encode(patch: &QueryPatch, current: &Location) -> String {
    current.apply(patch).to_string()
}

#[cfg(test)]
#[path = "tests/query_tests.rs"]
mod tests;
