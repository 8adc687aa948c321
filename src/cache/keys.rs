//! Cache key definitions.
//!
//! Listings live under `{collection}:all`, single entities under
//! `{entity}:{id}` and search results under `{collection}:search:{term}`
//! with the term lowercased.

pub const LIST_SUFFIX: &str = "all";
pub const SEARCH_SEGMENT: &str = "search";
/// Glob suffix matching every search entry of a collection.
pub const SEARCH_PATTERN_SUFFIX: &str = "search:*";

/// The three cached resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Category,
    Product,
    Variant,
}

impl ResourceKind {
    /// Namespace for listings and searches.
    pub fn collection(self) -> &'static str {
        match self {
            Self::Category => "categories",
            Self::Product => "products",
            Self::Variant => "variants",
        }
    }

    /// Namespace for single-entity entries.
    pub fn entity(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Product => "product",
            Self::Variant => "variant",
        }
    }

    pub fn list_key(self) -> String {
        make_key(self.collection(), None, LIST_SUFFIX)
    }

    pub fn entity_key(self, id: i64) -> String {
        make_key(self.entity(), Some(id), LIST_SUFFIX)
    }

    pub fn search_key(self, term: &str) -> String {
        make_search_key(self.collection(), term)
    }
}

/// `{resource}:{id}` when an id is given, otherwise `{resource}:{suffix}`.
pub fn make_key(resource: &str, id: Option<i64>, suffix: &str) -> String {
    match id {
        Some(id) => format!("{resource}:{id}"),
        None => format!("{resource}:{suffix}"),
    }
}

pub fn make_search_key(resource: &str, term: &str) -> String {
    format!("{resource}:{SEARCH_SEGMENT}:{}", term.to_lowercase())
}
