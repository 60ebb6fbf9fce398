//! Query parameters, sorting and criteria for list requests
//!
//! List requests are built from three parts:
//!
//! - [`QueryParams`]: zero-based `page`, `size` and a [`Sort`] specifier
//! - [`Criteria`]: field-qualified predicates (`name.contains=Smith`)
//! - a cache-busting token appended by the resource client
//!
//! Each part only contributes the fragments that are actually set; an empty
//! filter value is the same as no predicate at all.
//!
//! # Example
//! ```rust,ignore
//! let params = QueryParams::page(0, 20).sorted(Sort::asc("name"));
//! let criteria = Criteria::new().contains("name", Some("Smith"));
//!
//! // GET /api/incidents?page=0&size=20&sort=name,asc&name.contains=Smith&cacheBuster=...
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Debug;
use std::str::FromStr;
use std::sync::OnceLock;

/// Query key carrying the cache-busting token
pub const CACHE_BUSTER_PARAM: &str = "cacheBuster";

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Sort specifier, serialized as `field,asc` or `field,desc`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.field, self.direction.as_str())
    }
}

/// Error returned when a sort specifier cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid sort specifier '{0}'")]
pub struct InvalidSort(pub String);

impl FromStr for Sort {
    type Err = InvalidSort;

    /// Parse `field`, `field,asc` or `field,desc`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        static FIELD_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = FIELD_REGEX
            .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*$").expect("valid regex"));

        let (field, direction) = match s.split_once(',') {
            Some((field, dir)) => {
                let direction = match dir.trim().to_ascii_lowercase().as_str() {
                    "asc" => SortDirection::Asc,
                    "desc" => SortDirection::Desc,
                    _ => return Err(InvalidSort(s.to_string())),
                };
                (field.trim(), direction)
            }
            None => (s.trim(), SortDirection::Asc),
        };

        if !regex.is_match(field) {
            return Err(InvalidSort(s.to_string()));
        }

        Ok(Self {
            field: field.to_string(),
            direction,
        })
    }
}

/// Pagination and ordering for a list request
///
/// Every member is optional; the default value produces a bare list request
/// (the one a store issues to refresh after a mutation).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    /// Page number (starts at 0)
    pub page: Option<u32>,

    /// Number of items per page
    pub size: Option<u32>,

    /// Sort field and direction
    pub sort: Option<Sort>,
}

impl QueryParams {
    /// Request a specific page
    pub fn page(page: u32, size: u32) -> Self {
        Self {
            page: Some(page),
            size: Some(size),
            sort: None,
        }
    }

    /// Add a sort specifier
    pub fn sorted(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Query-string pairs for the set members, in `page, size, sort` order
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(size) = self.size {
            pairs.push(("size".to_string(), size.to_string()));
        }
        if let Some(sort) = &self.sort {
            pairs.push(("sort".to_string(), sort.to_string()));
        }
        pairs
    }
}

/// Comparison applied by a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateOp {
    Equals,
    Contains,
}

impl PredicateOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredicateOp::Equals => "equals",
            PredicateOp::Contains => "contains",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "equals" => Some(PredicateOp::Equals),
            "contains" => Some(PredicateOp::Contains),
            _ => None,
        }
    }
}

/// A single field-qualified filter, e.g. `name.contains=Smith`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub field: String,
    pub op: PredicateOp,
    pub value: String,
}

impl Predicate {
    /// The query key, `field.op`
    pub fn key(&self) -> String {
        format!("{}.{}", self.field, self.op.as_str())
    }
}

/// Ordered set of predicates for a filtered list request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    predicates: Vec<Predicate>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality predicate; skipped when the value is absent or blank
    pub fn equals<V: ToString>(self, field: &str, value: Option<V>) -> Self {
        self.push(field, PredicateOp::Equals, value.map(|v| v.to_string()))
    }

    /// Add a containment predicate; skipped when the value is absent or blank
    pub fn contains(self, field: &str, value: Option<&str>) -> Self {
        self.push(field, PredicateOp::Contains, value.map(str::to_string))
    }

    fn push(mut self, field: &str, op: PredicateOp, value: Option<String>) -> Self {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            self.predicates.push(Predicate {
                field: field.to_string(),
                op,
                value,
            });
        }
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.predicates
            .iter()
            .map(|p| (p.key(), p.value.clone()))
            .collect()
    }

    /// Recover criteria from raw query pairs, ignoring unrelated keys
    ///
    /// Used by the reference backend to read `field.equals` / `field.contains`
    /// fragments back out of a request.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let predicates = pairs
            .into_iter()
            .filter_map(|(key, value)| {
                let (field, op) = key.rsplit_once('.')?;
                let op = PredicateOp::parse(op)?;
                if field.is_empty() || value.is_empty() {
                    return None;
                }
                Some(Predicate {
                    field: field.to_string(),
                    op,
                    value: value.to_string(),
                })
            })
            .collect();
        Self { predicates }
    }
}

/// Filter form for one record type
///
/// Implementors hold the optional per-field inputs of a filtered list view
/// and turn them into [`Criteria`]. Unset inputs must not produce predicates.
pub trait RecordFilter: Clone + Debug + Default + Send + Sync + 'static {
    fn criteria(&self) -> Criteria;
}

/// Build the full query for a list request
///
/// Pagination first, then predicates, then the cache buster.
pub fn list_query(
    params: &QueryParams,
    criteria: &Criteria,
    cache_buster: i64,
) -> Vec<(String, String)> {
    let mut pairs = params.to_pairs();
    pairs.extend(criteria.to_pairs());
    pairs.push((CACHE_BUSTER_PARAM.to_string(), cache_buster.to_string()));
    pairs
}
