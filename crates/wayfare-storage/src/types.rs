//! Data types shared by every country store backend.

use serde::{Deserialize, Serialize};

/// A country reference record.
///
/// `code` is the ISO 3166-1 alpha-2 code and `code3` the alpha-3 code; both
/// are unique within a dataset and stored uppercase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub code: String,
    pub code3: String,
    pub name: String,
    pub official_name: String,
    pub capital: String,
    pub continent: String,
    pub region: String,
    pub languages: Vec<String>,
    pub currencies: Vec<String>,
    pub calling_codes: Vec<String>,
    pub is_popular: bool,
    pub flag: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Country {
    /// Returns the text value of a filterable field.
    pub fn field(&self, field: CountryField) -> &str {
        match field {
            CountryField::Code => &self.code,
            CountryField::Code3 => &self.code3,
            CountryField::Name => &self.name,
            CountryField::Continent => &self.continent,
            CountryField::Region => &self.region,
        }
    }
}

/// Text columns a predicate can compare against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CountryField {
    Code,
    Code3,
    Name,
    Continent,
    Region,
}

impl CountryField {
    /// Column name in the relational schema.
    pub fn column(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Code3 => "code3",
            Self::Name => "name",
            Self::Continent => "continent",
            Self::Region => "region",
        }
    }
}

/// A closed, typed filter over countries.
///
/// All text comparisons are case-insensitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every record.
    All,
    /// Field equals value.
    Equals { field: CountryField, value: String },
    /// Field contains value as a substring.
    Contains { field: CountryField, value: String },
    /// Popular-destination flag equals the given value.
    IsPopular(bool),
    /// Every inner predicate matches.
    And(Vec<Predicate>),
    /// At least one inner predicate matches.
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn equals(field: CountryField, value: impl Into<String>) -> Self {
        Self::Equals {
            field,
            value: value.into(),
        }
    }

    pub fn contains(field: CountryField, value: impl Into<String>) -> Self {
        Self::Contains {
            field,
            value: value.into(),
        }
    }

    /// Create an AND predicate, collapsing trivial cases.
    pub fn and(predicates: Vec<Predicate>) -> Self {
        let mut predicates: Vec<Predicate> = predicates
            .into_iter()
            .filter(|p| *p != Predicate::All)
            .collect();
        match predicates.len() {
            0 => Self::All,
            1 => predicates.remove(0),
            _ => Self::And(predicates),
        }
    }

    /// Create an OR predicate, collapsing the single-element case.
    pub fn or(mut predicates: Vec<Predicate>) -> Self {
        match predicates.len() {
            1 => predicates.remove(0),
            _ => Self::Or(predicates),
        }
    }

    /// Evaluates the predicate against an in-memory record.
    pub fn matches(&self, country: &Country) -> bool {
        match self {
            Self::All => true,
            Self::Equals { field, value } => {
                country.field(*field).to_lowercase() == value.to_lowercase()
            }
            Self::Contains { field, value } => country
                .field(*field)
                .to_lowercase()
                .contains(&value.to_lowercase()),
            Self::IsPopular(flag) => country.is_popular == *flag,
            Self::And(inner) => inner.iter().all(|p| p.matches(country)),
            // An empty OR matches nothing
            Self::Or(inner) => inner.iter().any(|p| p.matches(country)),
        }
    }
}

/// Ascending ordering applied to `find_many`.
///
/// Ties on the ordering field are broken by alpha-2 code so pages are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub field: CountryField,
}

impl OrderBy {
    pub fn asc(field: CountryField) -> Self {
        Self { field }
    }

    /// Ascending by display name, the order used by every listing.
    pub fn by_name() -> Self {
        Self::asc(CountryField::Name)
    }

    /// Sorts records in place according to this ordering.
    pub fn sort(&self, countries: &mut [Country]) {
        let field = self.field;
        countries.sort_by(|a, b| {
            a.field(field)
                .cmp(b.field(field))
                .then_with(|| a.code.cmp(&b.code))
        });
    }
}

/// Offset/limit window for `find_many`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Window {
    pub offset: u64,
    pub limit: Option<u64>,
}

impl Window {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self {
            offset,
            limit: Some(limit),
        }
    }

    /// No offset, no limit.
    pub fn unbounded() -> Self {
        Self::default()
    }
}
