//! Offline country dataset.
//!
//! Served while the store reports itself disconnected. Results computed from
//! it are never written to the cache.

use std::collections::BTreeMap;

use wayfare_storage::{Country, OrderBy, Predicate};

use super::models::{ContinentSummary, PageRequest, PageResult};

struct Seed {
    code: &'static str,
    code3: &'static str,
    name: &'static str,
    official_name: &'static str,
    capital: &'static str,
    continent: &'static str,
    region: &'static str,
    languages: &'static [&'static str],
    currencies: &'static [&'static str],
    calling_codes: &'static [&'static str],
    is_popular: bool,
    flag: &'static str,
    latitude: f64,
    longitude: f64,
}

static SEED: [Seed; 7] = [
    Seed {
        code: "US",
        code3: "USA",
        name: "United States",
        official_name: "United States of America",
        capital: "Washington, D.C.",
        continent: "North America",
        region: "Northern America",
        languages: &["English"],
        currencies: &["USD"],
        calling_codes: &["+1"],
        is_popular: true,
        flag: "🇺🇸",
        latitude: 37.0902,
        longitude: -95.7129,
    },
    Seed {
        code: "FR",
        code3: "FRA",
        name: "France",
        official_name: "French Republic",
        capital: "Paris",
        continent: "Europe",
        region: "Western Europe",
        languages: &["French"],
        currencies: &["EUR"],
        calling_codes: &["+33"],
        is_popular: true,
        flag: "🇫🇷",
        latitude: 46.2276,
        longitude: 2.2137,
    },
    Seed {
        code: "JP",
        code3: "JPN",
        name: "Japan",
        official_name: "Japan",
        capital: "Tokyo",
        continent: "Asia",
        region: "Eastern Asia",
        languages: &["Japanese"],
        currencies: &["JPY"],
        calling_codes: &["+81"],
        is_popular: true,
        flag: "🇯🇵",
        latitude: 36.2048,
        longitude: 138.2529,
    },
    Seed {
        code: "IT",
        code3: "ITA",
        name: "Italy",
        official_name: "Italian Republic",
        capital: "Rome",
        continent: "Europe",
        region: "Southern Europe",
        languages: &["Italian"],
        currencies: &["EUR"],
        calling_codes: &["+39"],
        is_popular: true,
        flag: "🇮🇹",
        latitude: 41.8719,
        longitude: 12.5674,
    },
    Seed {
        code: "ES",
        code3: "ESP",
        name: "Spain",
        official_name: "Kingdom of Spain",
        capital: "Madrid",
        continent: "Europe",
        region: "Southern Europe",
        languages: &["Spanish"],
        currencies: &["EUR"],
        calling_codes: &["+34"],
        is_popular: true,
        flag: "🇪🇸",
        latitude: 40.4637,
        longitude: -3.7492,
    },
    Seed {
        code: "GB",
        code3: "GBR",
        name: "United Kingdom",
        official_name: "United Kingdom of Great Britain and Northern Ireland",
        capital: "London",
        continent: "Europe",
        region: "Northern Europe",
        languages: &["English"],
        currencies: &["GBP"],
        calling_codes: &["+44"],
        is_popular: true,
        flag: "🇬🇧",
        latitude: 55.3781,
        longitude: -3.4360,
    },
    Seed {
        code: "AU",
        code3: "AUS",
        name: "Australia",
        official_name: "Commonwealth of Australia",
        capital: "Canberra",
        continent: "Oceania",
        region: "Australia and New Zealand",
        languages: &["English"],
        currencies: &["AUD"],
        calling_codes: &["+61"],
        is_popular: true,
        flag: "🇦🇺",
        latitude: -25.2744,
        longitude: 133.7751,
    },
];

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

impl Seed {
    fn to_country(&self) -> Country {
        Country {
            code: self.code.to_string(),
            code3: self.code3.to_string(),
            name: self.name.to_string(),
            official_name: self.official_name.to_string(),
            capital: self.capital.to_string(),
            continent: self.continent.to_string(),
            region: self.region.to_string(),
            languages: strings(self.languages),
            currencies: strings(self.currencies),
            calling_codes: strings(self.calling_codes),
            is_popular: self.is_popular,
            flag: self.flag.to_string(),
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Every offline country, ordered by name.
pub fn countries() -> Vec<Country> {
    let mut all: Vec<Country> = SEED.iter().map(Seed::to_country).collect();
    OrderBy::by_name().sort(&mut all);
    all
}

fn matching(predicate: &Predicate) -> Vec<Country> {
    countries()
        .into_iter()
        .filter(|c| predicate.matches(c))
        .collect()
}

/// Looks a country up by alpha-2 or alpha-3 code, ignoring case.
pub fn find_by_code(code: &str) -> Option<Country> {
    SEED.iter()
        .find(|s| s.code.eq_ignore_ascii_case(code) || s.code3.eq_ignore_ascii_case(code))
        .map(Seed::to_country)
}

/// One page of the offline countries matching `predicate`.
pub fn page(predicate: &Predicate, page: PageRequest) -> PageResult<Country> {
    let rows = matching(predicate);
    let total = rows.len() as u64;
    let data = rows
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    PageResult::new(data, page, total)
}

/// Offline countries grouped by continent, ordered by continent name.
pub fn continent_summaries() -> Vec<ContinentSummary> {
    let mut groups: BTreeMap<&'static str, u64> = BTreeMap::new();
    for seed in &SEED {
        *groups.entry(seed.continent).or_default() += 1;
    }
    groups
        .into_iter()
        .map(|(name, country_count)| ContinentSummary {
            name: name.to_string(),
            country_count,
        })
        .collect()
}

/// Offline countries flagged as popular destinations, ordered by name.
pub fn popular() -> Vec<Country> {
    matching(&Predicate::IsPopular(true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countries::service::build_predicate;
    use crate::countries::models::CountryFilter;

    #[test]
    fn codes_are_unique() {
        let all = countries();
        assert_eq!(all.len(), 7);
        let mut codes: Vec<&str> = all
            .iter()
            .flat_map(|c| [c.code.as_str(), c.code3.as_str()])
            .collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 14);
    }

    #[test]
    fn countries_are_sorted_by_name() {
        let names: Vec<String> = countries().into_iter().map(|c| c.name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names[0], "Australia");
    }

    #[test]
    fn lookup_accepts_either_code_in_any_case() {
        for code in ["us", "US", "USA", "usa"] {
            assert_eq!(find_by_code(code).unwrap().name, "United States");
        }
        assert!(find_by_code("ZZZZZ").is_none());
    }

    #[test]
    fn continent_summaries_are_alphabetical() {
        let summaries = continent_summaries();
        let names: Vec<&str> = summaries.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Asia", "Europe", "North America", "Oceania"]);
        assert_eq!(summaries[1].country_count, 4);
        assert_eq!(summaries[2].country_count, 1);
    }

    #[test]
    fn page_applies_filter_and_window() {
        let predicate = build_predicate(&CountryFilter::new().with_continent("europe"));
        let first = page(&predicate, PageRequest::new(1, 3).unwrap());
        assert_eq!(first.meta.total, 4);
        assert_eq!(first.meta.total_pages, 2);
        let names: Vec<&str> = first.data.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["France", "Italy", "Spain"]);

        let second = page(&predicate, PageRequest::new(2, 3).unwrap());
        assert_eq!(second.data.len(), 1);
        assert_eq!(second.data[0].name, "United Kingdom");
        assert!(!second.meta.has_next);
    }

    #[test]
    fn search_matches_name_or_codes() {
        let by_code3 = build_predicate(&CountryFilter::new().with_search("jpn"));
        assert_eq!(page(&by_code3, PageRequest::new(1, 10).unwrap()).data[0].code, "JP");

        let by_name = build_predicate(&CountryFilter::new().with_search("united"));
        assert_eq!(page(&by_name, PageRequest::new(1, 10).unwrap()).meta.total, 2);
    }

    #[test]
    fn region_is_a_substring_match() {
        let predicate = build_predicate(&CountryFilter::new().with_region("southern"));
        let result = page(&predicate, PageRequest::new(1, 10).unwrap());
        let codes: Vec<&str> = result.data.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, ["IT", "ES"]);
    }
}
