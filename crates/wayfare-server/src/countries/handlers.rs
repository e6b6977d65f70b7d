//! HTTP handlers for `/api/countries`.

use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use wayfare_api::{ApiError, ApiResponse, Envelope};
use wayfare_storage::Country;

use super::keys::INVALIDATED_KEYS;
use super::models::{ContinentSummary, CountryFilter, PageRequest};
use crate::config::CountriesSettings;
use crate::server::AppState;

/// Query string of `GET /api/countries`.
///
/// `page` and `limit` stay strings so malformed numbers produce the JSON
/// error envelope instead of a plain-text extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ListCountriesParams {
    pub continent: Option<String>,
    pub region: Option<String>,
    pub search: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListCountriesParams {
    pub fn filter(&self) -> CountryFilter {
        CountryFilter {
            continent: self.continent.clone(),
            region: self.region.clone(),
            search: self.search.clone(),
        }
    }

    /// Resolves the page request, applying defaults and clamping `limit`.
    pub fn page_request(&self, settings: &CountriesSettings) -> Result<PageRequest, ApiError> {
        let page = parse_positive("page", self.page.as_deref())?.unwrap_or(1);
        let limit = parse_positive("limit", self.limit.as_deref())?
            .unwrap_or(settings.default_page_size)
            .min(settings.max_page_size);
        PageRequest::new(page, limit).map_err(ApiError::from)
    }
}

fn parse_positive(name: &str, raw: Option<&str>) -> Result<Option<u32>, ApiError> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    match raw.parse::<u32>() {
        Ok(0) | Err(_) => Err(ApiError::bad_request(format!(
            "{name} must be a positive integer"
        ))),
        Ok(value) => Ok(Some(value)),
    }
}

pub async fn list_countries(
    State(state): State<AppState>,
    Query(params): Query<ListCountriesParams>,
) -> Result<ApiResponse<Vec<Country>>, ApiError> {
    let page = params.page_request(&state.config.countries)?;
    let result = state.countries.list_countries(&params.filter(), page).await?;
    let envelope = Envelope::new("Countries retrieved successfully", result.data)
        .with_meta(result.meta)
        .with_timestamp(result.generated_at);
    Ok(ApiResponse::new(envelope, axum::http::StatusCode::OK))
}

pub async fn get_country(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<ApiResponse<Country>, ApiError> {
    let country = state.countries.get_by_code(&code).await?;
    Ok(ApiResponse::ok("Country retrieved successfully", country))
}

pub async fn list_all(State(state): State<AppState>) -> Result<ApiResponse<Vec<Country>>, ApiError> {
    let countries = state.countries.list_all().await?;
    Ok(ApiResponse::ok("All countries retrieved successfully", countries))
}

pub async fn list_continents(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<ContinentSummary>>, ApiError> {
    let continents = state.countries.list_continents().await?;
    Ok(ApiResponse::ok("Continents retrieved successfully", continents))
}

pub async fn list_popular(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<Country>>, ApiError> {
    let countries = state.countries.list_popular().await?;
    Ok(ApiResponse::ok("Popular destinations retrieved successfully", countries))
}

#[derive(Debug, Serialize)]
pub struct InvalidatedKeys {
    pub keys: Vec<&'static str>,
}

pub async fn invalidate_cache(
    State(state): State<AppState>,
) -> Result<ApiResponse<InvalidatedKeys>, ApiError> {
    state.countries.invalidate_cache().await?;
    Ok(ApiResponse::ok(
        "Country cache invalidated",
        InvalidatedKeys {
            keys: INVALIDATED_KEYS.to_vec(),
        },
    ))
}
