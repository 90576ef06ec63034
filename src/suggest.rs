use futures_util::future::join_all;
use serde::Serialize;
use thiserror::Error;

use crate::catalog;
use crate::gemini::GeminiClient;
use crate::geo::{CachedLocator, GeoError, LocationProvider};
use crate::images::{self, ImageResolver, PhotoSearch};
use crate::models::{GeoPoint, Place, PlaceFilters};

pub const SOURCE_CATALOG: &str = "catalogo-local";
pub const SOURCE_GEMINI: &str = "gemini-google-search";

#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("selecione orçamento, tipo e período antes de buscar")]
    IncompleteFilters,
    /// Normal outcome, not a fault: the user should try different filters.
    #[error("nenhum lugar encontrado com esses filtros")]
    EmptyResult,
    #[error(transparent)]
    Location(#[from] GeoError),
}

impl SuggestError {
    /// Whether the caller should offer the catalog (demonstration) mode.
    pub fn offers_fallback(&self) -> bool {
        matches!(self, SuggestError::Location(GeoError::PermissionDenied))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub places: Vec<Place>,
    pub total_found: usize,
    pub source: &'static str,
}

/// Orchestrates one "surpreenda-me" action: location gating, the Gemini
/// recommendation round with catalog fallback, and image resolution.
pub struct SuggestionEngine<L, S> {
    gemini: GeminiClient,
    resolver: ImageResolver<S>,
    locator: CachedLocator<L>,
}

impl<L: LocationProvider, S: PhotoSearch> SuggestionEngine<L, S> {
    pub fn new(gemini: GeminiClient, resolver: ImageResolver<S>, locator: CachedLocator<L>) -> Self {
        Self {
            gemini,
            resolver,
            locator,
        }
    }

    /// AI-first flow. A location failure is surfaced before the recommendation
    /// client is ever consulted; a recommendation failure drops to the catalog.
    pub async fn surprise(&self, filters: &PlaceFilters) -> Result<Suggestion, SuggestError> {
        filters
            .required()
            .ok_or(SuggestError::IncompleteFilters)?;

        let location = self.locator.locate().await.map_err(SuggestError::Location)?;

        match self.gemini.fetch_recommendations(filters, location).await {
            Ok(places) if !places.is_empty() => {
                let places = self.attach_images(places).await;
                Ok(Suggestion {
                    total_found: places.len(),
                    places,
                    source: SOURCE_GEMINI,
                })
            }
            Ok(_) => {
                log::info!("gemini não retornou lugares, usando catálogo local");
                self.fallback_surprise(filters)
            }
            Err(err) => {
                log::warn!("recomendações indisponíveis ({}), usando catálogo local", err);
                self.fallback_surprise(filters)
            }
        }
    }

    /// Demonstration mode: catalog filter, uniform pick, stock image per
    /// category. Also the landing spot when the AI path fails.
    pub fn fallback_surprise(&self, filters: &PlaceFilters) -> Result<Suggestion, SuggestError> {
        filters
            .required()
            .ok_or(SuggestError::IncompleteFilters)?;

        let candidates = catalog::filter_places(filters);
        let chosen = catalog::pick_random(&candidates).ok_or(SuggestError::EmptyResult)?;

        let mut place = chosen.clone();
        place.image_url = images::stock_image(place.category).to_string();

        Ok(Suggestion {
            places: vec![place],
            total_found: 1,
            source: SOURCE_CATALOG,
        })
    }

    /// The owned-endpoint flow: coordinates come from the request body, no
    /// locator involved. Errors are the recommendation client's own.
    pub async fn recommendations(
        &self,
        filters: &PlaceFilters,
        location: GeoPoint,
    ) -> Result<Suggestion, crate::gemini::RecommendError> {
        let places = self.gemini.fetch_recommendations(filters, location).await?;
        let places = self.attach_images(places).await;
        Ok(Suggestion {
            total_found: places.len(),
            places,
            source: SOURCE_GEMINI,
        })
    }

    /// Image lookups run concurrently; results land back by index, so the
    /// venue order never depends on completion order.
    pub(crate) async fn attach_images(&self, places: Vec<Place>) -> Vec<Place> {
        let lookups = places.iter().map(|place| self.resolver.resolve_place(place));
        let urls = join_all(lookups).await;

        places
            .into_iter()
            .zip(urls)
            .map(|(mut place, url)| {
                place.image_url = url;
                place
            })
            .collect()
    }
}
