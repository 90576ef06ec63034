use std::collections::HashMap;
use std::sync::Mutex;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{Category, Place};

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("chave da API Pexels não configurada")]
    MissingApiKey,
    #[error("http error: {0}")]
    Http(String),
    #[error("parse error: {0}")]
    Parse(String),
}

const PEXELS_SEARCH_URL: &str = "https://api.pexels.com/v1/search";
const PEXELS_LOCALE: &str = "pt-BR";
const PEXELS_PER_PAGE: u32 = 1;

/// Keywords recognized inside venue names, mapped to English search terms.
/// Lookup is done over the lowercased, accent-folded name.
const KEYWORD_MAPPING: &[(&str, &[&str])] = &[
    ("feira", &["market", "food stall", "street market", "vendor"]),
    ("restaurante", &["restaurant", "dining", "food"]),
    ("bar", &["bar", "pub", "drinks", "nightlife"]),
    ("cafe", &["cafe", "coffee", "coffee shop"]),
    ("lanchonete", &["snack bar", "fast food", "diner"]),
    ("pizzaria", &["pizza", "pizzeria", "italian"]),
    ("churrascaria", &["barbecue", "grill", "steakhouse"]),
    ("padaria", &["bakery", "bread", "pastry"]),
    ("comida", &["food", "meal", "cuisine"]),
    ("sushi", &["sushi", "japanese", "seafood"]),
    ("hamburguer", &["burger", "hamburger", "american food"]),
    ("espeto", &["barbecue", "grill", "skewers"]),
    ("rodizio", &["all you can eat", "buffet", "brazilian food"]),
    ("sorvete", &["ice cream", "gelato", "dessert"]),
    ("parque", &["park", "recreation", "outdoor"]),
    ("acqua", &["water", "pool", "aquatic"]),
    ("radical", &["extreme", "adventure", "thrill"]),
    ("esporte", &["sports", "activity", "recreation"]),
    ("kart", &["go kart", "racing", "speed"]),
    ("diversao", &["amusement park", "fun", "rides"]),
    ("tirolesa", &["zipline", "adventure", "aerial"]),
    ("escalada", &["climbing", "rock climbing", "adventure"]),
    ("museu", &["museum", "exhibition", "collection"]),
    ("teatro", &["theater", "stage", "performance"]),
    ("cinema", &["cinema", "movie", "theater"]),
    ("galeria", &["gallery", "art", "artwork"]),
    ("cultural", &["culture", "cultural", "heritage"]),
    ("arte", &["art", "artistic", "creative"]),
    ("artesanato", &["handicraft", "artisan", "handmade"]),
    ("praia", &["beach", "ocean", "seaside"]),
    ("lagoa", &["lagoon", "lake", "water"]),
    ("trilha", &["trail", "hiking", "nature"]),
    ("natureza", &["nature", "natural", "outdoor"]),
    ("jardim", &["garden", "botanical", "plants"]),
    ("bosque", &["forest", "woods", "trees"]),
    ("ciclovia", &["bike path", "cycling", "bicycle"]),
    ("bike", &["bicycle", "cycling", "bike ride"]),
    ("cachoeira", &["waterfall", "cascade", "nature"]),
    ("mirante", &["viewpoint", "panorama", "scenic view"]),
    ("litoranea", &["coastal", "waterfront", "seaside"]),
    ("karaoke", &["karaoke", "singing", "entertainment"]),
    ("boteco", &["bar", "pub", "casual drinks"]),
    ("feirinha", &["craft fair", "market", "local market"]),
];

const MAX_NAME_KEYWORDS: usize = 3;
const QUERY_QUALIFIER: &str = "brazil";

fn category_terms(category: Category) -> &'static [&'static str] {
    match category {
        Category::Gastronomia => &["restaurant", "food", "dining"],
        Category::Aventura => &["adventure", "outdoor activities", "fun"],
        Category::Cultura => &["museum", "art", "culture"],
        Category::AoArLivre => &["nature", "outdoor", "landscape"],
        Category::Casual => &["cafe", "cozy place", "relaxing"],
    }
}

/// Local asset served when no photo could be resolved.
pub fn placeholder_image(category: Category) -> &'static str {
    match category {
        Category::Gastronomia => "/images/defaults/gastronomia.svg",
        Category::Aventura => "/images/defaults/aventura.svg",
        Category::Cultura => "/images/defaults/cultura.svg",
        Category::AoArLivre => "/images/defaults/ao-ar-livre.svg",
        Category::Casual => "/images/defaults/casual.svg",
    }
}

/// Stock photo used by the demonstration (catalog) mode, one per category.
pub fn stock_image(category: Category) -> &'static str {
    match category {
        Category::Gastronomia => "https://images.unsplash.com/photo-1667388968964-4aa652df0a9b?crop=entropy&cs=tinysrgb&fit=max&fm=jpg&q=80&w=1080",
        Category::Cultura => "https://images.unsplash.com/photo-1720614601463-eb37e9e2faa2?crop=entropy&cs=tinysrgb&fit=max&fm=jpg&q=80&w=1080",
        Category::AoArLivre => "https://images.unsplash.com/photo-1663947735960-a753dc0ac98c?crop=entropy&cs=tinysrgb&fit=max&fm=jpg&q=80&w=1080",
        Category::Aventura => "https://images.unsplash.com/photo-1753605859456-1096e0f15d26?crop=entropy&cs=tinysrgb&fit=max&fm=jpg&q=80&w=1080",
        Category::Casual => "https://images.unsplash.com/photo-1752440475364-25462d1fe938?crop=entropy&cs=tinysrgb&fit=max&fm=jpg&q=80&w=1080",
    }
}

fn fold_accents(input: &str) -> String {
    input
        .chars()
        .map(|ch| match ch {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// Search query for a venue: terms harvested from keywords inside the name, or
/// the category's fixed terms when the name says nothing useful.
pub fn build_search_query(name: &str, category: Category) -> String {
    let folded = fold_accents(&name.to_lowercase());

    let mut terms: Vec<&str> = Vec::new();
    for (keyword, keyword_terms) in KEYWORD_MAPPING {
        if folded.contains(keyword) {
            terms.extend(keyword_terms.iter());
        }
    }
    terms.truncate(MAX_NAME_KEYWORDS);

    if terms.is_empty() {
        terms.extend(category_terms(category).iter());
    }

    format!("{} {}", terms.join(" "), QUERY_QUALIFIER)
}

/// One-result photo search. The Pexels client is the production transport;
/// tests plug in counting doubles.
pub trait PhotoSearch {
    fn search_one(
        &self,
        query: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, ImageError>>;
}

pub struct PexelsClient {
    api_key: Option<String>,
    client: Client,
}

impl PexelsClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            client: Client::new(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var("PEXELS_API_KEY").ok())
    }
}

#[derive(Debug, Deserialize)]
struct PexelsResponse {
    #[serde(default)]
    photos: Vec<PexelsPhoto>,
}

#[derive(Debug, Deserialize)]
struct PexelsPhoto {
    src: PexelsSrc,
}

#[derive(Debug, Deserialize)]
struct PexelsSrc {
    large: String,
}

impl PhotoSearch for PexelsClient {
    async fn search_one(&self, query: &str) -> Result<Option<String>, ImageError> {
        let api_key = self.api_key.as_ref().ok_or(ImageError::MissingApiKey)?;

        let mut url =
            reqwest::Url::parse(PEXELS_SEARCH_URL).map_err(|err| ImageError::Http(err.to_string()))?;
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("per_page", &PEXELS_PER_PAGE.to_string())
            .append_pair("locale", PEXELS_LOCALE);

        let response = self
            .client
            .get(url)
            .header("Authorization", api_key)
            .send()
            .await
            .map_err(|err| ImageError::Http(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::Http(format!("status {}", status)));
        }

        let payload: PexelsResponse = response
            .json()
            .await
            .map_err(|err| ImageError::Parse(err.to_string()))?;

        Ok(payload.photos.into_iter().next().map(|photo| photo.src.large))
    }
}

/// Session-scoped name+category → URL memo. Entries never expire; a same-key
/// race overwrites with an identical value, which is fine.
#[derive(Default)]
pub struct ImageCache {
    entries: Mutex<HashMap<String, String>>,
}

impl ImageCache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .expect("image cache poisoned")
            .get(key)
            .cloned()
    }

    fn insert(&self, key: String, url: String) {
        self.entries
            .lock()
            .expect("image cache poisoned")
            .insert(key, url);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("image cache poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn cache_key(name: &str, category: Category) -> String {
    format!("{}-{}", name, category.as_str())
}

pub struct ImageResolver<S> {
    search: S,
    cache: ImageCache,
}

impl<S: PhotoSearch> ImageResolver<S> {
    pub fn new(search: S) -> Self {
        Self {
            search,
            cache: ImageCache::default(),
        }
    }

    /// Image URL for a venue. Cache hit short-circuits the transport; every
    /// outcome, placeholder included, is cached so repeat lookups stay free.
    pub async fn resolve(&self, name: &str, category: Category) -> String {
        let key = cache_key(name, category);
        if let Some(cached) = self.cache.get(&key) {
            return cached;
        }

        let query = build_search_query(name, category);
        let url = match self.search.search_one(&query).await {
            Ok(Some(url)) => url,
            Ok(None) => placeholder_image(category).to_string(),
            Err(err) => {
                log::warn!("busca de imagem falhou para \"{}\": {}", name, err);
                placeholder_image(category).to_string()
            }
        };

        self.cache.insert(key, url.clone());
        url
    }

    pub async fn resolve_place(&self, place: &Place) -> String {
        self.resolve(&place.name, place.category).await
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }
}
