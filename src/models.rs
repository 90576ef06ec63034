use serde::{Deserialize, Serialize};

/// Faixa de preço por pessoa. Wire values are the literal `$` tiers.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Budget {
    #[serde(rename = "$")]
    Economico,
    #[serde(rename = "$$")]
    Moderado,
    #[serde(rename = "$$$")]
    Sofisticado,
}

impl Budget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Budget::Economico => "$",
            Budget::Moderado => "$$",
            Budget::Sofisticado => "$$$",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    #[serde(rename = "gastronomia")]
    Gastronomia,
    #[serde(rename = "cultura")]
    Cultura,
    #[serde(rename = "ao-ar-livre")]
    AoArLivre,
    #[serde(rename = "aventura")]
    Aventura,
    #[serde(rename = "casual")]
    Casual,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Gastronomia => "gastronomia",
            Category::Cultura => "cultura",
            Category::AoArLivre => "ao-ar-livre",
            Category::Aventura => "aventura",
            Category::Casual => "casual",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Period {
    #[serde(rename = "dia")]
    Dia,
    #[serde(rename = "noite")]
    Noite,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Dia => "dia",
            Period::Noite => "noite",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: String, // catalog: sequential; gemini: "gemini-<millis>-<idx>"
    pub name: String,
    pub description: String,
    pub address: String,
    pub map_url: String,
    pub budget: Budget,
    #[serde(rename = "type")]
    pub category: Category,
    pub period: Period,
    pub tags: Vec<String>,
    pub image_url: String,
    pub rating: f64,
    pub suggested_activity: String,
    pub opening_hours: String,
    #[serde(default)]
    pub special_tip: String,
    #[serde(default)]
    pub ai_recommended: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parking_available: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessible: Option<bool>,
}

/// Seleção corrente do usuário. The three mandatory fields stay `None` until
/// picked; `ambiente`/`distancia`/`tem_estacionamento`/`acessivel` are carried
/// through but never participate in catalog matching.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlaceFilters {
    pub budget: Option<Budget>,
    #[serde(rename = "type")]
    pub category: Option<Category>,
    pub period: Option<Period>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ambiente: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distancia: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tem_estacionamento: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acessivel: Option<bool>,
}

impl PlaceFilters {
    pub fn new(budget: Budget, category: Category, period: Period) -> Self {
        Self {
            budget: Some(budget),
            category: Some(category),
            period: Some(period),
            ..Self::default()
        }
    }

    /// The mandatory trio, present only once all three were picked.
    pub fn required(&self) -> Option<(Budget, Category, Period)> {
        match (self.budget, self.category, self.period) {
            (Some(budget), Some(category), Some(period)) => Some((budget, category, period)),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}
