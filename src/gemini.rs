use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

use crate::models::{Budget, Category, GeoPoint, Period, Place, PlaceFilters};

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("filtros ou localização incompletos")]
    InvalidRequest,
    #[error("chave da API Gemini não configurada")]
    MissingApiKey,
    #[error("serviço de recomendações indisponível: {0}")]
    Upstream(String),
    #[error("resposta da IA fora do formato esperado: {0}")]
    MalformedAiResponse(String),
}

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const TEMPERATURE: f64 = 0.8;
const TOP_P: f64 = 0.95;
const TOP_K: u32 = 40;
const MAX_OUTPUT_TOKENS: u32 = 8192;

/// How many venues one recommendation round asks the model for.
pub const AI_RECOMMENDATION_COUNT: usize = 5;

const CITY_QUALIFIER: &str = "São Luís MA";

static CITATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\[\d+(?:\s*,\s*\d+)*\]").expect("citation regex"));
// Greedy first-{ to last-}: nested braces stay inside the match.
static JSON_BLOCK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("json regex"));

pub struct GeminiClient {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

impl GeminiClient {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            client: Client::new(),
        }
    }

    pub fn from_env() -> Self {
        let endpoint =
            std::env::var("GEMINI_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self::new(endpoint, model, std::env::var("GEMINI_API_KEY").ok())
    }

    /// Up to [`AI_RECOMMENDATION_COUNT`] real-venue candidates for the given
    /// selection and coordinates. Performs no fallback itself; callers drop to
    /// the local catalog on any error.
    pub async fn fetch_recommendations(
        &self,
        filters: &PlaceFilters,
        location: GeoPoint,
    ) -> Result<Vec<Place>, RecommendError> {
        let (budget, category, period) = filters
            .required()
            .filter(|_| location.is_finite())
            .ok_or(RecommendError::InvalidRequest)?;
        let api_key = self.api_key.as_ref().ok_or(RecommendError::MissingApiKey)?;

        let base = self.endpoint.trim_end_matches('/');
        let mut url =
            reqwest::Url::parse(&format!("{}/models/{}:generateContent", base, self.model))
                .map_err(|err| RecommendError::Upstream(err.to_string()))?;
        url.query_pairs_mut().append_pair("key", api_key);

        let payload = json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": build_prompt(budget, category, period, location) }]
                }
            ],
            "generationConfig": {
                "temperature": TEMPERATURE,
                "topP": TOP_P,
                "topK": TOP_K,
                "maxOutputTokens": MAX_OUTPUT_TOKENS
            }
        });

        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|err| RecommendError::Upstream(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| RecommendError::Upstream(err.to_string()))?;
        if !status.is_success() {
            return Err(RecommendError::Upstream(format!("HTTP {}: {}", status, body)));
        }

        let envelope: Value = serde_json::from_str(&body)
            .map_err(|err| RecommendError::Upstream(err.to_string()))?;
        let reply = envelope
            .get("candidates")
            .and_then(|candidates| candidates.as_array())
            .and_then(|candidates| candidates.first())
            .and_then(|candidate| candidate.get("content"))
            .and_then(|content| content.get("parts"))
            .and_then(|parts| parts.as_array())
            .and_then(|parts| parts.first())
            .and_then(|part| part.get("text"))
            .and_then(|text| text.as_str())
            .ok_or_else(|| RecommendError::Upstream("resposta sem conteúdo".to_string()))?;

        normalize_reply(reply, budget, category, period, Utc::now().timestamp_millis())
    }
}

fn budget_desc(budget: Budget) -> &'static str {
    match budget {
        Budget::Economico => "econômico e acessível (até R$50 por pessoa)",
        Budget::Moderado => "preço moderado (R$50-150 por pessoa)",
        Budget::Sofisticado => "sofisticado e premium (acima de R$150 por pessoa)",
    }
}

fn category_desc(category: Category) -> &'static str {
    match category {
        Category::Gastronomia => {
            "gastronomia, incluindo restaurantes, cafés, bares, pizzarias, sushi, hamburguerias"
        }
        Category::Cultura => {
            "cultura e entretenimento, como museus, teatros, cinemas, galerias de arte, exposições"
        }
        Category::AoArLivre => {
            "atividades ao ar livre, como parques, praias, trilhas, jardins, mirantes"
        }
        Category::Aventura => {
            "aventura e atividades radicais, como escalada, tirolesa, paintball, kart, parques de diversão"
        }
        Category::Casual => {
            "lugares casuais e descontraídos, como cafés, bares tranquilos, lounges, sorveterias"
        }
    }
}

fn period_desc(period: Period) -> &'static str {
    match period {
        Period::Dia => "durante o dia",
        Period::Noite => "à noite",
    }
}

fn build_prompt(budget: Budget, category: Category, period: Period, location: GeoPoint) -> String {
    format!(
        "Você é um especialista em recomendações românticas para casais em São Luís, Maranhão, Brasil.\n\n\
         MISSÃO: Encontre os {count} MELHORES lugares REAIS em São Luís/MA para um casal com as seguintes preferências:\n\n\
         LOCALIZAÇÃO:\n\
         - Latitude: {lat}\n\
         - Longitude: {lng}\n\
         - Cidade: São Luís, Maranhão, Brasil\n\n\
         ORÇAMENTO: {budget}\n\
         TIPO DE EXPERIÊNCIA: {category}\n\
         PERÍODO: {period}\n\n\
         INSTRUÇÕES:\n\
         1. Considere apenas lugares REAIS e ATUAIS em São Luís/MA\n\
         2. Priorize estabelecimentos com boa reputação e avaliações positivas\n\
         3. Ambiente adequado para casais (romântico)\n\
         4. Preços compatíveis com o orçamento\n\
         5. Horário de funcionamento adequado ({period})\n\n\
         PARA CADA LUGAR:\n\
         - Nome completo do estabelecimento\n\
         - Endereço completo (rua, número, bairro)\n\
         - Descrição de por que é perfeito (2-3 frases)\n\
         - Avaliação (se disponível)\n\
         - Horário de funcionamento\n\
         - Sugestão de atividade romântica\n\
         - Dica especial\n\n\
         RETORNE JSON NESTE FORMATO:\n\
         {{\n\
           \"recommendations\": [\n\
             {{\n\
               \"name\": \"Nome do Lugar\",\n\
               \"address\": \"Endereço completo\",\n\
               \"description\": \"Por que é perfeito\",\n\
               \"rating\": 4.5,\n\
               \"openingHours\": \"Horários\",\n\
               \"romanticActivity\": \"Sugestão romântica\",\n\
               \"specialTip\": \"Dica especial\"\n\
             }}\n\
           ]\n\
         }}\n\n\
         IMPORTANTE: NÃO invente lugares. NÃO inclua marcadores de citação como [1] ou [2, 3] nos textos. Retorne APENAS JSON.",
        count = AI_RECOMMENDATION_COUNT,
        lat = location.latitude,
        lng = location.longitude,
        budget = budget_desc(budget),
        category = category_desc(category),
        period = period_desc(period),
    )
}

/// Two-stage tolerant parse of the model's free text: direct JSON first, then
/// the greedy `{...}` block buried in surrounding prose.
fn parse_reply(reply: &str) -> Result<Value, RecommendError> {
    if let Ok(value) = serde_json::from_str::<Value>(reply) {
        return Ok(value);
    }

    let block = JSON_BLOCK_RE
        .find(reply)
        .ok_or_else(|| RecommendError::MalformedAiResponse("nenhum JSON na resposta".to_string()))?;
    serde_json::from_str(block.as_str())
        .map_err(|err| RecommendError::MalformedAiResponse(err.to_string()))
}

pub(crate) fn normalize_reply(
    reply: &str,
    budget: Budget,
    category: Category,
    period: Period,
    stamp_millis: i64,
) -> Result<Vec<Place>, RecommendError> {
    let parsed = parse_reply(reply)?;
    let records = parsed
        .get("recommendations")
        .and_then(|value| value.as_array())
        .ok_or_else(|| {
            RecommendError::MalformedAiResponse("campo 'recommendations' ausente".to_string())
        })?;

    Ok(records
        .iter()
        .take(AI_RECOMMENDATION_COUNT)
        .enumerate()
        .map(|(index, record)| normalize_record(record, index, budget, category, period, stamp_millis))
        .collect())
}

fn normalize_record(
    record: &Value,
    index: usize,
    budget: Budget,
    category: Category,
    period: Period,
    stamp_millis: i64,
) -> Place {
    let name = text_or(record, "name", "Lugar sem nome");
    let address = text_or(record, "address", "São Luís, MA");

    // Categorical fields come from the request, never from the model, so
    // downstream equality filtering keeps working.
    Place {
        id: format!("gemini-{}-{}", stamp_millis, index),
        map_url: build_map_url(&name, &address),
        description: strip_citations(&text_or(record, "description", "Descrição não disponível")),
        suggested_activity: strip_citations(&text_or(record, "romanticActivity", "Aproveitem juntos")),
        special_tip: strip_citations(&text_or(record, "specialTip", "")),
        opening_hours: text_or(record, "openingHours", "Consultar horários"),
        rating: record
            .get("rating")
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
            .clamp(0.0, 5.0),
        tags: vec!["romântico".to_string(), "gemini-recomendado".to_string()],
        image_url: String::new(),
        ai_recommended: true,
        parking_available: None,
        accessible: None,
        name,
        address,
        budget,
        category,
        period,
    }
}

fn text_or(record: &Value, field: &str, fallback: &str) -> String {
    record
        .get(field)
        .and_then(|value| value.as_str())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

pub(crate) fn strip_citations(text: &str) -> String {
    CITATION_RE.replace_all(text, "").trim().to_string()
}

fn build_map_url(name: &str, address: &str) -> String {
    let mut url = reqwest::Url::parse("https://maps.google.com/maps").expect("maps base url");
    url.query_pairs_mut()
        .append_pair("q", &format!("{} {} {}", name, address, CITY_QUALIFIER));
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_REPLY: &str = r#"{
        "recommendations": [
            {"name": "Cabana do Sol", "address": "Av. Litorânea, 100 - Calhau", "description": "Frutos do mar à beira-mar [1].", "rating": 4.6, "openingHours": "Todos os dias: 11h às 23h", "romanticActivity": "Jantem vendo o pôr do sol [2, 3].", "specialTip": "Peçam o arroz de cuxá [4]."},
            {"name": "Restaurante Dom Francisco", "address": "Rua do Giz, 22 - Centro Histórico", "description": "Casarão colonial com comida típica.", "rating": 4.4, "openingHours": "Ter a Dom: 12h às 22h", "romanticActivity": "Passeiem pelo centro histórico depois do jantar.", "specialTip": "Reserve a mesa da varanda."},
            {"name": "Bistrô Lagoa", "address": "Av. dos Holandeses, 5 - Ponta d'Areia"},
            {"name": "Café do Theatro", "address": "Rua do Sol, 180 - Centro", "description": "Café histórico ao lado do teatro.", "rating": 4.2},
            {"name": "Varanda do Mar", "address": "Av. Litorânea, 900 - São Marcos", "description": "Vista aberta para a praia.", "rating": 4.8, "romanticActivity": "Brindem no fim de tarde."}
        ]
    }"#;

    #[test]
    fn strips_citation_markers() {
        assert_eq!(strip_citations("Ótimo lugar [1][2]."), "Ótimo lugar.");
        assert_eq!(strip_citations("Vista linda [1, 2] à noite"), "Vista linda à noite");
        assert_eq!(strip_citations("Sem marcadores"), "Sem marcadores");
        assert_eq!(strip_citations("No fim [12]"), "No fim");
    }

    #[test]
    fn parses_direct_json_reply() {
        let places = normalize_reply(
            SAMPLE_REPLY,
            Budget::Moderado,
            Category::Gastronomia,
            Period::Noite,
            1_000,
        )
        .expect("direct json reply");
        assert_eq!(places.len(), 5);
    }

    #[test]
    fn extracts_json_embedded_in_prose() {
        let reply = format!(
            "Claro! Aqui estão as sugestões para vocês:\n\n{}\n\nEspero que gostem!",
            SAMPLE_REPLY
        );
        let places = normalize_reply(
            &reply,
            Budget::Moderado,
            Category::Gastronomia,
            Period::Noite,
            1_000,
        )
        .expect("embedded json reply");
        assert_eq!(places.len(), 5);
        assert_eq!(places[0].name, "Cabana do Sol");
    }

    #[test]
    fn nested_braces_survive_extraction() {
        let reply = r#"Segue: {"recommendations": [{"name": "Café {Central}", "address": "Rua A, 1"}]} fim."#;
        let places = normalize_reply(
            reply,
            Budget::Economico,
            Category::Casual,
            Period::Dia,
            1_000,
        )
        .expect("nested braces reply");
        assert_eq!(places[0].name, "Café {Central}");
    }

    #[test]
    fn valid_json_without_recommendations_is_malformed() {
        let reply = r#"{"places": [{"name": "Qualquer"}]}"#;
        let err = normalize_reply(
            reply,
            Budget::Economico,
            Category::Casual,
            Period::Dia,
            1_000,
        )
        .expect_err("missing recommendations array");
        assert!(matches!(err, RecommendError::MalformedAiResponse(_)));
    }

    #[test]
    fn reply_without_any_json_is_malformed() {
        let err = normalize_reply(
            "Desculpe, não consegui encontrar lugares.",
            Budget::Economico,
            Category::Casual,
            Period::Dia,
            1_000,
        )
        .expect_err("no json at all");
        assert!(matches!(err, RecommendError::MalformedAiResponse(_)));
    }

    #[test]
    fn normalization_copies_request_fields_and_marks_ai() {
        let places = normalize_reply(
            SAMPLE_REPLY,
            Budget::Sofisticado,
            Category::Cultura,
            Period::Dia,
            99,
        )
        .expect("sample reply");

        assert_eq!(places.len(), 5);
        for (index, place) in places.iter().enumerate() {
            assert_eq!(place.budget, Budget::Sofisticado);
            assert_eq!(place.category, Category::Cultura);
            assert_eq!(place.period, Period::Dia);
            assert!(place.ai_recommended);
            assert_eq!(place.id, format!("gemini-99-{}", index));
        }

        assert_eq!(places[0].description, "Frutos do mar à beira-mar.");
        assert_eq!(places[0].suggested_activity, "Jantem vendo o pôr do sol.");
        assert_eq!(places[0].special_tip, "Peçam o arroz de cuxá.");
    }

    #[test]
    fn missing_fields_fall_back_to_placeholders() {
        let places = normalize_reply(
            SAMPLE_REPLY,
            Budget::Moderado,
            Category::Gastronomia,
            Period::Noite,
            1,
        )
        .expect("sample reply");

        let sparse = &places[2];
        assert_eq!(sparse.description, "Descrição não disponível");
        assert_eq!(sparse.suggested_activity, "Aproveitem juntos");
        assert_eq!(sparse.opening_hours, "Consultar horários");
        assert_eq!(sparse.special_tip, "");
        assert_eq!(sparse.rating, 0.0);
    }

    #[test]
    fn map_url_is_percent_encoded() {
        let places = normalize_reply(
            SAMPLE_REPLY,
            Budget::Moderado,
            Category::Gastronomia,
            Period::Noite,
            1,
        )
        .expect("sample reply");

        let url = &places[0].map_url;
        assert!(url.starts_with("https://maps.google.com/maps?q="));
        assert!(!url.contains(' '));
        assert!(url.contains("Cabana"));
    }

    #[test]
    fn excess_records_are_capped() {
        let mut records = Vec::new();
        for index in 0..8 {
            records.push(serde_json::json!({
                "name": format!("Lugar {}", index),
                "address": "Rua B, 2"
            }));
        }
        let reply = serde_json::json!({ "recommendations": records }).to_string();
        let places = normalize_reply(
            &reply,
            Budget::Economico,
            Category::Casual,
            Period::Noite,
            1,
        )
        .expect("capped reply");
        assert_eq!(places.len(), AI_RECOMMENDATION_COUNT);
    }

    #[tokio::test]
    async fn incomplete_request_fails_before_any_network_call() {
        let client = GeminiClient::new(DEFAULT_ENDPOINT, DEFAULT_MODEL, None);

        let incomplete = PlaceFilters::default();
        let location = GeoPoint {
            latitude: -2.53,
            longitude: -44.30,
        };
        let err = client
            .fetch_recommendations(&incomplete, location)
            .await
            .expect_err("incomplete filters");
        // InvalidRequest wins over the missing key: validation precedes I/O.
        assert!(matches!(err, RecommendError::InvalidRequest));

        let filters = PlaceFilters::new(Budget::Economico, Category::Gastronomia, Period::Noite);
        let bad_location = GeoPoint {
            latitude: f64::NAN,
            longitude: -44.30,
        };
        let err = client
            .fetch_recommendations(&filters, bad_location)
            .await
            .expect_err("non-finite coordinates");
        assert!(matches!(err, RecommendError::InvalidRequest));

        let err = client
            .fetch_recommendations(&filters, location)
            .await
            .expect_err("missing api key");
        assert!(matches!(err, RecommendError::MissingApiKey));
    }
}
