use once_cell::sync::Lazy;
use rand::Rng;

use crate::models::{Budget, Category, Period, Place, PlaceFilters};

/// Upper bound on candidates returned by a catalog search.
pub const MAX_CATALOG_CANDIDATES: usize = 20;

static CATALOG: Lazy<Vec<Place>> = Lazy::new(|| {
    vec![
        place(
            "1",
            "Pizzaria do Bairro",
            "Pizzaria tradicional com massa artesanal e ingredientes frescos. Ambiente aconchegante perfeito para casais.",
            "Rua das Flores, 123 - Centro",
            Budget::Economico,
            Category::Gastronomia,
            Period::Noite,
            &["romântico", "tradicional", "pizza artesanal"],
            4.3,
            "Experimente a pizza margherita com borda recheada e depois caminhem pela praça que fica a 2 quarteirões.",
            "Ter a Dom: 18h às 23h",
        ),
        place(
            "2",
            "Café Central",
            "Cafeteria charmosa com grãos especiais e doces caseiros. Ideal para um encontro durante o dia.",
            "Av. Principal, 456 - Centro",
            Budget::Economico,
            Category::Gastronomia,
            Period::Dia,
            &["café especial", "doces caseiros", "aconchegante"],
            4.5,
            "Provem o café coado na hora com o bolo de chocolate da casa. Aproveitem para ler juntos na área externa.",
            "Seg a Sáb: 7h às 18h",
        ),
        place(
            "3",
            "Bistrô da Vila",
            "Restaurante contemporâneo com pratos autorais e carta de vinhos selecionada.",
            "Rua dos Artistas, 789 - Vila Criativa",
            Budget::Moderado,
            Category::Gastronomia,
            Period::Noite,
            &["pratos autorais", "vinhos", "sofisticado", "romântico"],
            4.7,
            "Peçam o menu degustação do chef e harmonizem com a sugestão de vinho da casa.",
            "Qua a Dom: 19h às 23h",
        ),
        place(
            "4",
            "Le Jardin",
            "Restaurante francês com chef premiado e ambiente elegante em casa histórica.",
            "Alameda dos Franceses, 100 - Jardins",
            Budget::Sofisticado,
            Category::Gastronomia,
            Period::Noite,
            &["francesa", "chef premiado", "elegante", "casa histórica"],
            4.9,
            "Reservem a mesa no jardim e experimentem o menu de 7 pratos com harmonização de vinhos franceses.",
            "Ter a Sáb: 19h30 às 22h30",
        ),
        place(
            "5",
            "Cinema do Centro Cultural",
            "Cinema alternativo que exibe filmes independentes e clássicos em ambiente intimista.",
            "Rua Cultural, 321 - Centro Histórico",
            Budget::Economico,
            Category::Cultura,
            Period::Noite,
            &["cinema alternativo", "filmes independentes", "intimista"],
            4.4,
            "Assistam um filme indie e depois conversem sobre ele no café do centro cultural.",
            "Ter a Dom: 14h às 22h",
        ),
        place(
            "6",
            "Museu da História Local",
            "Pequeno museu com exposições interativas sobre a história da cidade.",
            "Praça da Memória, s/n - Centro Histórico",
            Budget::Economico,
            Category::Cultura,
            Period::Dia,
            &["história local", "interativo", "educativo"],
            4.2,
            "Façam a visita guiada e depois relaxem no jardim do museu com um lanche.",
            "Qua a Dom: 9h às 17h",
        ),
        place(
            "7",
            "Parque das Águas",
            "Parque urbano com lago, trilhas leves e área para piquenique.",
            "Av. das Águas, 1000 - Zona Norte",
            Budget::Economico,
            Category::AoArLivre,
            Period::Dia,
            &["lago", "trilhas", "piquenique", "natureza"],
            4.6,
            "Façam a trilha do lago e aproveitem para um piquenique na área sombreada. Levem um lanche gostoso!",
            "Todos os dias: 6h às 18h",
        ),
        place(
            "8",
            "Mirante do Pôr do Sol",
            "Ponto alto da cidade com vista panorâmica, perfeito para o final da tarde.",
            "Estrada do Mirante, km 5 - Serra",
            Budget::Economico,
            Category::AoArLivre,
            Period::Dia,
            &["vista panorâmica", "pôr do sol", "romântico", "fotografia"],
            4.8,
            "Cheguem 30 minutos antes do pôr do sol, levem uma canga e apreciem a vista com alguns snacks.",
            "Todos os dias: 6h às 19h",
        ),
        place(
            "9",
            "Trilha da Cachoeira",
            "Trilha moderada de 2km que leva a uma bela cachoeira com poço para banho.",
            "Entrada pela Estrada Rural, km 12",
            Budget::Moderado,
            Category::Aventura,
            Period::Dia,
            &["trilha", "cachoeira", "natureza", "refrescante"],
            4.7,
            "Levem água, lanche e roupa de banho. A trilha dura 40 minutos e vocês podem se refrescar na cachoeira.",
            "Todos os dias: 7h às 16h",
        ),
        place(
            "10",
            "Bar do Zé",
            "Boteco tradicional com petiscos caseiros e chopp gelado. Ambiente descontraído.",
            "Rua da Alegria, 678 - Bairro Boêmio",
            Budget::Economico,
            Category::Casual,
            Period::Noite,
            &["boteco", "petiscos", "chopp", "descontraído"],
            4.3,
            "Experimentem o bolinho de bacalhau com chopp gelado e conversem sobre a vida na mesa da calçada.",
            "Ter a Dom: 17h às 24h",
        ),
        place(
            "11",
            "Rooftop Sky Bar",
            "Bar na cobertura com vista da cidade, drinks autorais e música ambiente.",
            "Ed. Central Tower, último andar - Centro",
            Budget::Sofisticado,
            Category::Casual,
            Period::Noite,
            &["rooftop", "vista cidade", "drinks autorais", "sofisticado"],
            4.8,
            "Cheguem no horário do happy hour e peçam o drink da casa enquanto apreciam a vista.",
            "Qua a Sáb: 18h às 2h",
        ),
        place(
            "12",
            "Teatro Municipal",
            "Teatro histórico que apresenta peças locais, música e espetáculos de dança.",
            "Praça da Cultura, 1 - Centro",
            Budget::Moderado,
            Category::Cultura,
            Period::Noite,
            &["teatro", "histórico", "espetáculos", "cultura local"],
            4.5,
            "Vejam a programação mensal e reservem um espetáculo. Jantem antes no restaurante do teatro.",
            "Conforme programação",
        ),
    ]
});

#[allow(clippy::too_many_arguments)]
fn place(
    id: &str,
    name: &str,
    description: &str,
    address: &str,
    budget: Budget,
    category: Category,
    period: Period,
    tags: &[&str],
    rating: f64,
    suggested_activity: &str,
    opening_hours: &str,
) -> Place {
    let mut map_url = reqwest::Url::parse("https://maps.google.com/maps").expect("maps base url");
    map_url.query_pairs_mut().append_pair("q", name);

    Place {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        address: address.to_string(),
        map_url: map_url.to_string(),
        budget,
        category,
        period,
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
        image_url: String::new(),
        rating,
        suggested_activity: suggested_activity.to_string(),
        opening_hours: opening_hours.to_string(),
        special_tip: String::new(),
        ai_recommended: false,
        parking_available: None,
        accessible: None,
    }
}

pub fn catalog() -> &'static [Place] {
    &CATALOG
}

/// Venues whose budget, category and period all equal the selection's. Optional
/// selection fields are ignored here. Catalog order is preserved and a selection
/// with nothing matching yields an empty vec.
pub fn filter_places(filters: &PlaceFilters) -> Vec<Place> {
    CATALOG
        .iter()
        .filter(|place| {
            filters.budget == Some(place.budget)
                && filters.category == Some(place.category)
                && filters.period == Some(place.period)
        })
        .take(MAX_CATALOG_CANDIDATES)
        .cloned()
        .collect()
}

/// Uniform pick over a candidate list. Empty input is an explicit `None`, not
/// an error; callers branch before presenting anything.
pub fn random_place<'a, R: Rng + ?Sized>(places: &'a [Place], rng: &mut R) -> Option<&'a Place> {
    if places.is_empty() {
        return None;
    }
    let index = rng.gen_range(0..places.len());
    places.get(index)
}

pub fn pick_random(places: &[Place]) -> Option<&Place> {
    random_place(places, &mut rand::thread_rng())
}
