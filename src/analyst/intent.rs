use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What a free-text query is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    NewCustomers,
    AbandonedCarts,
    OrderStatus,
    SalesSummary,
    TopProducts,
    Unknown,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NewCustomers => "new_customers",
            Self::AbandonedCarts => "abandoned_carts",
            Self::OrderStatus => "order_status",
            Self::SalesSummary => "sales_summary",
            Self::TopProducts => "top_products",
            Self::Unknown => "unknown",
        }
    }

    /// Backends the intent depends on, in dependency order.
    pub fn required_backends(self) -> &'static [BackendName] {
        match self {
            Self::NewCustomers => &[BackendName::Sql],
            Self::AbandonedCarts => &[BackendName::Analytics],
            Self::OrderStatus => &[BackendName::Sql, BackendName::Rest],
            Self::SalesSummary => &[BackendName::Sql, BackendName::Rest],
            Self::TopProducts => &[BackendName::Rest],
            Self::Unknown => &[],
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The backend MCP servers the orchestrator knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BackendName {
    /// Customers, orders and sales figures.
    Sql,
    /// User behaviour and carts.
    Analytics,
    /// Inventory, shipping and product rankings.
    Rest,
}

impl BackendName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sql => "sql",
            Self::Analytics => "analytics",
            Self::Rest => "rest",
        }
    }
}

impl std::fmt::Display for BackendName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedIntent {
    pub intent: Intent,
    /// Sorted by key, which keeps cache keys stable.
    pub parameters: BTreeMap<String, String>,
    pub required_backends: Vec<BackendName>,
    pub original_query: String,
}

impl ParsedIntent {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }
}

/// Phrase groups per intent. First match wins, so the more specific phrases
/// of overlapping intents must come first.
const INTENT_PHRASES: &[(Intent, &[&str])] = &[
    (
        Intent::NewCustomers,
        &[
            "clientes nuevos",
            "nuevos clientes",
            "clientes registrados",
            "new customers",
            "registered customers",
        ],
    ),
    (
        Intent::AbandonedCarts,
        &[
            "carrito abandonado",
            "carritos abandonados",
            "abandonaron carrito",
            "abandonaron el carrito",
            "abandoned cart",
        ],
    ),
    (
        Intent::OrderStatus,
        &[
            "estado pedido",
            "estado del pedido",
            "rastrear pedido",
            "seguimiento pedido",
            "order status",
            "status of order",
            "track order",
        ],
    ),
    (
        Intent::SalesSummary,
        &[
            "resumen ventas",
            "resumen de ventas",
            "ventas totales",
            "ventas del",
            "ventas de la",
            "sales summary",
            "total sales",
        ],
    ),
    (
        Intent::TopProducts,
        &[
            "productos más vendidos",
            "productos mas vendidos",
            "top productos",
            "productos populares",
            "mejores productos",
            "top products",
            "best selling",
            "best-selling",
        ],
    ),
];

const CITIES: &[&str] = &["madrid", "barcelona", "sevilla", "valencia", "bilbao"];

const COUNTRIES: &[(&[&str], &str)] = &[
    (&["españa", "spain"], "España"),
    (&["méxico", "mexico"], "México"),
];

static ORDER_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:pedido|order)\s+#?(\d+)").expect("order id pattern"));
static HOURS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+)\s+(?:horas?|hours?)\b").expect("hours pattern"));
static WEEK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:semana|week)\b").expect("week pattern"));
static MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:mes|month)\b").expect("month pattern"));
static DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:hoy|día|dia|day|today)\b").expect("day pattern"));

/// Keyword classifier for Spanish and English analyst questions.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, text: &str) -> ParsedIntent {
        let lowered = text.to_lowercase();
        let intent = detect_intent(&lowered);

        let parameters = if intent == Intent::Unknown {
            BTreeMap::new()
        } else {
            extract_parameters(&lowered)
        };

        ParsedIntent {
            intent,
            parameters,
            required_backends: intent.required_backends().to_vec(),
            original_query: text.to_string(),
        }
    }
}

fn detect_intent(lowered: &str) -> Intent {
    INTENT_PHRASES
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|p| lowered.contains(p)))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::Unknown)
}

fn extract_parameters(lowered: &str) -> BTreeMap<String, String> {
    let mut parameters = BTreeMap::new();

    if let Some(city) = CITIES.iter().find(|c| lowered.contains(**c)) {
        parameters.insert("city".to_string(), capitalize(city));
    }

    if let Some((_, country)) = COUNTRIES
        .iter()
        .find(|(aliases, _)| aliases.iter().any(|a| lowered.contains(a)))
    {
        parameters.insert("country".to_string(), country.to_string());
    }

    if let Some(caps) = ORDER_ID.captures(lowered) {
        parameters.insert("orderId".to_string(), caps[1].to_string());
    }

    let is_day = DAY.is_match(lowered);
    if let Some(caps) = HOURS.captures(lowered) {
        parameters.insert("hours".to_string(), caps[1].to_string());
    } else if is_day {
        parameters.insert("hours".to_string(), "24".to_string());
    }

    let period = if WEEK.is_match(lowered) {
        Some("week")
    } else if MONTH.is_match(lowered) {
        Some("month")
    } else if is_day {
        Some("day")
    } else {
        None
    };
    if let Some(period) = period {
        parameters.insert("period".to_string(), period.to_string());
    }

    parameters
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
