use super::intent::*;

fn parse(text: &str) -> ParsedIntent {
    IntentClassifier::new().parse(text)
}

#[test]
fn test_new_customers_in_madrid() {
    let parsed = parse("¿Cuántos clientes nuevos hay en Madrid?");

    assert_eq!(parsed.intent, Intent::NewCustomers);
    assert_eq!(parsed.param("city"), Some("Madrid"));
    assert_eq!(parsed.required_backends, vec![BackendName::Sql]);
    assert_eq!(parsed.original_query, "¿Cuántos clientes nuevos hay en Madrid?");
}

#[test]
fn test_abandoned_carts_with_hours() {
    let parsed = parse("¿Usuarios con carrito abandonado últimas 24 horas?");

    assert_eq!(parsed.intent, Intent::AbandonedCarts);
    assert_eq!(parsed.param("hours"), Some("24"));
    assert_eq!(parsed.required_backends, vec![BackendName::Analytics]);
}

#[test]
fn test_abandoned_carts_hours_in_english() {
    let parsed = parse("Show abandoned carts in the last 48 hours");

    assert_eq!(parsed.intent, Intent::AbandonedCarts);
    assert_eq!(parsed.param("hours"), Some("48"));
}

#[test]
fn test_day_implies_twenty_four_hours() {
    let parsed = parse("carritos abandonados de hoy");

    assert_eq!(parsed.param("hours"), Some("24"));
    assert_eq!(parsed.param("period"), Some("day"));
}

#[test]
fn test_order_status_extracts_order_id() {
    let parsed = parse("¿Estado del pedido 1001?");

    assert_eq!(parsed.intent, Intent::OrderStatus);
    assert_eq!(parsed.param("orderId"), Some("1001"));
    assert_eq!(
        parsed.required_backends,
        vec![BackendName::Sql, BackendName::Rest]
    );
}

#[test]
fn test_order_status_with_hash_prefix() {
    let parsed = parse("What is the order status of order #2002?");

    assert_eq!(parsed.intent, Intent::OrderStatus);
    assert_eq!(parsed.param("orderId"), Some("2002"));
}

#[test]
fn test_order_status_without_id() {
    let parsed = parse("estado del pedido por favor");

    assert_eq!(parsed.intent, Intent::OrderStatus);
    assert_eq!(parsed.param("orderId"), None);
}

#[test]
fn test_sales_summary_this_week() {
    let parsed = parse("Resumen de ventas de esta semana");

    assert_eq!(parsed.intent, Intent::SalesSummary);
    assert_eq!(parsed.param("period"), Some("week"));
    assert_eq!(
        parsed.required_backends,
        vec![BackendName::Sql, BackendName::Rest]
    );
}

#[test]
fn test_sales_summary_month_in_english() {
    let parsed = parse("Give me the sales summary for this month");

    assert_eq!(parsed.intent, Intent::SalesSummary);
    assert_eq!(parsed.param("period"), Some("month"));
}

#[test]
fn test_period_needs_whole_word() {
    // "mes" inside "mesa" is not a month
    let parsed = parse("ventas totales de mesas");

    assert_eq!(parsed.intent, Intent::SalesSummary);
    assert_eq!(parsed.param("period"), None);
}

#[test]
fn test_top_products() {
    let parsed = parse("Top 10 productos más vendidos");

    assert_eq!(parsed.intent, Intent::TopProducts);
    assert_eq!(parsed.required_backends, vec![BackendName::Rest]);
}

#[test]
fn test_country_is_normalized() {
    let parsed = parse("new customers from mexico");

    assert_eq!(parsed.intent, Intent::NewCustomers);
    assert_eq!(parsed.param("country"), Some("México"));

    let parsed = parse("clientes nuevos en España");
    assert_eq!(parsed.param("country"), Some("España"));
}

#[test]
fn test_unknown_query_has_no_parameters() {
    let parsed = parse("¿Qué tiempo hace en Madrid hoy?");

    assert_eq!(parsed.intent, Intent::Unknown);
    assert!(parsed.parameters.is_empty());
    assert!(parsed.required_backends.is_empty());
}

#[test]
fn test_first_matching_group_wins() {
    // mentions both new customers and top products
    let parsed = parse("clientes nuevos y top productos");

    assert_eq!(parsed.intent, Intent::NewCustomers);
}

#[test]
fn test_intent_serializes_snake_case() {
    let value = serde_json::to_value(Intent::AbandonedCarts).unwrap();
    assert_eq!(value, "abandoned_carts");
    assert_eq!(Intent::TopProducts.to_string(), "top_products");
}
