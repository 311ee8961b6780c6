//! In-memory customer and product store served by the secure endpoint.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::rpc::{CallToolParams, ResourceContents, RpcError, RpcHandler, ServerInfo, ToolResult};

pub const CUSTOMERS_URI: &str = "secure://data/customers";
pub const PRODUCTS_URI: &str = "secure://data/products";

const FIRST_ORDER_ID: u64 = 1001;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub city: String,
    pub country: String,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub stock: i64,
}

/// The secure server's business handler: two read-only resources and the
/// `create_order` tool.
pub struct StoreCatalog {
    customers: Vec<Customer>,
    products: Vec<Product>,
    next_order_id: AtomicU64,
}

impl StoreCatalog {
    pub fn new(customers: Vec<Customer>, products: Vec<Product>) -> Self {
        Self {
            customers,
            products,
            next_order_id: AtomicU64::new(FIRST_ORDER_ID),
        }
    }

    /// Catalog preloaded with a handful of sample records.
    pub fn sample() -> Self {
        let registered = |y, m, d| {
            Utc.with_ymd_and_hms(y, m, d, 9, 0, 0)
                .single()
                .unwrap_or_else(Utc::now)
        };
        let customer = |id, name: &str, email: &str, city: &str, country: &str, at| Customer {
            id,
            name: name.into(),
            email: email.into(),
            city: city.into(),
            country: country.into(),
            registered_at: at,
        };
        let product = |id, name: &str, category: &str, price, stock| Product {
            id,
            name: name.into(),
            category: category.into(),
            price,
            stock,
        };

        Self::new(
            vec![
                customer(1, "Ana García", "ana@example.com", "Madrid", "España", registered(2024, 1, 15)),
                customer(2, "Carlos López", "carlos@example.com", "Barcelona", "España", registered(2024, 2, 3)),
                customer(3, "María Rodríguez", "maria@example.com", "Sevilla", "España", registered(2024, 3, 21)),
                customer(4, "Juan Martínez", "juan@example.com", "Ciudad de México", "México", registered(2024, 4, 8)),
            ],
            vec![
                product(1, "Laptop Pro 15", "Electronics", 1299.99, 25),
                product(2, "Wireless Mouse", "Accessories", 29.99, 150),
                product(3, "USB-C Hub", "Accessories", 49.99, 80),
                product(4, "4K Monitor", "Electronics", 399.0, 3),
            ],
        )
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    fn create_order(&self, params: &CallToolParams) -> Result<Value, RpcError> {
        let customer_id = params.require_i64("customerId")?;
        let product_id = params.require_i64("productId")?;
        let quantity = params.require_i64("quantity")?;

        if quantity <= 0 {
            return Err(RpcError::invalid_param("Quantity must be positive"));
        }
        let customer = self
            .customers
            .iter()
            .find(|c| c.id == customer_id)
            .ok_or_else(|| RpcError::invalid_param(format!("Customer not found: {customer_id}")))?;
        let product = self
            .products
            .iter()
            .find(|p| p.id == product_id)
            .ok_or_else(|| RpcError::invalid_param(format!("Product not found: {product_id}")))?;
        if product.stock < quantity {
            return Err(RpcError::invalid_param(format!(
                "Insufficient stock for product {product_id}"
            )));
        }

        let order_id = self.next_order_id.fetch_add(1, Ordering::Relaxed);
        let total = product.price * quantity as f64;
        let text = format!(
            "Order created successfully!\n\nOrder ID: {order_id}\nCustomer: {}\nProduct: {}\nQuantity: {quantity}\nTotal: €{total:.2}\nStatus: Confirmed",
            customer.name, product.name
        );

        to_value(ToolResult::text(text))
    }
}

fn to_value<T: Serialize>(value: T) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError::Internal(e.to_string()))
}

#[async_trait]
impl RpcHandler for StoreCatalog {
    fn server_info(&self) -> ServerInfo {
        ServerInfo {
            name: "mcp-workshop-secure".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    async fn list_resources(&self) -> Result<Value, RpcError> {
        Ok(json!({
            "resources": [
                {
                    "uri": CUSTOMERS_URI,
                    "name": "Secure Customers",
                    "description": "Registered customers (requires scope: read)",
                    "mimeType": "application/json"
                },
                {
                    "uri": PRODUCTS_URI,
                    "name": "Secure Products",
                    "description": "Product catalog (requires scope: read)",
                    "mimeType": "application/json"
                }
            ]
        }))
    }

    async fn read_resource(&self, uri: &str) -> Result<Value, RpcError> {
        let text = match uri {
            CUSTOMERS_URI => serde_json::to_string(&self.customers),
            PRODUCTS_URI => serde_json::to_string(&self.products),
            other => return Err(RpcError::invalid_param(format!("Unknown resource URI: {other}"))),
        }
        .map_err(|e| RpcError::Internal(e.to_string()))?;

        to_value(ResourceContents::json(uri, text))
    }

    async fn list_tools(&self) -> Result<Value, RpcError> {
        let id_param = |description: &str| json!({ "type": "number", "description": description });
        Ok(json!({
            "tools": [{
                "name": "create_order",
                "description": "Create a new order (requires scope: write)",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "customerId": id_param("Customer id"),
                        "productId": id_param("Product id"),
                        "quantity": id_param("Quantity to order")
                    },
                    "required": ["customerId", "productId", "quantity"]
                }
            }]
        }))
    }

    async fn call_tool(&self, params: CallToolParams) -> Result<Value, RpcError> {
        match params.name.as_str() {
            "create_order" => self.create_order(&params),
            other => Err(RpcError::invalid_param(format!("Unknown tool: {other}"))),
        }
    }
}
