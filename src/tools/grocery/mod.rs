//! Grocery store provider
//!
//! Exposes catalog browsing, cart pricing and order placement over an
//! immutable catalog injected at construction.

pub mod catalog;
pub mod pricing;

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use super::args;
use super::order_id::{OrderIdGenerator, OrderIdStrategy};
use super::registry::ToolRegistry;
use super::tool::{Tool, ToolInvocationResult};

pub use catalog::{Catalog, Category, Product};
pub use pricing::{CartLine, CartTotals, DELIVERY_FEE, FREE_DELIVERY_THRESHOLD};

/// Delivery slot used when the caller does not ask for one
const FASTEST_SLOT: &str = "fastest";
const CART_TOO_LARGE: &str = "cart total is too large";

/// Build the grocery provider's tool set
pub fn registry(catalog: Arc<Catalog>, strategy: OrderIdStrategy) -> ToolRegistry {
    let orders = Arc::new(OrderIdGenerator::new("AF", strategy));

    let mut registry = ToolRegistry::new("grocery");
    registry.register(SearchProductsTool::new(catalog.clone()));
    registry.register(GetCategoriesTool::new(catalog.clone()));
    registry.register(GetProductDetailsTool::new(catalog.clone()));
    registry.register(AddToCartTool::new(catalog.clone()));
    registry.register(PlaceOrderTool::new(catalog, orders));
    registry
}

fn product_json(p: &Product) -> Value {
    json!({
        "id": p.id,
        "name": p.name,
        "price": p.price,
        "available": p.available,
        "category": p.category,
    })
}

// ============================================================================
// search_products
// ============================================================================

pub struct SearchProductsTool {
    catalog: Arc<Catalog>,
}

impl SearchProductsTool {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

impl Tool for SearchProductsTool {
    fn name(&self) -> &str {
        "search_products"
    }

    fn description(&self) -> &str {
        "Search available products by category and/or a name substring."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "category": {
                    "type": "string",
                    "description": "Category id (e.g. 'fresh', 'dairy'). Empty searches all categories."
                },
                "query": {
                    "type": "string",
                    "description": "Case-insensitive substring of the product name"
                }
            }
        })
    }

    fn execute(&self, input: &Value) -> ToolInvocationResult {
        let args = match args::object(input) {
            Ok(a) => a,
            Err(e) => return e,
        };
        let category = args::optional_string(&args, "category");
        let query = args::optional_string(&args, "query");

        tracing::info!("[Grocery] search_products category={:?} query={:?}", category, query);

        let hits = self.catalog.search(category.as_deref(), query.as_deref());
        let payload: Vec<Value> = hits.iter().map(|p| product_json(p)).collect();

        ToolInvocationResult::success(
            Value::Array(payload),
            format!("Found {} products", hits.len()),
        )
    }
}

// ============================================================================
// get_categories
// ============================================================================

pub struct GetCategoriesTool {
    catalog: Arc<Catalog>,
}

impl GetCategoriesTool {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

impl Tool for GetCategoriesTool {
    fn name(&self) -> &str {
        "get_categories"
    }

    fn description(&self) -> &str {
        "List all product categories with the number of available products in each."
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    fn execute(&self, _input: &Value) -> ToolInvocationResult {
        let categories: Vec<Value> = self
            .catalog
            .categories()
            .iter()
            .map(|c| {
                json!({
                    "id": c.id,
                    "name": c.name,
                    "icon": c.icon,
                    "product_count": self.catalog.available_count(c.id),
                })
            })
            .collect();

        let count = categories.len();
        ToolInvocationResult::success(Value::Array(categories), format!("{} categories", count))
    }
}

// ============================================================================
// get_product_details
// ============================================================================

pub struct GetProductDetailsTool {
    catalog: Arc<Catalog>,
}

impl GetProductDetailsTool {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

impl Tool for GetProductDetailsTool {
    fn name(&self) -> &str {
        "get_product_details"
    }

    fn description(&self) -> &str {
        "Get the details of one product by id."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "product_id": {"type": "string", "description": "Product id, e.g. 'd1'"}
            },
            "required": ["product_id"]
        })
    }

    fn execute(&self, input: &Value) -> ToolInvocationResult {
        let product_id = match args::object(input).and_then(|a| args::required_string(&a, "product_id")) {
            Ok(id) => id,
            Err(e) => return e,
        };

        match self.catalog.product(&product_id) {
            Some(p) => ToolInvocationResult::success(product_json(p), p.name),
            None => {
                tracing::warn!("[Grocery] Product '{}' not found", product_id);
                ToolInvocationResult::failure(format!("Product '{}' not found", product_id))
            }
        }
    }
}

// ============================================================================
// add_to_cart
// ============================================================================

pub struct AddToCartTool {
    catalog: Arc<Catalog>,
}

impl AddToCartTool {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

impl Tool for AddToCartTool {
    fn name(&self) -> &str {
        "add_to_cart"
    }

    fn description(&self) -> &str {
        "Price a cart from product ids and quantities. Returns the cart lines and totals."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "product_ids": {"type": "array", "items": {"type": "string"}},
                "quantities": {
                    "type": "array",
                    "items": {"type": "integer", "minimum": 1},
                    "description": "One quantity per product id; defaults to 1 each"
                }
            },
            "required": ["product_ids"]
        })
    }

    fn execute(&self, input: &Value) -> ToolInvocationResult {
        let args = match args::object(input) {
            Ok(a) => a,
            Err(e) => return e,
        };
        let product_ids = match args::required_string_list(&args, "product_ids") {
            Ok(ids) => ids,
            Err(e) => return e,
        };
        let quantities = match args::optional_u32_list(&args, "quantities") {
            Ok(q) => q.unwrap_or_else(|| vec![1; product_ids.len()]),
            Err(e) => return e,
        };

        if product_ids.len() != quantities.len() {
            return ToolInvocationResult::failure(
                "The number of product ids and quantities does not match",
            );
        }

        let mut lines = Vec::with_capacity(product_ids.len());
        for (product_id, quantity) in product_ids.iter().zip(quantities) {
            if quantity == 0 {
                return ToolInvocationResult::failure(format!(
                    "Quantity for '{}' must be at least 1",
                    product_id
                ));
            }
            let product = match self.catalog.product(product_id).filter(|p| p.available) {
                Some(p) => p,
                None => {
                    return ToolInvocationResult::failure(format!(
                        "Product '{}' not found or out of stock",
                        product_id
                    ))
                }
            };
            match CartLine::new(product.id, product.name, product.price, quantity) {
                Some(line) => lines.push(line),
                None => return ToolInvocationResult::failure(CART_TOO_LARGE),
            }
        }

        let totals = match pricing::totals(&lines) {
            Some(t) => t,
            None => return ToolInvocationResult::failure(CART_TOO_LARGE),
        };
        tracing::info!("[Grocery] Cart priced: {} lines, total ¥{}", lines.len(), totals.total);

        ToolInvocationResult::success(
            json!({
                "cart_items": lines,
                "subtotal": totals.subtotal,
                "delivery_fee": totals.delivery_fee,
                "total_price": totals.total,
            }),
            format!("Added {} products to the cart", lines.len()),
        )
    }
}

// ============================================================================
// place_order
// ============================================================================

/// Cart line as sent back by the model
#[derive(Debug, Deserialize)]
struct OrderLineInput {
    #[serde(default)]
    product_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    price: Option<u64>,
    #[serde(default)]
    quantity: Option<u32>,
}

pub struct PlaceOrderTool {
    catalog: Arc<Catalog>,
    orders: Arc<OrderIdGenerator>,
}

impl PlaceOrderTool {
    pub fn new(catalog: Arc<Catalog>, orders: Arc<OrderIdGenerator>) -> Self {
        Self { catalog, orders }
    }

    /// Resolve one line, preferring the catalog price over the sent one
    fn resolve_line(&self, index: usize, line: OrderLineInput) -> Result<CartLine, ToolInvocationResult> {
        let quantity = line.quantity.unwrap_or(1);
        if quantity == 0 {
            return Err(ToolInvocationResult::failure(format!(
                "Cart item #{} has quantity 0",
                index + 1
            )));
        }

        let known = line.product_id.as_deref().and_then(|id| self.catalog.product(id));
        let (product_id, name, price) = match (known, line.price) {
            (Some(p), _) => (p.id.to_string(), p.name.to_string(), p.price),
            (None, Some(price)) => {
                let product_id = line.product_id.unwrap_or_default();
                let name = line.name.unwrap_or_else(|| product_id.clone());
                (product_id, name, price)
            }
            (None, None) => {
                return Err(ToolInvocationResult::failure(format!(
                    "Cart item #{} has no known product id and no price",
                    index + 1
                )))
            }
        };

        CartLine::new(product_id, name, price, quantity)
            .ok_or_else(|| ToolInvocationResult::failure(CART_TOO_LARGE))
    }
}

impl Tool for PlaceOrderTool {
    fn name(&self) -> &str {
        "place_order"
    }

    fn description(&self) -> &str {
        "Place an order for cart items. Delivery costs ¥350 below a ¥2000 subtotal."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "cart_items": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "product_id": {"type": "string"},
                            "name": {"type": "string"},
                            "price": {"type": "integer"},
                            "quantity": {"type": "integer"}
                        }
                    }
                },
                "delivery_address": {"type": "string"},
                "delivery_time": {
                    "type": "string",
                    "description": "Requested delivery slot; defaults to the fastest available"
                }
            },
            "required": ["cart_items", "delivery_address"]
        })
    }

    fn execute(&self, input: &Value) -> ToolInvocationResult {
        let args = match args::object(input) {
            Ok(a) => a,
            Err(e) => return e,
        };
        let delivery_address = match args::required_string(&args, "delivery_address") {
            Ok(a) => a,
            Err(e) => return e,
        };
        let delivery_time =
            args::optional_string(&args, "delivery_time").unwrap_or_else(|| FASTEST_SLOT.to_string());

        let raw_lines: Vec<OrderLineInput> = match args.get("cart_items").cloned().map(serde_json::from_value) {
            Some(Ok(lines)) => lines,
            Some(Err(e)) => {
                return ToolInvocationResult::failure(format!("Invalid cart_items: {}", e))
            }
            None => return ToolInvocationResult::failure("Missing required list: 'cart_items'"),
        };

        if raw_lines.is_empty() {
            return ToolInvocationResult::failure("The cart is empty");
        }

        let mut lines = Vec::with_capacity(raw_lines.len());
        for (index, raw) in raw_lines.into_iter().enumerate() {
            match self.resolve_line(index, raw) {
                Ok(line) => lines.push(line),
                Err(e) => return e,
            }
        }

        let totals = match pricing::totals(&lines) {
            Some(t) => t,
            None => return ToolInvocationResult::failure(CART_TOO_LARGE),
        };
        let order_id = self.orders.next_id();
        let estimated_delivery = if delivery_time == FASTEST_SLOT {
            "2-4 hours".to_string()
        } else {
            delivery_time
        };

        tracing::info!("[Grocery] Order {} placed, total ¥{}", order_id, totals.total);

        ToolInvocationResult::success(
            json!({
                "order_id": order_id,
                "items": lines.iter().map(|l| json!({"name": l.name, "quantity": l.quantity})).collect::<Vec<_>>(),
                "subtotal": totals.subtotal,
                "delivery_fee": totals.delivery_fee,
                "total_price": totals.total,
                "delivery_address": delivery_address,
                "estimated_delivery": estimated_delivery,
                "placed_at": Utc::now().to_rfc3339(),
            }),
            format!("Thank you for your order. Total: ¥{}", totals.total),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tools() -> ToolRegistry {
        registry(Arc::new(Catalog::standard()), OrderIdStrategy::Counter)
    }

    #[test]
    fn exposes_five_operations() {
        assert_eq!(
            tools().tool_names(),
            vec![
                "search_products",
                "get_categories",
                "get_product_details",
                "add_to_cart",
                "place_order"
            ]
        );
    }

    #[test]
    fn add_to_cart_prices_lines() {
        let result = tools().execute(
            "add_to_cart",
            &json!({"product_ids": ["d1", "p4"], "quantities": [2, 1]}),
        );
        assert!(result.success, "{}", result.message);
        assert_eq!(result.payload["subtotal"], 198 * 2 + 1980);
        assert_eq!(result.payload["delivery_fee"], 0);
        assert_eq!(result.payload["cart_items"][0]["total"], 396);
    }

    #[test]
    fn add_to_cart_rejects_out_of_stock_and_mismatch() {
        let t = tools();
        let out = t.execute("add_to_cart", &json!({"product_ids": ["f4"]}));
        assert!(!out.success);

        let mismatch = t.execute("add_to_cart", &json!({"product_ids": ["d1"], "quantities": [1, 2]}));
        assert!(!mismatch.success);
    }

    #[test]
    fn place_order_applies_delivery_fee() {
        let result = tools().execute(
            "place_order",
            &json!({
                "cart_items": [
                    {"name": "A", "price": 100, "quantity": 2},
                    {"name": "B", "price": 50, "quantity": 1}
                ],
                "delivery_address": "1-2-3 Shibuya"
            }),
        );
        assert!(result.success, "{}", result.message);
        assert_eq!(result.payload["subtotal"], 250);
        assert_eq!(result.payload["delivery_fee"], 350);
        assert_eq!(result.payload["total_price"], 600);
        assert_eq!(result.payload["estimated_delivery"], "2-4 hours");
    }

    #[test]
    fn place_order_rejects_totals_that_overflow() {
        let t = tools();
        let line_overflow = t.execute(
            "place_order",
            &json!({
                "cart_items": [{"name": "X", "price": u64::MAX, "quantity": 2}],
                "delivery_address": "Tokyo"
            }),
        );
        assert!(!line_overflow.success);
        assert_eq!(line_overflow.message, "cart total is too large");

        let sum_overflow = t.execute(
            "place_order",
            &json!({
                "cart_items": [
                    {"name": "X", "price": u64::MAX},
                    {"name": "Y", "price": 1}
                ],
                "delivery_address": "Tokyo"
            }),
        );
        assert!(!sum_overflow.success);

        // no order id is consumed by a rejected order
        let ok = t.execute(
            "place_order",
            &json!({"cart_items": [{"product_id": "d1"}], "delivery_address": "Tokyo"}),
        );
        assert_eq!(ok.payload["order_id"], "AF-000001");
    }

    #[test]
    fn placing_the_same_order_twice_creates_two_orders() {
        let t = tools();
        let args = json!({
            "cart_items": [{"product_id": "d1", "quantity": 1}],
            "delivery_address": "Tokyo"
        });
        let first = t.execute("place_order", &args);
        let second = t.execute("place_order", &args);
        assert_eq!(first.payload["order_id"], "AF-000001");
        assert_eq!(second.payload["order_id"], "AF-000002");
    }

    #[test]
    fn place_order_requires_items_and_address() {
        let t = tools();
        let empty = t.execute("place_order", &json!({"cart_items": [], "delivery_address": "x"}));
        assert!(!empty.success);
        let no_address = t.execute("place_order", &json!({"cart_items": [{"price": 1}]}));
        assert!(!no_address.success);
    }
}
