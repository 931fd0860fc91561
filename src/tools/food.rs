//! Food delivery provider
//!
//! Restaurant search, menus and order placement over a fixed dataset.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use super::args;
use super::order_id::{OrderIdGenerator, OrderIdStrategy};
use super::registry::ToolRegistry;
use super::tool::{Tool, ToolInvocationResult};

#[derive(Debug, Clone, Serialize)]
pub struct Restaurant {
    pub id: &'static str,
    pub name: &'static str,
    pub cuisine: &'static str,
    pub rating: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MenuItem {
    pub id: &'static str,
    pub name: &'static str,
    pub price: u64,
}

/// Restaurants and their menus
#[derive(Debug, Clone, Default)]
pub struct FoodDataset {
    restaurants: Vec<(Restaurant, Vec<MenuItem>)>,
}

impl FoodDataset {
    pub fn new(restaurants: Vec<(Restaurant, Vec<MenuItem>)>) -> Self {
        Self { restaurants }
    }

    pub fn restaurant(&self, id: &str) -> Option<&Restaurant> {
        self.restaurants.iter().map(|(r, _)| r).find(|r| r.id == id)
    }

    pub fn menu(&self, id: &str) -> Option<&[MenuItem]> {
        self.restaurants
            .iter()
            .find(|(r, _)| r.id == id)
            .map(|(_, menu)| menu.as_slice())
    }

    /// Restaurants whose cuisine contains `cuisine` (case-insensitive)
    pub fn search(&self, cuisine: Option<&str>) -> Vec<&Restaurant> {
        let needle = cuisine.map(str::to_lowercase);
        self.restaurants
            .iter()
            .map(|(r, _)| r)
            .filter(|r| {
                needle
                    .as_deref()
                    .map_or(true, |c| r.cuisine.to_lowercase().contains(c))
            })
            .collect()
    }

    pub fn standard() -> Self {
        fn r(id: &'static str, name: &'static str, cuisine: &'static str, rating: f32) -> Restaurant {
            Restaurant { id, name, cuisine, rating }
        }
        fn m(id: &'static str, name: &'static str, price: u64) -> MenuItem {
            MenuItem { id, name, price }
        }

        Self::new(vec![
            (
                r("1", "Sushi Taro", "Japanese", 4.5),
                vec![m("s1", "Nigiri Set", 1500), m("s2", "Chirashi Bowl", 1200)],
            ),
            (
                r("2", "Pizza House", "Italian", 4.2),
                vec![m("p1", "Margherita", 1800), m("p2", "Pepperoni", 2000)],
            ),
            (
                r("3", "Ramen King", "Ramen", 4.7),
                vec![m("r1", "Shoyu Ramen", 800), m("r2", "Miso Ramen", 850)],
            ),
            (
                r("4", "Curry Master", "Indian", 4.3),
                vec![m("c1", "Chicken Curry", 1000), m("c2", "Vegetable Curry", 900)],
            ),
        ])
    }
}

/// Build the food delivery provider's tool set
pub fn registry(data: Arc<FoodDataset>, strategy: OrderIdStrategy) -> ToolRegistry {
    let orders = Arc::new(OrderIdGenerator::new("FD", strategy));

    let mut registry = ToolRegistry::new("food");
    registry.register(SearchRestaurantsTool { data: data.clone() });
    registry.register(GetMenuTool { data: data.clone() });
    registry.register(PlaceOrderTool { data, orders });
    registry
}

pub struct SearchRestaurantsTool {
    data: Arc<FoodDataset>,
}

impl Tool for SearchRestaurantsTool {
    fn name(&self) -> &str {
        "search_restaurants"
    }

    fn description(&self) -> &str {
        "Search restaurants by cuisine. An empty cuisine lists every restaurant."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"cuisine": {"type": "string"}}
        })
    }

    fn execute(&self, input: &Value) -> ToolInvocationResult {
        let cuisine = match args::object(input) {
            Ok(a) => args::optional_string(&a, "cuisine"),
            Err(e) => return e,
        };
        let hits = self.data.search(cuisine.as_deref());
        let count = hits.len();
        ToolInvocationResult::success(json!(hits), format!("Found {} restaurants", count))
    }
}

pub struct GetMenuTool {
    data: Arc<FoodDataset>,
}

impl Tool for GetMenuTool {
    fn name(&self) -> &str {
        "get_menu"
    }

    fn description(&self) -> &str {
        "Get the menu of a restaurant."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"restaurant_id": {"type": "string"}},
            "required": ["restaurant_id"]
        })
    }

    fn execute(&self, input: &Value) -> ToolInvocationResult {
        let restaurant_id =
            match args::object(input).and_then(|a| args::required_string(&a, "restaurant_id")) {
                Ok(id) => id,
                Err(e) => return e,
            };

        match self.data.menu(&restaurant_id) {
            Some(menu) => {
                ToolInvocationResult::success(json!(menu), format!("{} menu items", menu.len()))
            }
            None => ToolInvocationResult::failure(format!(
                "Restaurant '{}' not found",
                restaurant_id
            )),
        }
    }
}

pub struct PlaceOrderTool {
    data: Arc<FoodDataset>,
    orders: Arc<OrderIdGenerator>,
}

impl Tool for PlaceOrderTool {
    fn name(&self) -> &str {
        "place_order"
    }

    fn description(&self) -> &str {
        "Order menu items from one restaurant for delivery."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "restaurant_id": {"type": "string"},
                "items": {"type": "array", "items": {"type": "string"}, "description": "Menu item ids"},
                "delivery_address": {"type": "string"}
            },
            "required": ["restaurant_id", "items", "delivery_address"]
        })
    }

    fn execute(&self, input: &Value) -> ToolInvocationResult {
        let args = match args::object(input) {
            Ok(a) => a,
            Err(e) => return e,
        };
        let (restaurant_id, items, delivery_address) = match (
            args::required_string(&args, "restaurant_id"),
            args::required_string_list(&args, "items"),
            args::required_string(&args, "delivery_address"),
        ) {
            (Ok(r), Ok(i), Ok(a)) => (r, i, a),
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => return e,
        };

        let (Some(restaurant), Some(menu)) =
            (self.data.restaurant(&restaurant_id), self.data.menu(&restaurant_id))
        else {
            return ToolInvocationResult::failure(format!(
                "Restaurant '{}' not found",
                restaurant_id
            ));
        };

        let ordered: Vec<&MenuItem> = items
            .iter()
            .filter_map(|id| menu.iter().find(|m| m.id == id.as_str()))
            .collect();
        if ordered.is_empty() {
            return ToolInvocationResult::failure("None of the requested items are on the menu");
        }

        let total: u64 = ordered.iter().map(|m| m.price).sum();
        let order_id = self.orders.next_id();
        tracing::info!("[Food] Order {} placed at '{}', total ¥{}", order_id, restaurant.name, total);

        ToolInvocationResult::success(
            json!({
                "order_id": order_id,
                "restaurant": restaurant.name,
                "items": ordered.iter().map(|m| m.name).collect::<Vec<_>>(),
                "total_price": total,
                "delivery_address": delivery_address,
                "estimated_delivery": "30-45 minutes",
            }),
            format!("Order placed. Total: ¥{}", total),
        )
    }
}
