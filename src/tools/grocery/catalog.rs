//! Immutable grocery catalog
//!
//! The dataset is built once and shared read-only by every tool of the
//! provider through an `Arc`.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: &'static str,
    pub name: &'static str,
    /// Unit price in yen
    pub price: u64,
    pub available: bool,
    #[serde(skip)]
    pub category: &'static str,
}

/// Categories and products, in display order
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    categories: Vec<Category>,
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(categories: Vec<Category>, products: Vec<Product>) -> Self {
        Self {
            categories,
            products,
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Products of one category, or all products when `category` is `None`
    pub fn products_in(&self, category: Option<&str>) -> impl Iterator<Item = &Product> + '_ {
        let category = category.map(str::to_string);
        self.products
            .iter()
            .filter(move |p| category.as_deref().map_or(true, |c| p.category == c))
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Available products matching an optional category and a
    /// case-insensitive substring of the name
    ///
    /// An unknown category searches every category.
    pub fn search(&self, category: Option<&str>, query: Option<&str>) -> Vec<&Product> {
        let category = category.filter(|c| self.category(c).is_some());
        let needle = query.map(str::to_lowercase);

        self.products_in(category)
            .filter(|p| p.available)
            .filter(|p| {
                needle
                    .as_deref()
                    .map_or(true, |q| p.name.to_lowercase().contains(q))
            })
            .collect()
    }

    pub fn available_count(&self, category: &str) -> usize {
        self.products_in(Some(category)).filter(|p| p.available).count()
    }

    /// The store's standard assortment
    pub fn standard() -> Self {
        let categories = vec![
            cat("fresh", "Fresh Produce", "🥬"),
            cat("pantry", "Pantry", "🥫"),
            cat("dairy", "Dairy & Eggs", "🥛"),
            cat("meat", "Meat & Seafood", "🥩"),
            cat("frozen", "Frozen", "🧊"),
            cat("bakery", "Bakery", "🍞"),
            cat("snacks", "Snacks", "🍪"),
            cat("household", "Household", "🧽"),
            cat("beverages", "Beverages", "🥤"),
            cat("baby", "Baby", "🍼"),
            cat("health", "Health & Beauty", "💊"),
            cat("pet", "Pet Supplies", "🐕"),
        ];

        let products = vec![
            item("fresh", "f1", "Organic Tomatoes (500g)", 380, true),
            item("fresh", "f2", "Lettuce (1 head)", 198, true),
            item("fresh", "f3", "Bananas (bunch)", 298, true),
            item("fresh", "f4", "Apples (3)", 448, false),
            item("fresh", "f5", "Cucumbers (3)", 158, true),
            item("fresh", "f6", "Carrots (1 bag)", 128, true),
            item("fresh", "f7", "Onions (3)", 168, true),
            item("fresh", "f8", "Potatoes (1 bag)", 248, true),
            item("fresh", "f9", "Strawberries (1 pack)", 498, true),
            item("fresh", "f10", "Oranges (4)", 398, false),
            item("pantry", "p1", "Pasta 500g", 158, true),
            item("pantry", "p2", "Olive Oil 500ml", 680, true),
            item("pantry", "p3", "Soy Sauce 1L", 298, true),
            item("pantry", "p4", "Rice 5kg", 1980, true),
            item("pantry", "p5", "Sugar 1kg", 198, true),
            item("pantry", "p6", "Canned Tomatoes 400g", 98, true),
            item("dairy", "d1", "Milk 1L", 198, true),
            item("dairy", "d2", "Eggs (10 pack)", 248, true),
            item("dairy", "d3", "Yogurt 400g", 158, true),
            item("dairy", "d4", "Butter 200g", 328, true),
            item("dairy", "d5", "Cheese 100g", 298, true),
            item("dairy", "d6", "Soy Milk 1L", 218, true),
            item("meat", "m1", "Chicken Breast 300g", 398, true),
            item("meat", "m2", "Salmon Fillets (2)", 680, true),
            item("meat", "m3", "Pork Belly 400g", 598, false),
            item("meat", "m4", "Beef Slices 300g", 598, true),
            item("meat", "m5", "Shrimp 200g", 1280, true),
            item("meat", "m6", "Ground Meat 300g", 398, false),
            item("frozen", "fr1", "Frozen Fried Rice", 298, true),
            item("frozen", "fr2", "Frozen Dumplings (12)", 398, true),
            item("frozen", "fr3", "Frozen Udon (3 servings)", 198, true),
            item("frozen", "fr4", "Ice Cream 500ml", 398, true),
            item("bakery", "bk1", "Sliced Bread (6 slices)", 148, true),
            item("bakery", "bk2", "Croissants (4)", 298, true),
            item("bakery", "bk3", "Baguette", 198, true),
            item("snacks", "sn1", "Potato Chips", 158, true),
            item("snacks", "sn2", "Chocolate Bar", 198, true),
            item("snacks", "sn3", "Assorted Cookies", 398, true),
            item("snacks", "sn4", "Mixed Nuts 100g", 498, true),
            item("household", "h1", "Laundry Detergent", 298, true),
            item("household", "h2", "Toilet Paper (12 rolls)", 898, true),
            item("household", "h3", "Paper Towels", 198, true),
            item("household", "h4", "Dish Soap", 178, true),
            item("household", "h5", "Trash Bags (30)", 298, true),
            item("beverages", "b1", "Mineral Water 2L", 98, true),
            item("beverages", "b2", "Coffee Beans 200g", 1280, true),
            item("beverages", "b3", "Orange Juice 1L", 298, true),
            item("beverages", "b4", "Green Tea 500ml", 128, true),
            item("beverages", "b5", "Sports Drink 500ml", 148, false),
            item("baby", "bb1", "Diapers M (64)", 1480, true),
            item("baby", "bb2", "Baby Wipes (80 x 3)", 498, true),
            item("baby", "bb3", "Infant Formula 800g", 2680, true),
            item("health", "he1", "Shampoo 400ml", 598, true),
            item("health", "he2", "Toothbrushes (3)", 398, true),
            item("health", "he3", "Toothpaste", 248, true),
            item("health", "he4", "Vitamin C Supplement", 798, true),
            item("pet", "pt1", "Dog Food 1kg", 1980, true),
            item("pet", "pt2", "Cat Food 500g", 798, true),
            item("pet", "pt3", "Cat Litter 7L", 598, true),
        ];

        Self::new(categories, products)
    }
}

fn cat(id: &'static str, name: &'static str, icon: &'static str) -> Category {
    Category { id, name, icon }
}

fn item(
    category: &'static str,
    id: &'static str,
    name: &'static str,
    price: u64,
    available: bool,
) -> Product {
    Product {
        id,
        name,
        price,
        available,
        category,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_skips_unavailable_products() {
        let catalog = Catalog::standard();
        let fresh = catalog.search(Some("fresh"), None);
        assert!(fresh.iter().all(|p| p.available));
        assert!(fresh.iter().all(|p| p.id != "f4"));
    }

    #[test]
    fn search_by_query_is_case_insensitive() {
        let catalog = Catalog::standard();
        let hits = catalog.search(None, Some("MILK"));
        let ids: Vec<_> = hits.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["d1", "d6"]);
    }

    #[test]
    fn unknown_category_searches_everything() {
        let catalog = Catalog::standard();
        assert_eq!(
            catalog.search(Some("nope"), None).len(),
            catalog.search(None, None).len()
        );
    }

    #[test]
    fn products_in_outlives_the_category_argument() {
        let catalog = Catalog::standard();
        let products: Vec<&Product> = {
            let category = String::from("bakery");
            catalog.products_in(Some(&category)).collect()
        };
        let ids: Vec<_> = products.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["bk1", "bk2", "bk3"]);
        assert_eq!(catalog.products_in(None).count(), 59);
    }

    #[test]
    fn available_count_per_category() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.available_count("meat"), 4);
    }
}
