//! Fixed domain catalogs: the four e-commerce tables and the analysis types.
//!
//! Static data, not configurable at runtime. Nodes read table names and descriptions
//! from here; `SqliteWarehouse::create_tables` uses the DDL.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One table the analyses may query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableInfo {
    pub name: &'static str,
    pub description: &'static str,
    /// `CREATE TABLE IF NOT EXISTS` statement for the local SQLite warehouse.
    pub ddl: &'static str,
}

/// The e-commerce tables, in the order schemas are fetched.
pub const TABLES: [TableInfo; 4] = [
    TableInfo {
        name: "orders",
        description: "Customer order information and transaction data",
        ddl: "CREATE TABLE IF NOT EXISTS orders (
            order_id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            status TEXT,
            gender TEXT,
            created_at TEXT,
            returned_at TEXT,
            shipped_at TEXT,
            delivered_at TEXT,
            num_of_item INTEGER
        )",
    },
    TableInfo {
        name: "order_items",
        description: "Individual items within orders with quantities and prices",
        ddl: "CREATE TABLE IF NOT EXISTS order_items (
            id INTEGER PRIMARY KEY,
            order_id INTEGER NOT NULL,
            user_id INTEGER,
            product_id INTEGER NOT NULL,
            inventory_item_id INTEGER,
            status TEXT,
            created_at TEXT,
            shipped_at TEXT,
            delivered_at TEXT,
            returned_at TEXT,
            sale_price REAL
        )",
    },
    TableInfo {
        name: "products",
        description: "Product catalog with details and categories",
        ddl: "CREATE TABLE IF NOT EXISTS products (
            id INTEGER PRIMARY KEY,
            cost REAL,
            category TEXT,
            name TEXT,
            brand TEXT,
            retail_price REAL,
            department TEXT,
            sku TEXT,
            distribution_center_id INTEGER
        )",
    },
    TableInfo {
        name: "users",
        description: "Customer demographics and profile information",
        ddl: "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            first_name TEXT,
            last_name TEXT,
            email TEXT,
            age INTEGER,
            gender TEXT,
            state TEXT,
            street_address TEXT,
            postal_code TEXT,
            city TEXT,
            country TEXT,
            latitude REAL,
            longitude REAL,
            traffic_source TEXT,
            created_at TEXT
        )",
    },
];

/// Catalog entry for `name`, if it is one of the e-commerce tables.
pub fn table(name: &str) -> Option<&'static TableInfo> {
    TABLES.iter().find(|t| t.name == name)
}

/// Table names in catalog order.
pub fn table_names() -> impl Iterator<Item = &'static str> {
    TABLES.iter().map(|t| t.name)
}

/// Kind of analysis a question asks for. `General` is the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    CustomerSegmentation,
    ProductPerformance,
    SalesTrends,
    GeographicPatterns,
    General,
}

impl AnalysisType {
    pub const ALL: [AnalysisType; 5] = [
        AnalysisType::CustomerSegmentation,
        AnalysisType::ProductPerformance,
        AnalysisType::SalesTrends,
        AnalysisType::GeographicPatterns,
        AnalysisType::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::CustomerSegmentation => "customer_segmentation",
            AnalysisType::ProductPerformance => "product_performance",
            AnalysisType::SalesTrends => "sales_trends",
            AnalysisType::GeographicPatterns => "geographic_patterns",
            AnalysisType::General => "general",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AnalysisType::CustomerSegmentation => "Customer segmentation and behavior analysis",
            AnalysisType::ProductPerformance => "Product performance and recommendation insights",
            AnalysisType::SalesTrends => "Sales trends and seasonality patterns",
            AnalysisType::GeographicPatterns => "Geographic sales patterns and regional analysis",
            AnalysisType::General => "General data analysis and insights",
        }
    }

    /// Normalizes a classifier reply: trimmed, lower-cased, exact catalog match, else `General`.
    pub fn from_reply(reply: &str) -> Self {
        reply
            .trim()
            .to_lowercase()
            .parse()
            .unwrap_or(AnalysisType::General)
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnalysisType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown analysis type: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_four_tables_in_order() {
        let names: Vec<_> = table_names().collect();
        assert_eq!(names, vec!["orders", "order_items", "products", "users"]);
        assert!(table("products").is_some());
        assert!(table("inventory").is_none());
    }

    #[test]
    fn from_reply_normalizes_case_and_whitespace() {
        assert_eq!(
            AnalysisType::from_reply("  Product_Performance\n"),
            AnalysisType::ProductPerformance
        );
        assert_eq!(AnalysisType::from_reply("SALES_TRENDS"), AnalysisType::SalesTrends);
    }

    #[test]
    fn from_reply_falls_back_to_general() {
        assert_eq!(AnalysisType::from_reply("churn analysis"), AnalysisType::General);
        assert_eq!(AnalysisType::from_reply(""), AnalysisType::General);
    }

    #[test]
    fn display_and_serde_use_snake_case_names() {
        assert_eq!(AnalysisType::GeographicPatterns.to_string(), "geographic_patterns");
        let json = serde_json::to_string(&AnalysisType::CustomerSegmentation).unwrap();
        assert_eq!(json, "\"customer_segmentation\"");
    }
}
