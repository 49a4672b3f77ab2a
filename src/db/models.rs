use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const PRODUCT_CATEGORIES: &[&str] = &["Sedan", "SUV", "Truck", "Coupe", "Convertible"];
pub const ORDER_STATUSES: &[&str] = &["Pending", "Paid", "Shipped", "Completed", "Cancelled"];
pub const USER_STATUSES: &[&str] = &["active", "blocked"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Paid => "Paid",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<OrderStatus> {
        match value {
            "Pending" => Some(OrderStatus::Pending),
            "Paid" => Some(OrderStatus::Paid),
            "Shipped" => Some(OrderStatus::Shipped),
            "Completed" => Some(OrderStatus::Completed),
            "Cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// Map a gateway-reported bank status to an order status.
    /// Anything unrecognized stays Pending.
    pub fn from_bank_status(bank_status: &str) -> OrderStatus {
        match bank_status {
            "Success" => OrderStatus::Paid,
            "Failed" => OrderStatus::Pending,
            "Cancel" => OrderStatus::Cancelled,
            _ => OrderStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub owner: Uuid,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: BigDecimal,
    pub category: String,
    pub description: String,
    pub quantity: i32,
    pub in_stock: bool,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(
        owner: Uuid,
        brand: String,
        model: String,
        year: i32,
        price: BigDecimal,
        category: String,
        description: String,
        quantity: i32,
        image_url: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner,
            brand,
            model,
            year,
            price,
            category,
            description,
            in_stock: quantity > 0,
            quantity,
            image_url,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_price: BigDecimal,
    pub status: String,
    pub transaction_id: Option<String>,
    pub transaction_status: Option<String>,
    pub bank_status: Option<String>,
    pub sp_code: Option<String>,
    pub sp_message: Option<String>,
    pub payment_method: Option<String>,
    pub paid_at_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(user_id: Uuid, total_price: BigDecimal) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            total_price,
            status: OrderStatus::Pending.as_str().to_string(),
            transaction_id: None,
            transaction_status: None,
            bank_status: None,
            sp_code: None,
            sp_message: None,
            payment_method: None,
            paid_at_text: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("root"), None);
        assert_eq!(Role::Admin.as_str(), "admin");
    }

    #[test]
    fn order_status_round_trips() {
        for status in ORDER_STATUSES {
            let parsed = OrderStatus::parse(status).expect("known status");
            assert_eq!(parsed.as_str(), *status);
        }
        assert_eq!(OrderStatus::parse("Refunded"), None);
    }

    #[test]
    fn bank_status_mapping() {
        assert_eq!(OrderStatus::from_bank_status("Success"), OrderStatus::Paid);
        assert_eq!(OrderStatus::from_bank_status("Failed"), OrderStatus::Pending);
        assert_eq!(OrderStatus::from_bank_status("Cancel"), OrderStatus::Cancelled);
        assert_eq!(OrderStatus::from_bank_status("Initiated"), OrderStatus::Pending);
        assert_eq!(OrderStatus::from_bank_status(""), OrderStatus::Pending);
    }

    #[test]
    fn new_product_derives_in_stock() {
        let with_stock = Product::new(
            Uuid::new_v4(),
            "Toyota".to_string(),
            "Corolla".to_string(),
            2022,
            BigDecimal::from(25000),
            "Sedan".to_string(),
            "Reliable commuter".to_string(),
            3,
            "https://img.example.com/corolla.jpg".to_string(),
        );
        assert!(with_stock.in_stock);

        let without_stock = Product::new(
            Uuid::new_v4(),
            "Ford".to_string(),
            "F-150".to_string(),
            2021,
            BigDecimal::from(40000),
            "Truck".to_string(),
            "Work truck".to_string(),
            0,
            "https://img.example.com/f150.jpg".to_string(),
        );
        assert!(!without_stock.in_stock);
    }

    #[test]
    fn new_order_starts_pending_without_transaction() {
        let order = Order::new(Uuid::new_v4(), BigDecimal::from(100));
        assert_eq!(order.status, "Pending");
        assert!(order.transaction_id.is_none());
        assert!(order.bank_status.is_none());
    }
}
