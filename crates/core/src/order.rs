use crate::{DeckConfig, StorageError, StoreConfig, REQUIRED_TOTAL};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern")
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid status '{0}'")]
pub struct InvalidStatus(pub String);

impl FromStr for OrderStatus {
    type Err = InvalidStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| InvalidStatus(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
    #[serde(rename = "shippingName")]
    pub name: String,
    #[serde(rename = "shippingEmail")]
    pub email: String,
    #[serde(rename = "shippingPhone", default)]
    pub phone: Option<String>,
    #[serde(rename = "shippingAddress")]
    pub address: String,
    #[serde(rename = "shippingCity")]
    pub city: String,
    #[serde(rename = "shippingState")]
    pub state: String,
    #[serde(rename = "shippingZip")]
    pub zip: String,
    #[serde(rename = "shippingCountry")]
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ShippingDetails {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        let mut min_len = |field: &'static str, value: &str, min: usize, message: &str| {
            if value.trim().chars().count() < min {
                errors.push(FieldError::new(field, message));
            }
        };
        min_len("shippingName", &self.name, 2, "Name must be at least 2 characters");
        min_len("shippingAddress", &self.address, 5, "Address must be at least 5 characters");
        min_len("shippingCity", &self.city, 2, "City must be at least 2 characters");
        min_len("shippingState", &self.state, 2, "State is required");
        min_len("shippingZip", &self.zip, 3, "ZIP code is required");
        min_len("shippingCountry", &self.country, 2, "Country is required");
        if !EMAIL.is_match(self.email.trim()) {
            errors.push(FieldError::new("shippingEmail", "Invalid email address"));
        }
        errors
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref().filter(|phone| !phone.trim().is_empty())
    }
}

/// Checkout form as submitted by the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub deck_config: DeckConfig,
    pub quantity: u32,
    #[serde(flatten)]
    pub shipping: ShippingDetails,
}

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("Deck must have exactly {} cards", REQUIRED_TOTAL)]
    DeckSize { total: u32 },
    #[error("Card back design must be selected")]
    MissingCardBack,
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

pub fn validate_order_request(
    request: &OrderRequest,
    store: &StoreConfig,
) -> Result<(), OrderError> {
    let mut errors = request.shipping.validate();
    let max = store.pricing.max_quantity;
    if request.quantity < 1 || request.quantity > max {
        errors.insert(
            0,
            FieldError::new("quantity", format!("Quantity must be between 1 and {max}")),
        );
    }
    if !errors.is_empty() {
        return Err(OrderError::Validation(errors));
    }
    let total = request.deck_config.total();
    if total != REQUIRED_TOTAL {
        return Err(OrderError::DeckSize { total });
    }
    if request.deck_config.card_back.is_none() {
        return Err(OrderError::MissingCardBack);
    }
    Ok(())
}

/// Order row as handed to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub deck_config: DeckConfig,
    pub quantity: u32,
    pub total_amount: i64,
    #[serde(flatten)]
    pub shipping: ShippingDetails,
    #[serde(default)]
    pub payment_reference: Option<String>,
    #[serde(default)]
    pub payment_provider: Option<String>,
}

impl NewOrder {
    pub fn from_request(request: OrderRequest, total_amount: i64) -> Self {
        Self {
            deck_config: request.deck_config,
            quantity: request.quantity,
            total_amount,
            shipping: request.shipping,
            payment_reference: None,
            payment_provider: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    #[serde(flatten)]
    pub details: NewOrder,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Order {
    /// Customer-facing order number.
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_uppercase()
    }
}

pub trait OrderRepository {
    fn create(&mut self, order: NewOrder, now: OffsetDateTime) -> Result<Order, StorageError>;
    fn get(&self, id: Uuid) -> Result<Option<Order>, StorageError>;
    fn get_by_reference(&self, reference: &str) -> Result<Option<Order>, StorageError>;
    /// Newest first.
    fn list(&self) -> Result<Vec<Order>, StorageError>;
    /// Notes are only replaced when given.
    fn update_status(
        &mut self,
        id: Uuid,
        status: OrderStatus,
        notes: Option<String>,
        now: OffsetDateTime,
    ) -> Result<Option<Order>, StorageError>;
}

/// Plain in-memory order table; file-backed repositories wrap it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderBook {
    pub orders: Vec<Order>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, details: NewOrder, now: OffsetDateTime) -> Order {
        let order = Order {
            id: Uuid::new_v4(),
            details,
            status: OrderStatus::Pending,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        self.orders.push(order.clone());
        order
    }

    pub fn find(&self, id: Uuid) -> Option<&Order> {
        self.orders.iter().find(|order| order.id == id)
    }

    pub fn find_by_reference(&self, reference: &str) -> Option<&Order> {
        self.orders
            .iter()
            .find(|order| order.details.payment_reference.as_deref() == Some(reference))
    }

    pub fn newest_first(&self) -> Vec<Order> {
        let mut orders: Vec<Order> = self.orders.iter().rev().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    pub fn set_status(
        &mut self,
        id: Uuid,
        status: OrderStatus,
        notes: Option<String>,
        now: OffsetDateTime,
    ) -> Option<Order> {
        let order = self.orders.iter_mut().find(|order| order.id == id)?;
        order.status = status;
        if notes.is_some() {
            order.notes = notes;
        }
        order.updated_at = now;
        Some(order.clone())
    }
}

impl OrderRepository for OrderBook {
    fn create(&mut self, order: NewOrder, now: OffsetDateTime) -> Result<Order, StorageError> {
        Ok(self.insert(order, now))
    }

    fn get(&self, id: Uuid) -> Result<Option<Order>, StorageError> {
        Ok(self.find(id).cloned())
    }

    fn get_by_reference(&self, reference: &str) -> Result<Option<Order>, StorageError> {
        Ok(self.find_by_reference(reference).cloned())
    }

    fn list(&self) -> Result<Vec<Order>, StorageError> {
        Ok(self.newest_first())
    }

    fn update_status(
        &mut self,
        id: Uuid,
        status: OrderStatus,
        notes: Option<String>,
        now: OffsetDateTime,
    ) -> Result<Option<Order>, StorageError> {
        Ok(self.set_status(id, status, notes, now))
    }
}
