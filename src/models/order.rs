use super::account::AccountKind;
use super::lifecycle::{parse_or, Action, Status};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Maximum quantity of a single line item
pub const MAX_LINE_QUANTITY: i32 = 50;

/// Order status. Delivery is tracked on the order itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Delivering,
    Delivered,
    Cancelled,
}

impl Status for OrderStatus {
    const ENTITY: &'static str = "order";

    fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Delivering => "delivering",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "confirmed" => Some(OrderStatus::Confirmed),
            "delivering" => Some(OrderStatus::Delivering),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

/// Endpoint-triggered order transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    /// Restaurant accepts the order
    Confirm,
    /// Rider claims a confirmed order
    Pickup,
    /// Rider hands the food over
    Deliver,
    CancelByCustomer,
    CancelByRestaurant,
}

impl Action for OrderAction {
    type State = OrderStatus;

    fn name(&self) -> &'static str {
        match self {
            OrderAction::Confirm => "confirm",
            OrderAction::Pickup => "pick up",
            OrderAction::Deliver => "deliver",
            OrderAction::CancelByCustomer | OrderAction::CancelByRestaurant => "cancel",
        }
    }

    fn from_states(&self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            OrderAction::Confirm => &[Pending],
            OrderAction::Pickup => &[Confirmed],
            OrderAction::Deliver => &[Delivering],
            OrderAction::CancelByCustomer => &[Pending],
            OrderAction::CancelByRestaurant => &[Pending, Confirmed],
        }
    }

    fn target(&self) -> OrderStatus {
        match self {
            OrderAction::Confirm => OrderStatus::Confirmed,
            OrderAction::Pickup => OrderStatus::Delivering,
            OrderAction::Deliver => OrderStatus::Delivered,
            OrderAction::CancelByCustomer | OrderAction::CancelByRestaurant => {
                OrderStatus::Cancelled
            }
        }
    }

    fn actor(&self) -> AccountKind {
        match self {
            OrderAction::Confirm | OrderAction::CancelByRestaurant => AccountKind::Restaurant,
            OrderAction::Pickup | OrderAction::Deliver => AccountKind::Rider,
            OrderAction::CancelByCustomer => AccountKind::Customer,
        }
    }
}

/// Line item snapshot taken when the order is placed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub menu_item_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl OrderItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Food order
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub rider_id: Option<Uuid>,
    pub items: Value, // JSONB array of OrderItem
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub offer_code: Option<String>,
    pub delivery_address: String,
    pub status: String, // Stored as TEXT, use OrderStatus for type safety
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Order {
    pub fn status_enum(&self) -> OrderStatus {
        parse_or(&self.status, OrderStatus::Pending)
    }

    /// Whether `kind`/`id` is a party to this order
    pub fn involves(&self, kind: AccountKind, id: Uuid) -> bool {
        match kind {
            AccountKind::Customer => self.customer_id == id,
            AccountKind::Restaurant => self.restaurant_id == id,
            AccountKind::Rider => self.rider_id == Some(id),
            AccountKind::Driver => false,
        }
    }
}

/// Requested line of a new order
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLine {
    pub menu_item_id: Uuid,
    pub quantity: i32,
}

/// Payload for placing an order
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    pub restaurant_id: Uuid,
    pub items: Vec<OrderLine>,
    pub delivery_address: String,
    pub offer_code: Option<String>,
}

impl NewOrder {
    pub fn validate(&self) -> Result<(), String> {
        if self.items.is_empty() {
            return Err("Order must contain at least one item".to_string());
        }
        if self.delivery_address.trim().is_empty() {
            return Err("Delivery address is required".to_string());
        }
        for line in &self.items {
            if !(1..=MAX_LINE_QUANTITY).contains(&line.quantity) {
                return Err(format!(
                    "Quantity must be between 1 and {}",
                    MAX_LINE_QUANTITY
                ));
            }
        }
        Ok(())
    }
}

/// Money breakdown of an order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    pub fn compute(items: &[OrderItem], discount: Decimal) -> Self {
        let subtotal: Decimal = items.iter().map(OrderItem::line_total).sum();
        let discount = discount.min(subtotal);
        Self {
            subtotal,
            discount,
            total: subtotal - discount,
        }
    }
}
