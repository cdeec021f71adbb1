use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Largest amount a `NUMERIC(12, 2)` column holds: 9,999,999,999.99
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

/// A dish on a restaurant's menu
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MenuItem {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal, // NUMERIC(12, 2)
    pub category: String,
    pub is_available: bool,
    pub created_at: NaiveDateTime,
}

/// Payload for adding a menu item
#[derive(Debug, Clone, Deserialize)]
pub struct NewMenuItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub category: String,
}

impl NewMenuItem {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Menu item name is required".to_string());
        }
        validate_price(self.price)
    }
}

/// Partial update of a menu item
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub is_available: Option<bool>,
}

impl MenuItemUpdate {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err("Menu item name cannot be blank".to_string());
            }
        }
        match self.price {
            Some(price) => validate_price(price),
            None => Ok(()),
        }
    }
}

fn validate_price(price: Decimal) -> Result<(), String> {
    if price <= Decimal::ZERO {
        return Err("Price must be greater than zero".to_string());
    }
    if price > MAX_AMOUNT {
        return Err(format!("Price cannot exceed {}", MAX_AMOUNT));
    }
    if price.scale() > 2 && price != price.round_dp(2) {
        return Err("Price may have at most two decimal places".to_string());
    }
    Ok(())
}

/// Promotional discount code
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Offer {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub title: String,
    pub code: String,
    pub discount_percent: i32,
    pub min_order_amount: Decimal,
    pub valid_until: Option<NaiveDateTime>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

impl Offer {
    /// Active and not yet expired
    pub fn is_live(&self, now: NaiveDateTime) -> bool {
        self.is_active && self.valid_until.map_or(true, |until| now < until)
    }

    /// Discount on `subtotal`, or why the offer does not apply
    pub fn discount_for(&self, subtotal: Decimal, now: NaiveDateTime) -> Result<Decimal, String> {
        if !self.is_live(now) {
            return Err(format!("Offer {} is no longer valid", self.code));
        }
        if subtotal < self.min_order_amount {
            return Err(format!(
                "Offer {} requires a minimum order of {}",
                self.code, self.min_order_amount
            ));
        }
        let discount = subtotal * Decimal::from(self.discount_percent) / Decimal::ONE_HUNDRED;
        Ok(discount.round_dp(2).min(subtotal))
    }
}

/// Payload for creating an offer
#[derive(Debug, Clone, Deserialize)]
pub struct NewOffer {
    pub title: String,
    pub code: String,
    pub discount_percent: i32,
    #[serde(default)]
    pub min_order_amount: Decimal,
    pub valid_until: Option<NaiveDateTime>,
}

impl NewOffer {
    /// Codes are matched case-insensitively and stored upper-case.
    pub fn normalized_code(&self) -> String {
        normalize_code(&self.code)
    }

    pub fn validate(&self, now: NaiveDateTime) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Offer title is required".to_string());
        }
        let code = self.normalized_code();
        if code.is_empty() || code.len() > 32 || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err("Offer code must be 1-32 letters or digits".to_string());
        }
        if !(1..=100).contains(&self.discount_percent) {
            return Err("Discount must be between 1 and 100 percent".to_string());
        }
        if self.min_order_amount < Decimal::ZERO {
            return Err("Minimum order amount cannot be negative".to_string());
        }
        if self.min_order_amount > MAX_AMOUNT {
            return Err(format!("Minimum order amount cannot exceed {}", MAX_AMOUNT));
        }
        if let Some(until) = self.valid_until {
            if until <= now {
                return Err("Offer expiry must be in the future".to_string());
            }
        }
        Ok(())
    }
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
