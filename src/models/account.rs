use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;
use uuid::Uuid;

/// The four independent account collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Customer,
    Restaurant,
    /// Ride-hailing driver
    Driver,
    /// Food delivery courier
    Rider,
}

impl AccountKind {
    pub const ALL: [AccountKind; 4] = [
        AccountKind::Customer,
        AccountKind::Restaurant,
        AccountKind::Driver,
        AccountKind::Rider,
    ];

    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "customer" => Ok(AccountKind::Customer),
            "restaurant" => Ok(AccountKind::Restaurant),
            "driver" => Ok(AccountKind::Driver),
            "rider" => Ok(AccountKind::Rider),
            _ => Err(format!("Invalid account kind: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Customer => "customer",
            AccountKind::Restaurant => "restaurant",
            AccountKind::Driver => "driver",
            AccountKind::Rider => "rider",
        }
    }

    /// Backing table. Only ever one of four literals, so safe to splice into SQL.
    pub fn table(&self) -> &'static str {
        match self {
            AccountKind::Customer => "customers",
            AccountKind::Restaurant => "restaurants",
            AccountKind::Driver => "drivers",
            AccountKind::Rider => "riders",
        }
    }

    /// Parse the plural path segment used by the registration routes.
    pub fn from_collection(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.table() == segment)
    }
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Columns shared by every account table, used for login.
#[derive(Debug, Clone, FromRow)]
pub struct Credentials {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
}

/// A last-known position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        Some(Self {
            latitude: latitude?,
            longitude: longitude?,
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(format!("Latitude out of range: {}", self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(format!("Longitude out of range: {}", self.longitude));
        }
        Ok(())
    }
}

/// Customer account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub created_at: NaiveDateTime,
}

/// Restaurant account. Menu items and offers live in their own tables.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Restaurant {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub cuisine: String,
    pub latitude: f64,
    pub longitude: f64,
    pub is_open: bool,
    pub rating_avg: Decimal,
    pub rating_count: i32,
    pub created_at: NaiveDateTime,
}

/// Ride-hailing driver account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Driver {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub full_name: String,
    pub phone: String,
    pub license_number: String,
    pub vehicle_model: String,
    pub vehicle_plate: String,
    pub is_available: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub rating_avg: Decimal,
    pub rating_count: i32,
    pub created_at: NaiveDateTime,
}

impl Driver {
    pub fn location(&self) -> Option<Location> {
        Location::from_parts(self.latitude, self.longitude)
    }
}

/// Delivery courier account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Rider {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub full_name: String,
    pub phone: String,
    pub vehicle_type: String,
    pub is_available: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub rating_avg: Decimal,
    pub rating_count: i32,
    pub created_at: NaiveDateTime,
}

impl Rider {
    pub fn location(&self) -> Option<Location> {
        Location::from_parts(self.latitude, self.longitude)
    }
}

/// Any account, as loaded after login to build the session snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Account {
    Customer(Customer),
    Restaurant(Restaurant),
    Driver(Driver),
    Rider(Rider),
}

impl Account {
    pub fn kind(&self) -> AccountKind {
        match self {
            Account::Customer(_) => AccountKind::Customer,
            Account::Restaurant(_) => AccountKind::Restaurant,
            Account::Driver(_) => AccountKind::Driver,
            Account::Rider(_) => AccountKind::Rider,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Account::Customer(c) => c.id,
            Account::Restaurant(r) => r.id,
            Account::Driver(d) => d.id,
            Account::Rider(r) => r.id,
        }
    }

    pub fn username(&self) -> &str {
        match self {
            Account::Customer(c) => &c.username,
            Account::Restaurant(r) => &r.username,
            Account::Driver(d) => &d.username,
            Account::Rider(r) => &r.username,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Account::Customer(c) => &c.full_name,
            Account::Restaurant(r) => &r.name,
            Account::Driver(d) => &d.full_name,
            Account::Rider(r) => &r.full_name,
        }
    }

    /// Denormalized attributes carried inside the session token
    pub fn snapshot(&self) -> Value {
        match self {
            Account::Customer(c) => json!({
                "email": c.email,
                "phone": c.phone,
                "address": c.address,
            }),
            Account::Restaurant(r) => json!({
                "email": r.email,
                "phone": r.phone,
                "address": r.address,
                "cuisine": r.cuisine,
            }),
            Account::Driver(d) => json!({
                "phone": d.phone,
                "vehicle_model": d.vehicle_model,
                "vehicle_plate": d.vehicle_plate,
            }),
            Account::Rider(r) => json!({
                "phone": r.phone,
                "vehicle_type": r.vehicle_type,
            }),
        }
    }
}

/// Registration payload for a customer
#[derive(Debug, Clone, Deserialize)]
pub struct NewCustomer {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

/// Registration payload for a restaurant
#[derive(Debug, Clone, Deserialize)]
pub struct NewRestaurant {
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    #[serde(default)]
    pub cuisine: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

/// Registration payload for a driver
#[derive(Debug, Clone, Deserialize)]
pub struct NewDriver {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub phone: String,
    pub license_number: String,
    pub vehicle_model: String,
    pub vehicle_plate: String,
}

/// Registration payload for a rider
#[derive(Debug, Clone, Deserialize)]
pub struct NewRider {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub phone: String,
    pub vehicle_type: String,
}

/// Any registration payload
#[derive(Debug, Clone)]
pub enum Registration {
    Customer(NewCustomer),
    Restaurant(NewRestaurant),
    Driver(NewDriver),
    Rider(NewRider),
}

impl Registration {
    pub fn kind(&self) -> AccountKind {
        match self {
            Registration::Customer(_) => AccountKind::Customer,
            Registration::Restaurant(_) => AccountKind::Restaurant,
            Registration::Driver(_) => AccountKind::Driver,
            Registration::Rider(_) => AccountKind::Rider,
        }
    }

    pub fn username(&self) -> &str {
        match self {
            Registration::Customer(c) => &c.username,
            Registration::Restaurant(r) => &r.username,
            Registration::Driver(d) => &d.username,
            Registration::Rider(r) => &r.username,
        }
    }

    pub fn password(&self) -> &str {
        match self {
            Registration::Customer(c) => &c.password,
            Registration::Restaurant(r) => &r.password,
            Registration::Driver(d) => &d.password,
            Registration::Rider(r) => &r.password,
        }
    }

    /// Profile fields that must not be blank, by name
    fn required_fields(&self) -> Vec<(&'static str, &str)> {
        match self {
            Registration::Customer(c) => vec![
                ("full_name", c.full_name.as_str()),
                ("email", c.email.as_str()),
                ("phone", c.phone.as_str()),
            ],
            Registration::Restaurant(r) => vec![
                ("name", r.name.as_str()),
                ("email", r.email.as_str()),
                ("phone", r.phone.as_str()),
                ("address", r.address.as_str()),
            ],
            Registration::Driver(d) => vec![
                ("full_name", d.full_name.as_str()),
                ("phone", d.phone.as_str()),
                ("license_number", d.license_number.as_str()),
                ("vehicle_model", d.vehicle_model.as_str()),
                ("vehicle_plate", d.vehicle_plate.as_str()),
            ],
            Registration::Rider(r) => vec![
                ("full_name", r.full_name.as_str()),
                ("phone", r.phone.as_str()),
                ("vehicle_type", r.vehicle_type.as_str()),
            ],
        }
    }

    /// Validate username, password and the required profile fields
    pub fn validate(&self) -> Result<(), String> {
        validate_username(self.username())?;
        if self.password().chars().count() < 8 {
            return Err("Password must be at least 8 characters".to_string());
        }
        for (field, value) in self.required_fields() {
            if value.trim().is_empty() {
                return Err(format!("{} is required", field));
            }
        }
        if let Registration::Customer(NewCustomer { email, .. })
        | Registration::Restaurant(NewRestaurant { email, .. }) = self
        {
            if !email.contains('@') {
                return Err(format!("Invalid email: {}", email));
            }
        }
        if let Registration::Restaurant(r) = self {
            Location {
                latitude: r.latitude,
                longitude: r.longitude,
            }
            .validate()?;
        }
        Ok(())
    }
}

/// 3 to 32 characters of letters, digits, `_` or `.`
pub fn validate_username(username: &str) -> Result<(), String> {
    let len = username.chars().count();
    if !(3..=32).contains(&len) {
        return Err("Username must be between 3 and 32 characters".to_string());
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return Err("Username may only contain letters, digits, '_' and '.'".to_string());
    }
    Ok(())
}
