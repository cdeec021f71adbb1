use crate::error::RepositoryError;
use crate::models::{
    Account, AccountKind, Credentials, Customer, Driver, Location, Registration, Restaurant, Rider,
};
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for the four account collections
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    /// Create a new AccountRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Login columns for a username within one collection
    pub async fn find_credentials(
        &self,
        kind: AccountKind,
        username: &str,
    ) -> Result<Option<Credentials>, RepositoryError> {
        let sql = format!(
            "SELECT id, username, password_hash FROM {} WHERE username = $1",
            kind.table()
        );
        let credentials = sqlx::query_as::<_, Credentials>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(credentials)
    }

    /// Whether the username is taken in this kind's collection
    pub async fn username_exists(
        &self,
        kind: AccountKind,
        username: &str,
    ) -> Result<bool, RepositoryError> {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE username = $1)",
            kind.table()
        );
        let exists = sqlx::query_scalar::<_, bool>(&sql)
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Insert a new account. A concurrent duplicate surfaces as `Duplicate`.
    pub async fn create(
        &self,
        registration: &Registration,
        password_hash: &str,
    ) -> Result<Account, RepositoryError> {
        let account = match registration {
            Registration::Customer(c) => Account::Customer(
                sqlx::query_as::<_, Customer>(
                    r#"
                    INSERT INTO customers (username, password_hash, full_name, email, phone, address)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING *
                    "#,
                )
                .bind(&c.username)
                .bind(password_hash)
                .bind(c.full_name.trim())
                .bind(c.email.trim())
                .bind(c.phone.trim())
                .bind(c.address.trim())
                .fetch_one(&self.pool)
                .await?,
            ),
            Registration::Restaurant(r) => Account::Restaurant(
                sqlx::query_as::<_, Restaurant>(
                    r#"
                    INSERT INTO restaurants
                        (username, password_hash, name, email, phone, address, cuisine, latitude, longitude)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                    RETURNING *
                    "#,
                )
                .bind(&r.username)
                .bind(password_hash)
                .bind(r.name.trim())
                .bind(r.email.trim())
                .bind(r.phone.trim())
                .bind(r.address.trim())
                .bind(r.cuisine.trim())
                .bind(r.latitude)
                .bind(r.longitude)
                .fetch_one(&self.pool)
                .await?,
            ),
            Registration::Driver(d) => Account::Driver(
                sqlx::query_as::<_, Driver>(
                    r#"
                    INSERT INTO drivers
                        (username, password_hash, full_name, phone, license_number, vehicle_model, vehicle_plate)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    RETURNING *
                    "#,
                )
                .bind(&d.username)
                .bind(password_hash)
                .bind(d.full_name.trim())
                .bind(d.phone.trim())
                .bind(d.license_number.trim())
                .bind(d.vehicle_model.trim())
                .bind(d.vehicle_plate.trim())
                .fetch_one(&self.pool)
                .await?,
            ),
            Registration::Rider(r) => Account::Rider(
                sqlx::query_as::<_, Rider>(
                    r#"
                    INSERT INTO riders (username, password_hash, full_name, phone, vehicle_type)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING *
                    "#,
                )
                .bind(&r.username)
                .bind(password_hash)
                .bind(r.full_name.trim())
                .bind(r.phone.trim())
                .bind(r.vehicle_type.trim())
                .fetch_one(&self.pool)
                .await?,
            ),
        };
        Ok(account)
    }

    /// Load any account by kind and id
    pub async fn find_account(
        &self,
        kind: AccountKind,
        id: Uuid,
    ) -> Result<Option<Account>, RepositoryError> {
        let account = match kind {
            AccountKind::Customer => self.find_customer(id).await?.map(Account::Customer),
            AccountKind::Restaurant => self.find_restaurant(id).await?.map(Account::Restaurant),
            AccountKind::Driver => self.find_driver(id).await?.map(Account::Driver),
            AccountKind::Rider => self.find_rider(id).await?.map(Account::Rider),
        };
        Ok(account)
    }

    /// Find a customer by UUID
    pub async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, RepositoryError> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(customer)
    }

    /// Find a restaurant by UUID
    pub async fn find_restaurant(&self, id: Uuid) -> Result<Option<Restaurant>, RepositoryError> {
        let restaurant = sqlx::query_as::<_, Restaurant>("SELECT * FROM restaurants WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(restaurant)
    }

    /// Find a driver by UUID
    pub async fn find_driver(&self, id: Uuid) -> Result<Option<Driver>, RepositoryError> {
        let driver = sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(driver)
    }

    /// Find a rider by UUID
    pub async fn find_rider(&self, id: Uuid) -> Result<Option<Rider>, RepositoryError> {
        let rider = sqlx::query_as::<_, Rider>("SELECT * FROM riders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(rider)
    }

    /// Update availability and/or position of a driver or rider.
    ///
    /// Returns false when no such account exists.
    pub async fn update_courier_status(
        &self,
        kind: AccountKind,
        id: Uuid,
        is_available: Option<bool>,
        location: Option<Location>,
    ) -> Result<bool, RepositoryError> {
        if !matches!(kind, AccountKind::Driver | AccountKind::Rider) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "{} accounts have no courier status",
                kind
            )));
        }

        let sql = format!(
            r#"
            UPDATE {}
            SET is_available = COALESCE($2, is_available),
                latitude = COALESCE($3, latitude),
                longitude = COALESCE($4, longitude)
            WHERE id = $1
            "#,
            kind.table()
        );
        let rows_affected = sqlx::query(&sql)
            .bind(id)
            .bind(is_available)
            .bind(location.map(|l| l.latitude))
            .bind(location.map(|l| l.longitude))
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }
}
