use crate::error::RepositoryError;
use crate::models::{MenuItem, MenuItemUpdate, NewMenuItem, NewOffer, Offer, Restaurant};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Partial update of a restaurant profile
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RestaurantUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub cuisine: Option<String>,
    pub is_open: Option<bool>,
}

/// Repository for restaurant profiles, menus and offers
pub struct RestaurantRepository {
    pool: PgPool,
}

impl RestaurantRepository {
    /// Create a new RestaurantRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List restaurants, best rated first
    pub async fn list(
        &self,
        open_only: bool,
        cuisine: Option<&str>,
    ) -> Result<Vec<Restaurant>, RepositoryError> {
        let restaurants = sqlx::query_as::<_, Restaurant>(
            r#"
            SELECT * FROM restaurants
            WHERE ($1 = FALSE OR is_open = TRUE)
              AND ($2::TEXT IS NULL OR LOWER(cuisine) = LOWER($2))
            ORDER BY rating_avg DESC, name ASC
            "#,
        )
        .bind(open_only)
        .bind(cuisine)
        .fetch_all(&self.pool)
        .await?;
        Ok(restaurants)
    }

    /// Update the editable profile fields, leaving `None` fields as they are
    pub async fn update_profile(
        &self,
        id: Uuid,
        update: &RestaurantUpdate,
    ) -> Result<Restaurant, RepositoryError> {
        let restaurant = sqlx::query_as::<_, Restaurant>(
            r#"
            UPDATE restaurants
            SET name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                address = COALESCE($4, address),
                cuisine = COALESCE($5, cuisine),
                is_open = COALESCE($6, is_open)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.phone.as_deref().map(str::trim))
        .bind(update.address.as_deref().map(str::trim))
        .bind(update.cuisine.as_deref().map(str::trim))
        .bind(update.is_open)
        .fetch_one(&self.pool)
        .await?;
        Ok(restaurant)
    }

    // =========================================================================
    // Menu
    // =========================================================================

    /// Add a menu item
    pub async fn add_menu_item(
        &self,
        restaurant_id: Uuid,
        item: &NewMenuItem,
    ) -> Result<MenuItem, RepositoryError> {
        let item = sqlx::query_as::<_, MenuItem>(
            r#"
            INSERT INTO menu_items (restaurant_id, name, description, price, category)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(restaurant_id)
        .bind(item.name.trim())
        .bind(item.description.trim())
        .bind(item.price)
        .bind(item.category.trim())
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    /// Update one of the restaurant's own items
    pub async fn update_menu_item(
        &self,
        restaurant_id: Uuid,
        item_id: Uuid,
        update: &MenuItemUpdate,
    ) -> Result<Option<MenuItem>, RepositoryError> {
        let item = sqlx::query_as::<_, MenuItem>(
            r#"
            UPDATE menu_items
            SET name = COALESCE($3, name),
                description = COALESCE($4, description),
                price = COALESCE($5, price),
                category = COALESCE($6, category),
                is_available = COALESCE($7, is_available)
            WHERE id = $1 AND restaurant_id = $2
            RETURNING *
            "#,
        )
        .bind(item_id)
        .bind(restaurant_id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.description.as_deref().map(str::trim))
        .bind(update.price)
        .bind(update.category.as_deref().map(str::trim))
        .bind(update.is_available)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    /// Remove one of the restaurant's own items
    pub async fn remove_menu_item(
        &self,
        restaurant_id: Uuid,
        item_id: Uuid,
    ) -> Result<bool, RepositoryError> {
        let rows_affected =
            sqlx::query("DELETE FROM menu_items WHERE id = $1 AND restaurant_id = $2")
                .bind(item_id)
                .bind(restaurant_id)
                .execute(&self.pool)
                .await?
                .rows_affected();
        Ok(rows_affected > 0)
    }

    /// A restaurant's menu, grouped by category
    pub async fn list_menu(
        &self,
        restaurant_id: Uuid,
        available_only: bool,
    ) -> Result<Vec<MenuItem>, RepositoryError> {
        let items = sqlx::query_as::<_, MenuItem>(
            r#"
            SELECT * FROM menu_items
            WHERE restaurant_id = $1 AND ($2 = FALSE OR is_available = TRUE)
            ORDER BY category ASC, name ASC
            "#,
        )
        .bind(restaurant_id)
        .bind(available_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// Items of one restaurant among `ids`; ids from other restaurants are dropped
    pub async fn find_menu_items(
        &self,
        restaurant_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<MenuItem>, RepositoryError> {
        let items = sqlx::query_as::<_, MenuItem>(
            "SELECT * FROM menu_items WHERE restaurant_id = $1 AND id = ANY($2)",
        )
        .bind(restaurant_id)
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    // =========================================================================
    // Offers
    // =========================================================================

    /// Create an offer. Reusing a code within the restaurant is a `Duplicate`.
    pub async fn create_offer(
        &self,
        restaurant_id: Uuid,
        offer: &NewOffer,
    ) -> Result<Offer, RepositoryError> {
        let offer = sqlx::query_as::<_, Offer>(
            r#"
            INSERT INTO offers (restaurant_id, title, code, discount_percent, min_order_amount, valid_until)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(restaurant_id)
        .bind(offer.title.trim())
        .bind(offer.normalized_code())
        .bind(offer.discount_percent)
        .bind(offer.min_order_amount)
        .bind(offer.valid_until)
        .fetch_one(&self.pool)
        .await?;
        Ok(offer)
    }

    /// Switch off one of the restaurant's own offers
    pub async fn deactivate_offer(
        &self,
        restaurant_id: Uuid,
        offer_id: Uuid,
    ) -> Result<Option<Offer>, RepositoryError> {
        let offer = sqlx::query_as::<_, Offer>(
            r#"
            UPDATE offers SET is_active = FALSE
            WHERE id = $1 AND restaurant_id = $2
            RETURNING *
            "#,
        )
        .bind(offer_id)
        .bind(restaurant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(offer)
    }

    /// Offers of a restaurant; `live_only` hides inactive and expired ones
    pub async fn list_offers(
        &self,
        restaurant_id: Uuid,
        live_only: bool,
    ) -> Result<Vec<Offer>, RepositoryError> {
        let offers = sqlx::query_as::<_, Offer>(
            r#"
            SELECT * FROM offers
            WHERE restaurant_id = $1
              AND ($2 = FALSE OR (is_active = TRUE AND (valid_until IS NULL OR valid_until > NOW())))
            ORDER BY created_at DESC
            "#,
        )
        .bind(restaurant_id)
        .bind(live_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(offers)
    }

    /// Look up an offer by its (already normalized) code
    pub async fn find_offer_by_code(
        &self,
        restaurant_id: Uuid,
        code: &str,
    ) -> Result<Option<Offer>, RepositoryError> {
        let offer = sqlx::query_as::<_, Offer>(
            "SELECT * FROM offers WHERE restaurant_id = $1 AND code = $2",
        )
        .bind(restaurant_id)
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(offer)
    }
}
