use crate::error::{AppError, AppResult};
use crate::models::menu::{normalize_code, MAX_AMOUNT};
use crate::models::order::MAX_LINE_QUANTITY;
use crate::models::{
    AccountKind, Action, NewOrder, Order, OrderAction, OrderItem, OrderStatus, OrderTotals,
};
use crate::repositories::{AccountRepository, OrderRepository, RestaurantRepository};
use crate::services::NotificationService;
use chrono::{NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Last known position of whoever is carrying the order or driving the ride
#[derive(Debug, Clone, Serialize)]
pub struct CourierPosition {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderTracking {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub rider: Option<CourierPosition>,
    pub updated_at: NaiveDateTime,
}

/// Map an endpoint action name to the action for this kind of actor
fn resolve_action(name: &str, kind: AccountKind) -> AppResult<OrderAction> {
    let action = match (name, kind) {
        ("confirm", _) => OrderAction::Confirm,
        ("pickup", _) => OrderAction::Pickup,
        ("deliver", _) => OrderAction::Deliver,
        ("cancel", AccountKind::Restaurant) => OrderAction::CancelByRestaurant,
        ("cancel", _) => OrderAction::CancelByCustomer,
        _ => {
            return Err(AppError::NotFound(format!(
                "Unknown order action: {}",
                name
            )))
        }
    };
    if action.actor() != kind {
        return Err(AppError::Forbidden(format!(
            "Only a {} can {} an order",
            action.actor(),
            action.name()
        )));
    }
    Ok(action)
}

/// Sum quantities of repeated menu items, keeping first-seen order
fn merge_lines(order: &NewOrder) -> Vec<(Uuid, i32)> {
    let mut merged: Vec<(Uuid, i32)> = Vec::with_capacity(order.items.len());
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    for line in &order.items {
        match index.get(&line.menu_item_id) {
            Some(&i) => merged[i].1 += line.quantity,
            None => {
                index.insert(line.menu_item_id, merged.len());
                merged.push((line.menu_item_id, line.quantity));
            }
        }
    }
    merged
}

/// Service for food orders and their delivery
pub struct OrderService {
    order_repo: Arc<OrderRepository>,
    restaurant_repo: Arc<RestaurantRepository>,
    account_repo: Arc<AccountRepository>,
    notifications: Arc<NotificationService>,
}

impl OrderService {
    pub fn new(
        order_repo: Arc<OrderRepository>,
        restaurant_repo: Arc<RestaurantRepository>,
        account_repo: Arc<AccountRepository>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            order_repo,
            restaurant_repo,
            account_repo,
            notifications,
        }
    }

    /// Price and store a new order.
    ///
    /// Prices are snapshotted from the menu at this moment.
    pub async fn place_order(&self, customer_id: Uuid, new_order: &NewOrder) -> AppResult<Order> {
        info!(
            "Placing order: customer={}, restaurant={}, lines={}",
            customer_id,
            new_order.restaurant_id,
            new_order.items.len()
        );
        new_order.validate().map_err(AppError::Validation)?;

        let restaurant = self
            .account_repo
            .find_restaurant(new_order.restaurant_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Restaurant {} not found", new_order.restaurant_id))
            })?;
        if !restaurant.is_open {
            return Err(AppError::Validation(format!(
                "{} is not accepting orders",
                restaurant.name
            )));
        }

        let lines = merge_lines(new_order);
        let ids: Vec<Uuid> = lines.iter().map(|(id, _)| *id).collect();
        let menu: HashMap<Uuid, _> = self
            .restaurant_repo
            .find_menu_items(restaurant.id, &ids)
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

        let mut items = Vec::with_capacity(lines.len());
        for (menu_item_id, quantity) in lines {
            if quantity > MAX_LINE_QUANTITY {
                return Err(AppError::Validation(format!(
                    "Quantity must be between 1 and {}",
                    MAX_LINE_QUANTITY
                )));
            }
            let item = menu.get(&menu_item_id).ok_or_else(|| {
                AppError::Validation(format!(
                    "Item {} is not on {}'s menu",
                    menu_item_id, restaurant.name
                ))
            })?;
            if !item.is_available {
                return Err(AppError::Validation(format!(
                    "{} is currently unavailable",
                    item.name
                )));
            }
            items.push(OrderItem {
                menu_item_id,
                name: item.name.clone(),
                unit_price: item.price,
                quantity,
            });
        }

        let subtotal = OrderTotals::compute(&items, Decimal::ZERO).subtotal;
        if subtotal > MAX_AMOUNT {
            return Err(AppError::Validation(format!(
                "Order total cannot exceed {}",
                MAX_AMOUNT
            )));
        }
        let (discount, offer_code) = match new_order.offer_code.as_deref().map(normalize_code) {
            Some(code) if !code.is_empty() => {
                let offer = self
                    .restaurant_repo
                    .find_offer_by_code(restaurant.id, &code)
                    .await?
                    .ok_or_else(|| AppError::Validation(format!("Invalid offer code: {}", code)))?;
                let discount = offer
                    .discount_for(subtotal, Utc::now().naive_utc())
                    .map_err(AppError::Validation)?;
                (discount, Some(code))
            }
            _ => (Decimal::ZERO, None),
        };
        let totals = OrderTotals::compute(&items, discount);

        let order = self
            .order_repo
            .create(
                customer_id,
                restaurant.id,
                &items,
                &totals,
                offer_code.as_deref(),
                &new_order.delivery_address,
            )
            .await?;

        info!(
            "Order {} placed: total={}, discount={}",
            order.id, order.total, order.discount
        );
        self.notifications
            .notify(
                AccountKind::Restaurant,
                restaurant.id,
                "New order",
                format!("Order {} for {}", order.id, order.total),
            )
            .await;

        Ok(order)
    }

    pub async fn list(&self, kind: AccountKind, account_id: Uuid) -> AppResult<Vec<Order>> {
        Ok(self.order_repo.list_for(kind, account_id).await?)
    }

    /// Confirmed orders waiting for a rider
    pub async fn available_deliveries(&self) -> AppResult<Vec<Order>> {
        Ok(self.order_repo.list_available().await?)
    }

    /// Load an order visible to the caller.
    ///
    /// Riders may also see orders that are waiting for pickup.
    pub async fn get(&self, kind: AccountKind, account_id: Uuid, order_id: Uuid) -> AppResult<Order> {
        self.order_repo
            .find_by_id(order_id)
            .await?
            .filter(|o| {
                o.involves(kind, account_id)
                    || (kind == AccountKind::Rider
                        && o.rider_id.is_none()
                        && o.status_enum() == OrderStatus::Confirmed)
            })
            .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))
    }

    /// Apply a named action on behalf of `kind`/`actor_id`
    pub async fn transition(
        &self,
        kind: AccountKind,
        actor_id: Uuid,
        order_id: Uuid,
        action_name: &str,
    ) -> AppResult<Order> {
        let action = resolve_action(action_name, kind)?;
        let order = self.get(kind, actor_id, order_id).await?;

        action.apply(order.status_enum())?;
        let updated = self.order_repo.transition(order_id, action, actor_id).await?;

        info!(
            "Order {}: {} -> {} by {} {}",
            order_id, order.status, updated.status, kind, actor_id
        );
        self.notify_parties(&updated, kind).await;
        Ok(updated)
    }

    /// Tell everyone on the order except the actor about its new status
    async fn notify_parties(&self, order: &Order, actor: AccountKind) {
        let body = format!("Order {} is now {}", order.id, order.status);
        let mut recipients = vec![
            (AccountKind::Customer, order.customer_id),
            (AccountKind::Restaurant, order.restaurant_id),
        ];
        if let Some(rider_id) = order.rider_id {
            recipients.push((AccountKind::Rider, rider_id));
        }
        for (kind, id) in recipients.into_iter().filter(|(kind, _)| *kind != actor) {
            self.notifications
                .notify(kind, id, "Order update", body.clone())
                .await;
        }
    }

    /// Status and the assigned rider's last known position
    pub async fn tracking(
        &self,
        kind: AccountKind,
        account_id: Uuid,
        order_id: Uuid,
    ) -> AppResult<OrderTracking> {
        let order = self.get(kind, account_id, order_id).await?;
        let rider = match order.rider_id {
            Some(rider_id) => self
                .account_repo
                .find_rider(rider_id)
                .await?
                .map(|r| CourierPosition {
                    id: r.id,
                    name: r.full_name,
                    phone: r.phone,
                    latitude: r.latitude,
                    longitude: r.longitude,
                }),
            None => None,
        };

        Ok(OrderTracking {
            order_id: order.id,
            status: order.status_enum(),
            rider,
            updated_at: order.updated_at,
        })
    }
}
