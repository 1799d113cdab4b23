/// Order persistence — the admin dashboard's view of the hosted backend.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("order not found: {0:?}")]
    NotFound(OrderId),
    #[error("backend connection error: {0}")]
    Connection(String),
}

/// Newtype wrapper for order IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Delivered,
    Returned,
    Cancelled,
}

/// A rental order as submitted through the checkout flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// `None` until the store assigns one.
    pub id: Option<OrderId>,
    pub customer_name: String,
    pub customer_email: String,
    pub equipment: String,
    pub rental_days: u32,
    pub total_cents: u64,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update from the dashboard's edit form. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPatch {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub equipment: Option<String>,
    pub rental_days: Option<u32>,
    pub total_cents: Option<u64>,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
}

impl OrderPatch {
    pub fn apply(self, order: &mut Order) {
        if let Some(v) = self.customer_name {
            order.customer_name = v;
        }
        if let Some(v) = self.customer_email {
            order.customer_email = v;
        }
        if let Some(v) = self.equipment {
            order.equipment = v;
        }
        if let Some(v) = self.rental_days {
            order.rental_days = v;
        }
        if let Some(v) = self.total_cents {
            order.total_cents = v;
        }
        if self.delivery_address.is_some() {
            order.delivery_address = self.delivery_address;
        }
        if self.notes.is_some() {
            order.notes = self.notes;
        }
    }
}

/// Backend collaborator for orders.
pub trait OrderStore {
    /// Persist a new order, returning it with its assigned id.
    fn save(&mut self, order: Order) -> Result<Order, OrderError>;
    fn list(&self) -> Result<Vec<Order>, OrderError>;
    fn update_status(&mut self, id: OrderId, status: OrderStatus) -> Result<Order, OrderError>;
    fn update(&mut self, id: OrderId, patch: OrderPatch) -> Result<Order, OrderError>;
    fn delete(&mut self, id: OrderId) -> Result<(), OrderError>;
}

/// In-process store for tests and local demos.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: BTreeMap<OrderId, Order>,
    next_id: u64,
    offline: bool,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the backend being unreachable.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    fn check_online(&self) -> Result<(), OrderError> {
        if self.offline {
            return Err(OrderError::Connection("backend unreachable".to_string()));
        }
        Ok(())
    }

    fn get_mut(&mut self, id: OrderId) -> Result<&mut Order, OrderError> {
        self.orders.get_mut(&id).ok_or(OrderError::NotFound(id))
    }
}

impl OrderStore for InMemoryOrderStore {
    fn save(&mut self, mut order: Order) -> Result<Order, OrderError> {
        self.check_online()?;
        self.next_id += 1;
        let id = OrderId(self.next_id);
        order.id = Some(id);
        self.orders.insert(id, order.clone());
        debug!(order_id = id.0, "order saved");
        Ok(order)
    }

    fn list(&self) -> Result<Vec<Order>, OrderError> {
        self.check_online()?;
        Ok(self.orders.values().cloned().collect())
    }

    fn update_status(&mut self, id: OrderId, status: OrderStatus) -> Result<Order, OrderError> {
        self.check_online()?;
        let order = self.get_mut(id)?;
        order.status = status;
        Ok(order.clone())
    }

    fn update(&mut self, id: OrderId, patch: OrderPatch) -> Result<Order, OrderError> {
        self.check_online()?;
        let order = self.get_mut(id)?;
        patch.apply(order);
        Ok(order.clone())
    }

    fn delete(&mut self, id: OrderId) -> Result<(), OrderError> {
        self.check_online()?;
        self.orders
            .remove(&id)
            .map(|_| ())
            .ok_or(OrderError::NotFound(id))
    }
}

#[cfg(test)]
pub(crate) fn sample_order() -> Order {
    Order {
        id: None,
        customer_name: "Dana Reyes".to_string(),
        customer_email: "dana@example.com".to_string(),
        equipment: "hospital bed".to_string(),
        rental_days: 14,
        total_cents: 28_500,
        status: OrderStatus::Pending,
        delivery_address: Some("12 Elm St, Austin, TX".to_string()),
        notes: None,
    }
}
