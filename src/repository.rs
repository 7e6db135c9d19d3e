use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::EngineError;
use crate::model::{Order, OrderId, OrderStatus};

/// The persistence collaborator's contract. The core treats any error here
/// as retryable — it never inspects the cause, only whether the write
/// landed — and never assumes this store is the process's only writer.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create_order(&self, order: &Order) -> Result<(), EngineError>;
    async fn get_order_by_id(&self, id: &OrderId) -> Result<Option<Order>, EngineError>;
    async fn update_order(&self, order: &Order) -> Result<(), EngineError>;
    async fn update_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
        patch: Option<OrderPatch>,
    ) -> Result<(), EngineError>;
    async fn get_orders(&self, limit: usize, offset: usize) -> Result<Vec<Order>, EngineError>;
}

/// Sparse update applied alongside a status transition, so a caller doesn't
/// need to read-modify-write the whole order just to set a tx hash.
#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
    pub selected_venue: Option<String>,
    pub executed_price: Option<f64>,
    pub amount_out: Option<f64>,
    pub tx_hash: Option<String>,
    pub error_message: Option<String>,
}

/// The active-order cache contract: a read-through cache for hot orders. The
/// repository remains authoritative; this is purely an optimization, so
/// `is_healthy` degrading never blocks an order's progress.
#[async_trait]
pub trait ActiveOrderCache: Send + Sync {
    async fn set_active_order(&self, order: &Order) -> Result<(), EngineError>;
    async fn get_active_order(&self, id: &OrderId) -> Result<Option<Order>, EngineError>;
    async fn update_active_order(&self, order: &Order) -> Result<(), EngineError>;
    async fn is_healthy(&self) -> bool;
    async fn close(&self);
}

/// In-memory reference implementation of [`OrderRepository`]. Sufficient to
/// run the full pipeline in tests and via the demo adapter; explicitly not a
/// production datastore (no durability, no concurrent-writer isolation
/// beyond a single mutex).
#[derive(Default)]
pub struct InMemoryRepository {
    orders: Mutex<HashMap<OrderId, Order>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        InMemoryRepository::default()
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepository {
    async fn create_order(&self, order: &Order) -> Result<(), EngineError> {
        self.orders.lock().unwrap().insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn get_order_by_id(&self, id: &OrderId) -> Result<Option<Order>, EngineError> {
        Ok(self.orders.lock().unwrap().get(id).cloned())
    }

    async fn update_order(&self, order: &Order) -> Result<(), EngineError> {
        let mut orders = self.orders.lock().unwrap();
        orders.insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn update_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
        patch: Option<OrderPatch>,
    ) -> Result<(), EngineError> {
        let mut orders = self.orders.lock().unwrap();
        let order = orders
            .get_mut(id)
            .ok_or_else(|| EngineError::NotFound(format!("order '{id}'")))?;
        order.transition(status);
        if let Some(patch) = patch {
            if patch.selected_venue.is_some() {
                order.selected_venue = patch.selected_venue;
            }
            if patch.executed_price.is_some() {
                order.executed_price = patch.executed_price;
            }
            if patch.amount_out.is_some() {
                order.amount_out = patch.amount_out;
            }
            if patch.tx_hash.is_some() {
                order.tx_hash = patch.tx_hash;
            }
            if patch.error_message.is_some() {
                order.error_message = patch.error_message;
            }
        }
        Ok(())
    }

    async fn get_orders(&self, limit: usize, offset: usize) -> Result<Vec<Order>, EngineError> {
        let orders = self.orders.lock().unwrap();
        let mut all: Vec<Order> = orders.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all.into_iter().skip(offset).take(limit).collect())
    }
}

/// In-memory reference implementation of [`ActiveOrderCache`].
#[derive(Default)]
pub struct InMemoryCache {
    active: Mutex<HashMap<OrderId, Order>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        InMemoryCache::default()
    }
}

#[async_trait]
impl ActiveOrderCache for InMemoryCache {
    async fn set_active_order(&self, order: &Order) -> Result<(), EngineError> {
        self.active.lock().unwrap().insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn get_active_order(&self, id: &OrderId) -> Result<Option<Order>, EngineError> {
        Ok(self.active.lock().unwrap().get(id).cloned())
    }

    async fn update_active_order(&self, order: &Order) -> Result<(), EngineError> {
        if order.status.is_terminal() {
            self.active.lock().unwrap().remove(&order.id);
        } else {
            self.active.lock().unwrap().insert(order.id.clone(), order.clone());
        }
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        true
    }

    async fn close(&self) {}
}
