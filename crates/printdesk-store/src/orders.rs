//! Order repository: typed facade over a [`RecordStore`] of orders.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tracing::info;

use crate::error::{Result, StoreError};
use crate::models::{NewOrder, Order, OrderStatus};
use crate::record_store::RecordStore;

/// Repository holding every customer order, insertion-ordered.
pub struct OrderRepository {
    store: RecordStore<Vec<Order>>,
    /// Disambiguates ids generated within the same millisecond.
    seq: AtomicU64,
}

impl OrderRepository {
    /// Open (or create) the orders document at `path`.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = RecordStore::open(path, Vec::new()).await?;
        Ok(Self {
            store,
            seq: AtomicU64::new(0),
        })
    }

    /// Validate and persist a new order. Returns the full stored record with
    /// its generated id, creation timestamp and initial `pending` status.
    pub async fn append(&self, new_order: NewOrder) -> Result<Order> {
        validate(&new_order)?;

        let order = Order {
            order_id: self.next_order_id(),
            full_name: new_order.full_name,
            phone_number: new_order.phone_number,
            print_type: new_order.print_type,
            binding_color_type: new_order.binding_color_type,
            copies: new_order.copies,
            paper_size: new_order.paper_size,
            print_side: new_order.print_side,
            selected_pages: new_order.selected_pages,
            color_pages: new_order.color_pages,
            bw_pages: new_order.bw_pages,
            special_instructions: new_order.special_instructions,
            files: new_order.files,
            order_date: Utc::now(),
            status: OrderStatus::Pending,
            total_cost: new_order.total_cost,
        };

        let stored = order.clone();
        self.store
            .update(move |orders| {
                orders.push(stored);
                Ok(())
            })
            .await?;

        info!(order_id = %order.order_id, "order created");
        Ok(order)
    }

    /// All orders in insertion order.
    pub async fn list(&self) -> Vec<Order> {
        self.store.snapshot().await
    }

    /// Look up a single order by id.
    pub async fn get(&self, order_id: &str) -> Result<Order> {
        self.store
            .snapshot()
            .await
            .into_iter()
            .find(|o| o.order_id == order_id)
            .ok_or_else(|| StoreError::OrderNotFound(order_id.to_string()))
    }

    /// Replace the status of an existing order and return the updated record.
    pub async fn update_status(&self, order_id: &str, status: OrderStatus) -> Result<Order> {
        let id = order_id.to_string();
        let updated = self
            .store
            .update(move |orders| {
                let order = orders
                    .iter_mut()
                    .find(|o| o.order_id == id)
                    .ok_or(StoreError::OrderNotFound(id.clone()))?;
                order.status = status;
                Ok(order.clone())
            })
            .await?;

        info!(order_id = %updated.order_id, status = ?updated.status, "order status updated");
        Ok(updated)
    }

    /// Irreversibly replace the whole collection with an empty one.
    pub async fn clear(&self) -> Result<()> {
        self.store.replace(Vec::new()).await?;
        info!("all orders cleared");
        Ok(())
    }

    /// `ORD-<millis>-<seq>`: keeps the human-readable timestamp prefix while
    /// the counter guarantees uniqueness for calls within one millisecond.
    fn next_order_id(&self) -> String {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        format!("ORD-{}-{:04}", Utc::now().timestamp_millis(), seq)
    }
}

fn validate(new_order: &NewOrder) -> Result<()> {
    for (field, value) in [
        ("fullName", &new_order.full_name),
        ("phoneNumber", &new_order.phone_number),
        ("printType", &new_order.print_type),
    ] {
        if value.trim().is_empty() {
            return Err(StoreError::Invalid(format!(
                "missing required field '{}'",
                field
            )));
        }
    }
    Ok(())
}
