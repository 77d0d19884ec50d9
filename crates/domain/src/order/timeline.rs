use common::{OrderId, OrderStatus, UserId};
use store::{Order, OrderStore, StatusChange, StatusEvent};

use super::owned_order;
use crate::error::{DomainError, Result};

const CUSTOMER_CANCEL_REMARKS: &str = "Cancelled by customer";

/// Append-only status log per order.
///
/// Every append updates `orders.status` and inserts the event in one store
/// call, and the store rechecks the allowed predecessors while holding the
/// order. The first event is always `PLACED` because only checkout writes it.
#[derive(Clone)]
pub struct TimelineService<S> {
    store: S,
}

impl<S: OrderStore> TimelineService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Appends `status`, enforcing the fulfillment state machine.
    ///
    /// `PLACED` can never be appended, terminal orders accept nothing, and
    /// `CANCELLED` is reachable from any non-terminal status. When cancelling,
    /// `remarks` doubles as the cancellation reason.
    #[tracing::instrument(skip(self))]
    pub async fn advance(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        remarks: Option<String>,
    ) -> Result<(Order, StatusEvent)> {
        let cancellation_reason = (status == OrderStatus::Cancelled)
            .then(|| remarks.clone())
            .flatten();
        self.append(
            order_id,
            StatusChange {
                status,
                remarks,
                allowed_from: OrderStatus::predecessors(status),
                cancellation_reason,
            },
        )
        .await
    }

    /// Customer cancellation, allowed only while the order is `PLACED` or
    /// `CONFIRMED`.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(
        &self,
        user_id: UserId,
        order_id: OrderId,
        reason: Option<String>,
    ) -> Result<Order> {
        owned_order(&self.store, user_id, order_id).await?;

        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        let allowed_from = OrderStatus::ALL
            .into_iter()
            .filter(OrderStatus::is_customer_cancellable)
            .collect();

        let (order, _) = self
            .append(
                order_id,
                StatusChange {
                    status: OrderStatus::Cancelled,
                    remarks: Some(
                        reason
                            .clone()
                            .unwrap_or_else(|| CUSTOMER_CANCEL_REMARKS.to_string()),
                    ),
                    allowed_from,
                    cancellation_reason: reason,
                },
            )
            .await?;
        Ok(order)
    }

    /// Status of the most recently appended event.
    pub async fn current_status(&self, order_id: OrderId) -> Result<OrderStatus> {
        self.store
            .latest_status_event(order_id)
            .await?
            .map(|event| event.status)
            .ok_or_else(|| DomainError::not_found("order", order_id))
    }

    /// Every event of the order, oldest first.
    pub async fn history(&self, order_id: OrderId) -> Result<Vec<StatusEvent>> {
        Ok(self.store.status_history(order_id).await?)
    }

    async fn append(
        &self,
        order_id: OrderId,
        change: StatusChange,
    ) -> Result<(Order, StatusEvent)> {
        let status = change.status;
        match self.store.append_status(order_id, change).await {
            Ok((order, event)) => {
                metrics::counter!("order_status_changes_total", "status" => status.as_str())
                    .increment(1);
                tracing::info!(%order_id, %status, "order status changed");
                Ok((order, event))
            }
            Err(err) => {
                let err = DomainError::from(err);
                if let DomainError::InvalidTransition { from, to } = &err {
                    tracing::warn!(%order_id, %from, %to, "status change rejected");
                }
                Err(err)
            }
        }
    }
}
