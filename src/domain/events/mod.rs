//! Domain events
use crate::domain::aggregates::OrderStatus;
use crate::domain::value_objects::Money;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    OrderPlaced { order_id: Uuid, user_id: String, total: Money, items: usize },
    OrderStatusChanged { order_id: Uuid, from: OrderStatus, to: OrderStatus, stock_deducted: bool },
    CategoryRenamed { category_id: Uuid, from: String, to: String, products: u64 },
}

impl DomainEvent {
    /// Suffix of the subject this event is published on.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OrderPlaced { .. } => "order.placed",
            Self::OrderStatusChanged { .. } => "order.status_changed",
            Self::CategoryRenamed { .. } => "category.renamed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json() {
        let e = DomainEvent::OrderStatusChanged {
            order_id: Uuid::nil(), from: OrderStatus::Pending, to: OrderStatus::Completed, stock_deducted: true,
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["type"], "order_status_changed");
        assert_eq!(json["to"], "completed");
        assert_eq!(e.kind(), "order.status_changed");
    }
}
