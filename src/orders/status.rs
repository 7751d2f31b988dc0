//! Order status lifecycle.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when an order is asked to move to a status it cannot reach.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusError {
    /// The order has already finished.
    #[error("order is already {0}")]
    Terminal(OrderStatus),

    /// The requested status is not a successor of the current one.
    #[error("cannot move order from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: OrderStatus,
        /// Requested status.
        to: OrderStatus,
    },
}

/// Who is looking at an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderRole {
    /// The purchaser; their view is read-only.
    Buyer,

    /// The owner of the shop fulfilling the order.
    ShopOwner,
}

/// Where an order is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    /// Placed and waiting for the shop.
    Pending,

    /// Accepted; stock has been taken out of inventory.
    Preparing,

    /// Ready for collection or dispatch.
    Ready,

    /// Out with a courier.
    InDelivery,

    /// Handed over to the buyer.
    Completed,

    /// Abandoned before it was ready.
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Preparing,
        Self::Ready,
        Self::InDelivery,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Statuses reachable from this one. The chain is the same for pickup and delivery orders.
    pub fn successors(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Preparing, Self::Cancelled],
            Self::Preparing => &[Self::Ready, Self::Cancelled],
            Self::Ready => &[Self::InDelivery],
            Self::InDelivery => &[Self::Completed],
            Self::Completed | Self::Cancelled => &[],
        }
    }

    /// Actions offered to a viewer of an order with this status.
    pub fn next_actions(self, role: OrderRole) -> &'static [Self] {
        match role {
            OrderRole::Buyer => &[],
            OrderRole::ShopOwner => self.successors(),
        }
    }

    /// Validate a move to `next`.
    ///
    /// # Errors
    ///
    /// - [`StatusError::Terminal`]: the order has already completed or been cancelled.
    /// - [`StatusError::InvalidTransition`]: `next` is not a successor of this status.
    pub fn transition_to(self, next: Self) -> Result<Self, StatusError> {
        if self.is_terminal() {
            return Err(StatusError::Terminal(self));
        }

        if self.successors().contains(&next) {
            Ok(next)
        } else {
            Err(StatusError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Whether moving to `next` takes ordered stock out of inventory.
    pub fn decrements_inventory(self, next: Self) -> bool {
        matches!((self, next), (Self::Pending, Self::Preparing))
    }

    /// Stable wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::InDelivery => "in-delivery",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn happy_path() -> TestResult {
        let status = OrderStatus::Pending
            .transition_to(OrderStatus::Preparing)?
            .transition_to(OrderStatus::Ready)?
            .transition_to(OrderStatus::InDelivery)?
            .transition_to(OrderStatus::Completed)?;

        assert_eq!(status, OrderStatus::Completed);

        Ok(())
    }

    #[test]
    fn ready_orders_go_out_before_completing() {
        assert_eq!(
            OrderStatus::Ready.transition_to(OrderStatus::InDelivery),
            Ok(OrderStatus::InDelivery)
        );
        assert_eq!(
            OrderStatus::Ready.transition_to(OrderStatus::Completed),
            Err(StatusError::InvalidTransition {
                from: OrderStatus::Ready,
                to: OrderStatus::Completed,
            })
        );
    }

    #[test]
    fn cancellation_only_before_ready() {
        assert!(
            OrderStatus::Pending
                .transition_to(OrderStatus::Cancelled)
                .is_ok()
        );
        assert!(
            OrderStatus::Preparing
                .transition_to(OrderStatus::Cancelled)
                .is_ok()
        );
        assert!(
            OrderStatus::Ready
                .transition_to(OrderStatus::Cancelled)
                .is_err()
        );
    }

    #[test]
    fn terminal_states_reject_everything() {
        for terminal in [OrderStatus::Completed, OrderStatus::Cancelled] {
            for next in OrderStatus::ALL {
                assert_eq!(
                    terminal.transition_to(next),
                    Err(StatusError::Terminal(terminal))
                );
            }
        }
    }

    #[test]
    fn buyers_get_no_actions() {
        for status in OrderStatus::ALL {
            assert!(status.next_actions(OrderRole::Buyer).is_empty());
        }

        assert_eq!(
            OrderStatus::Pending.next_actions(OrderRole::ShopOwner),
            &[OrderStatus::Preparing, OrderStatus::Cancelled]
        );
        assert_eq!(
            OrderStatus::Ready.next_actions(OrderRole::ShopOwner),
            &[OrderStatus::InDelivery]
        );
    }

    #[test]
    fn only_accepting_an_order_touches_inventory() {
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let expected = from == OrderStatus::Pending && to == OrderStatus::Preparing;

                assert_eq!(from.decrements_inventory(to), expected, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn serializes_kebab_case() -> TestResult {
        assert_eq!(
            serde_json::to_string(&OrderStatus::InDelivery)?,
            "\"in-delivery\""
        );

        for status in OrderStatus::ALL {
            assert_eq!(
                serde_json::to_string(&status)?,
                format!("\"{}\"", status.as_str())
            );
        }

        Ok(())
    }
}
