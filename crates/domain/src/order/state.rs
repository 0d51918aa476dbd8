//! Order production state machine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::OrderError;

/// The production state of an order.
///
/// State transitions:
/// ```text
/// (new) ──► Received ──► Processing ──► Completed ──► Delivered
///               │             │
///               └─────────────┴──► Cancelled
/// ```
///
/// The position before an order exists has no variant; it is expressed as
/// `Option::<OrderState>::None` wherever it matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OrderState {
    /// Order arrived from the payment system and waits for the kitchen.
    Received,

    /// The kitchen is preparing the order.
    Processing,

    /// Order is ready to be handed out.
    Completed,

    /// Order was handed to the customer (terminal state).
    Delivered,

    /// Order was cancelled (terminal state).
    Cancelled,
}

impl OrderState {
    /// Every named state, in lifecycle order.
    pub const ALL: [OrderState; 5] = [
        OrderState::Received,
        OrderState::Processing,
        OrderState::Completed,
        OrderState::Delivered,
        OrderState::Cancelled,
    ];

    /// Returns the states reachable in one step from `from`.
    ///
    /// `None` stands for "no order yet", whose only edge leads to `Received`.
    pub fn allowed_targets(from: Option<OrderState>) -> &'static [OrderState] {
        match from {
            None => &[OrderState::Received],
            Some(OrderState::Received) => &[OrderState::Processing, OrderState::Cancelled],
            Some(OrderState::Processing) => &[OrderState::Completed, OrderState::Cancelled],
            Some(OrderState::Completed) => &[OrderState::Delivered],
            Some(OrderState::Delivered) | Some(OrderState::Cancelled) => &[],
        }
    }

    /// Returns true if `self -> to` is an edge of the transition graph.
    pub fn can_transition_to(&self, to: OrderState) -> bool {
        Self::allowed_targets(Some(*self)).contains(&to)
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        Self::allowed_targets(Some(*self)).is_empty()
    }

    /// Returns the human-readable state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Received => "Received",
            OrderState::Processing => "Processing",
            OrderState::Completed => "Completed",
            OrderState::Delivered => "Delivered",
            OrderState::Cancelled => "Cancelled",
        }
    }

    /// Resolves a state from its name. Unknown names resolve to `None`.
    pub fn from_name(name: &str) -> Option<OrderState> {
        Self::ALL.into_iter().find(|state| state.as_str() == name)
    }

    /// Returns the numeric code stored in the `orders.state` column.
    pub fn code(&self) -> i16 {
        match self {
            OrderState::Received => 1,
            OrderState::Processing => 2,
            OrderState::Completed => 3,
            OrderState::Delivered => 4,
            OrderState::Cancelled => 5,
        }
    }

    /// Resolves a state from its stored code.
    pub fn from_code(code: i16) -> Option<OrderState> {
        Self::ALL.into_iter().find(|state| state.code() == code)
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderState {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| OrderError::UnknownState(s.to_string()))
    }
}
