//! Request shapes accepted by the order production use cases.
//!
//! Each input validates itself and hands the service typed values.

use common::{ItemId, OrderId};
use domain::{Item, OrderState};
use serde::{Deserialize, Serialize};

use crate::{Result, ServiceError};

/// One item of a creation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderProductionItemInput {
    pub id: String,
    pub name: String,
    pub quantity: i64,
}

/// Creation request, as carried by the payment notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderProductionInput {
    pub order_id: String,
    pub items: Vec<CreateOrderProductionItemInput>,
}

impl CreateOrderProductionInput {
    /// Validates the request and returns the order id and its items.
    pub fn parse(&self) -> Result<(OrderId, Vec<Item>)> {
        let order_id = parse_order_id(&self.order_id)?;

        let items = self
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let id = ItemId::new(item.id.as_str());
                if !id.is_uuid_v4() {
                    return Err(invalid(format!("items[{index}].id must be a UUID v4")));
                }
                if item.name.trim().is_empty() {
                    return Err(invalid(format!("items[{index}].name is required")));
                }
                let quantity = u32::try_from(item.quantity)
                    .ok()
                    .filter(|q| *q >= 1)
                    .ok_or_else(|| invalid(format!("items[{index}].quantity must be at least 1")))?;

                Ok(Item::new(id, item.name.as_str(), quantity))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((order_id, items))
    }
}

/// Lookup of a single order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetOrderProductionByIdInput {
    pub order_id: String,
}

impl GetOrderProductionByIdInput {
    pub fn new(order_id: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
        }
    }

    pub fn parse(&self) -> Result<OrderId> {
        parse_order_id(&self.order_id)
    }
}

/// Lookup of every order in a state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetOrderProductionByStateInput {
    pub state: String,
}

impl GetOrderProductionByStateInput {
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
        }
    }

    pub fn parse(&self) -> Result<OrderState> {
        parse_state(&self.state)
    }
}

/// State change request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOrderProductionInput {
    pub order_id: String,
    pub state: String,
}

impl UpdateOrderProductionInput {
    pub fn new(order_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            state: state.into(),
        }
    }

    pub fn parse(&self) -> Result<(OrderId, OrderState)> {
        Ok((parse_order_id(&self.order_id)?, parse_state(&self.state)?))
    }
}

fn invalid(reason: impl Into<String>) -> ServiceError {
    ServiceError::Validation(reason.into())
}

fn parse_order_id(raw: &str) -> Result<OrderId> {
    let id = OrderId::new(raw);
    if !id.is_uuid_v4() {
        return Err(invalid("order_id must be a UUID v4"));
    }
    Ok(id)
}

fn parse_state(raw: &str) -> Result<OrderState> {
    if raw.is_empty() {
        return Err(invalid("state is required"));
    }
    Ok(raw.parse::<OrderState>()?)
}
