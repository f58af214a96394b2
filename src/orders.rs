//! Access-control lab: orders are looked up by id and must belong to the caller.

use serde::Serialize;

use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub role: String,
    pub department: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: u64,
    #[serde(rename = "userId")]
    pub user_id: u64,
    pub item: String,
    pub region: String,
    pub total: u64,
}

/// Users and orders for the lab. Built once at startup and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct OrderStore {
    users: Vec<User>,
    orders: Vec<Order>,
}

impl OrderStore {
    pub fn new(users: Vec<User>, orders: Vec<Order>) -> Self {
        Self { users, orders }
    }

    pub fn seeded() -> Self {
        let user = |id, name: &str, role: &str, department: &str| User {
            id,
            name: name.into(),
            role: role.into(),
            department: department.into(),
        };
        let order = |id, user_id, item: &str, region: &str, total| Order {
            id,
            user_id,
            item: item.into(),
            region: region.into(),
            total,
        };
        Self::new(
            vec![
                user(1, "Alice", "customer", "north"),
                user(2, "Bob", "customer", "south"),
                user(3, "Charlie", "support", "north"),
            ],
            vec![
                order(1, 1, "Laptop", "north", 2000),
                order(2, 1, "Mouse", "north", 40),
                order(3, 2, "Monitor", "south", 300),
                order(4, 2, "Keyboard", "south", 60),
            ],
        )
    }

    pub fn user(&self, id: u64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Fetch an order on behalf of `user`. Existence is checked before
    /// ownership, so an unknown id is 404 and someone else's order is 403.
    pub fn order_for(&self, user: &User, order_id: u64) -> AppResult<&Order> {
        let order = self
            .orders
            .iter()
            .find(|o| o.id == order_id)
            .ok_or(AppError::NotFound)?;
        if order.user_id != user.id {
            return Err(AppError::Forbidden);
        }
        Ok(order)
    }
}
