//! Pure input validation rules for the inventory API.
//!
//! Every function here is side-effect free and returns the first rule
//! violation as a [`ServiceError`] carrying the exact client-facing message.
//! Check order is part of the contract: clients and the frontend rely on
//! which message wins when several rules fail at once, so the ordering in
//! each function must not be rearranged.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::auth::UserRole;
use crate::entities::{product, product_warehouse};
use crate::errors::ServiceError;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap_or_else(|e| panic!("invalid email regex: {e}"))
});

fn validation(message: &str) -> ServiceError {
    ServiceError::ValidationError(message.to_string())
}

/// Warehouse name rule shared by create and update: present, non-empty and
/// not just whitespace. The stored value keeps the caller's spelling.
pub fn validate_warehouse_name(name: Option<&str>) -> Result<String, ServiceError> {
    match name {
        Some(n) if !n.trim().is_empty() => Ok(n.to_string()),
        _ => Err(validation("Name is required")),
    }
}

/// Product create rule: name and price must both be present, price must not
/// be negative. Whitespace-only names pass, matching the catalog frontend.
pub fn validate_product_create(
    name: Option<&str>,
    price: Option<Decimal>,
) -> Result<(String, Decimal), ServiceError> {
    let (name, price) = match (name, price) {
        (Some(n), Some(p)) if !n.is_empty() => (n, p),
        _ => return Err(validation("Name, price and stock are required")),
    };
    if price < Decimal::ZERO {
        return Err(validation("Price must be a positive number"));
    }
    Ok((name.to_string(), price))
}

/// Product update rule: same as create, except the allocation array itself is
/// also mandatory (it is the complete desired stock distribution, not a patch).
pub fn validate_product_update(
    name: Option<&str>,
    price: Option<Decimal>,
    has_allocations: bool,
) -> Result<(String, Decimal), ServiceError> {
    let (name, price) = match (name, price) {
        (Some(n), Some(p)) if !n.is_empty() && has_allocations => (n, p),
        _ => return Err(validation("Name, price, and warehouses array are required")),
    };
    if price < Decimal::ZERO {
        return Err(validation("Price must be a positive number"));
    }
    Ok((name.to_string(), price))
}

/// A stock allocation must name its warehouse.
pub fn require_allocation_warehouse(warehouse_id: Option<i32>) -> Result<i32, ServiceError> {
    match warehouse_id {
        Some(id) if id != 0 => Ok(id),
        _ => Err(validation("warehouseId is required")),
    }
}

/// A stock allocation's quantity must be a present, non-negative number.
pub fn validate_allocation_stock(stock: Option<i32>) -> Result<i32, ServiceError> {
    match stock {
        Some(s) if s >= 0 => Ok(s),
        _ => Err(validation("Stock need to be a positive number")),
    }
}

/// Purchase input rules, checked in order: amount present and non-zero,
/// amount not negative, then the target warehouse reference.
pub fn validate_purchase(
    value: Option<i32>,
    warehouse_id: Option<i32>,
) -> Result<(i32, i32), ServiceError> {
    let value = match value {
        None | Some(0) => return Err(validation("Value is required")),
        Some(v) => v,
    };
    if value < 0 {
        return Err(validation("Value must be a positive number"));
    }
    let warehouse_id = match warehouse_id {
        None | Some(0) => return Err(validation("warehouseId is required")),
        Some(id) => id,
    };
    Ok((value, warehouse_id))
}

/// Outcome of looking up the product's stock relation for a sale.
///
/// `Unqueried` means the caller never performed the lookup, `Missing` means
/// the lookup ran and found nothing. The two cases carry distinct messages.
#[derive(Debug, Clone, Copy)]
pub enum RelationLookup<'a> {
    Unqueried,
    Missing,
    Found(&'a product_warehouse::Model),
}

/// Sale rules, in their historical order. The insufficient-stock comparison
/// deliberately runs before the sign check: a negative amount never trips
/// `stock < value`, so it falls through to the sign rule instead. Callers
/// depend on which of the two messages a given input produces.
pub fn validate_sale(
    product: &product::Model,
    warehouse_id: Option<i32>,
    relation: RelationLookup<'_>,
    value: Option<i32>,
) -> Result<(i32, i32), ServiceError> {
    let warehouse_id = match warehouse_id {
        None | Some(0) => return Err(validation("warehouseId is required")),
        Some(id) => id,
    };
    let relation = match relation {
        RelationLookup::Unqueried => {
            return Err(ServiceError::NotFound(
                "Warehouse relation not found for this product".to_string(),
            ))
        }
        RelationLookup::Missing => {
            return Err(ServiceError::NotFound(
                "Warehouse relation not found".to_string(),
            ))
        }
        RelationLookup::Found(rel) => rel,
    };
    let value = value.ok_or_else(|| validation("Value is required"))?;
    if relation.stock < value {
        return Err(ServiceError::InsufficientStock(
            "Stock not enough to do sales".to_string(),
        ));
    }
    if value < 0 {
        return Err(validation("value must be a positive number"));
    }
    if product.is_deleted {
        return Err(validation("Product has been deleted"));
    }
    Ok((warehouse_id, value))
}

/// Registration rules, checked in order. The duplicate-email check needs the
/// store and lives in the user service instead.
pub fn validate_registration(
    name: Option<&str>,
    email: Option<&str>,
    password: Option<&str>,
    role: Option<&str>,
) -> Result<(String, String, String, UserRole), ServiceError> {
    let (name, email, password, role) = match (name, email, password, role) {
        (Some(n), Some(e), Some(p), Some(r))
            if !n.is_empty() && !e.is_empty() && !p.is_empty() && !r.is_empty() =>
        {
            (n, e, p, r)
        }
        _ => return Err(validation("Name, email, role, and password are required")),
    };
    if name.trim().is_empty() {
        return Err(validation("Name should be a string and cannot be empty"));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(validation("Invalid email format"));
    }
    if password.len() < 6 {
        return Err(validation(
            "Password must be at least 6 characters long",
        ));
    }
    let role: UserRole = role
        .parse()
        .map_err(|_| validation("Role must be either an owner, manager or user"))?;
    Ok((name.to_string(), email.to_string(), password.to_string(), role))
}

/// Login rules: both credentials present, neither blank.
pub fn validate_login(
    email: Option<&str>,
    password: Option<&str>,
) -> Result<(String, String), ServiceError> {
    let (email, password) = match (email, password) {
        (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => (e, p),
        _ => return Err(validation("Email and password are required")),
    };
    if email.trim().is_empty() {
        return Err(validation("Email is required and must be a string"));
    }
    if password.trim().is_empty() {
        return Err(validation("Password is required and must be a string"));
    }
    Ok((email.to_string(), password.to_string()))
}
