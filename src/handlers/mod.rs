//! HTTP layer: request DTOs come from the services, response shaping and
//! role gates live here.

pub mod auth;
pub mod common;
pub mod products;
pub mod purchases;
pub mod sales;
pub mod warehouses;

use crate::auth::{RequiredRoles, UserRole};

/// Owner-only operations: warehouse writes and product deletion.
pub(crate) const OWNER_ONLY: RequiredRoles = RequiredRoles(&[UserRole::Owner]);
/// Catalog and warehouse management.
pub(crate) const STAFF: RequiredRoles = RequiredRoles(&[UserRole::Owner, UserRole::Manager]);
/// Day-to-day stock movements are open to every role.
pub(crate) const ALL_ROLES: RequiredRoles =
    RequiredRoles(&[UserRole::Owner, UserRole::Manager, UserRole::User]);
