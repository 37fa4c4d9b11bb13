//! Core types for Modish.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod role;
pub mod status;
pub mod variant;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{PriceError, line_total, real_price};
pub use role::{Role, RoleParseError};
pub use status::OrderStatus;
pub use variant::{Color, ItemSize, VariantParseError};
