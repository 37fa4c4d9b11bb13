//! Domain models for the shop API.
//!
//! Row types derive `sqlx::FromRow`; request and response types carry the
//! JSON shapes of the `/api` endpoints.

pub mod address;
pub mod banner;
pub mod board;
pub mod comment;
pub mod item;
pub mod order;
pub mod review;
pub mod user;
