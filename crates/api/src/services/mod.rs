//! Business logic services and outbound clients.
//!
//! # Services
//!
//! - `auth` - Password accounts, OAuth linking, signed tokens
//! - `oauth` - Google/Naver authorization code flow
//! - `uploads` - Filesystem storage for board files and images
//! - `payment` - Payment gateway confirm/cancel proxy
//! - `ai` - Chat completion relay with a fixed fallback answer

pub mod ai;
pub mod auth;
pub mod oauth;
pub mod payment;
pub mod uploads;
