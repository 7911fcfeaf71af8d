//! Bearer tokens: claims, HS256 issuing/verification, and the gate that
//! protects authenticated routes.

pub mod claims;
pub mod jwt;
pub mod middleware;
