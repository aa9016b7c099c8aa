//! Bilhete server: HTTP surface over the purchase lifecycle.
//!
//! Exposes three routes over [`bilhete_core`]:
//!
//! - `POST /payment`: submit a purchase, returns the ticket payload or a
//!   pending reference
//! - `POST /webhook`: provider status callbacks, always acknowledged
//! - `GET /health`: liveness probe

#![warn(missing_docs)]

pub mod observability;
pub mod routes;
