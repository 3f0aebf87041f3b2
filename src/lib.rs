//! Vehicle Portal API Library
//!
//! Vehicle records for an authenticated customer portal, together with the
//! drivers and helpers tagged to each vehicle, the latest purchase-order number
//! and the vehicle's control documents.
//!
//! # Modules
//!
//! - `api`: API-layer re-exports.
//! - `domain`: Domain-layer re-exports.
//! - `auth`: Token hashing and the `Caller` extractor.
//! - `config`: Configuration management.
//! - `db`: Database connection and schema bootstrap.
//! - `db_storage`: PostgreSQL repositories.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `memory_store`: In-process repositories.
//! - `models`: Core data models.
//! - `openapi`: OpenAPI document.
//! - `policy`: Operation to capability table.
//! - `repository`: Data-access traits.
//! - `router`: Route table and middleware stack.
//! - `vehicles`: Vehicle lookup and aggregation service.

pub mod api;
pub mod domain;

pub mod auth;
pub mod config;
pub mod db;
pub mod db_storage;
pub mod errors;
pub mod handlers;
pub mod memory_store;
pub mod models;
pub mod openapi;
pub mod policy;
pub mod repository;
pub mod router;
pub mod vehicles;
