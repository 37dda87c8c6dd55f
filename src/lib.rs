//! # Document Gateway
//!
//! A MongoDB gateway for AI tools.
//!
//! Document Gateway sits between LLM-driven agents and a MongoDB
//! deployment. Agents get three operations: aggregation with pre-flight
//! diagnostics (an empty result always says *why* it is empty), schema
//! inference over sampled documents (schemaless collections get an
//! effective field-path → types map), and database/collection discovery.
//! When a request names a collection but no database, the gateway infers
//! the owner from an index built at startup.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────┐   ┌──────────────────────────────┐   ┌──────────┐
//! │  Agent  │──▶│ HTTP (axum)                  │──▶│ MongoDB  │
//! │ (tools) │   │  /aggregate /schema /databases│   │ (driver) │
//! └─────────┘   └──────┬───────────────────────┘   └────┬─────┘
//!                      │ executor · schema · catalog    │
//!                      └────── DocumentStore trait ─────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Client/server error taxonomy |
//! | [`store`] | `DocumentStore` trait and the MongoDB implementation |
//! | [`kind`] | Closed value-kind classifier |
//! | [`flatten`] | Nested-array collapsing |
//! | [`extract`] | Field-path and type discovery |
//! | [`normalize`] | BSON → JSON-safe value conversion |
//! | [`schema`] | Per-database schema aggregation and caching |
//! | [`catalog`] | Database enumeration, collection→database index |
//! | [`pipeline`] | Pipeline parsing and identifier binding |
//! | [`aggregate`] | Aggregation executor with diagnostics |
//! | [`server`] | HTTP gateway server |

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod error;
pub mod extract;
pub mod flatten;
pub mod kind;
pub mod normalize;
pub mod pipeline;
pub mod schema;
pub mod server;
pub mod store;
