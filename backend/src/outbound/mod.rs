//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL stored-procedure engine over SQLx pools
//! - **remote**: Supabase RPC engine over reqwest
//! - **platform**: per-project `procedures.json` and `config.json` files
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no dispatch policy.

pub mod persistence;
pub mod platform;
pub mod remote;
