//! Relational engine adapter backed by SQLx PostgreSQL pools.
//!
//! One [`sqlx::PgPool`] is created per physical database on first use. The
//! domain's pool manager owns the pools; this module only knows how to open
//! one and run a procedure on it.

mod pg_relational_engine;
mod pool;

pub use pg_relational_engine::PgRelationalEngine;
pub use pool::PgPoolConfig;
