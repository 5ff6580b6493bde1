//! Remote engine adapter: Supabase RPC over PostgREST.
//!
//! This module provides a thin HTTP implementation of the `RemoteEngine`
//! port.

mod dto;
mod supabase_rpc;

pub use supabase_rpc::{SupabaseConfigError, SupabaseRpcEngine};
