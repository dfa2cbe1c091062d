// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Supabase/PostgREST).

pub mod supabase;

pub use supabase::SupabaseDb;

use crate::config::Config;

/// Table names as constants.
pub mod tables {
    pub const SUBSCRIBERS: &str = "subscribers";
}

/// Supabase when configured, otherwise an in-memory store.
pub fn from_config(config: &Config) -> SupabaseDb {
    match (&config.supabase_url, &config.supabase_key) {
        (Some(url), Some(key)) => SupabaseDb::new(url, key),
        _ => {
            tracing::warn!("SUPABASE_URL/SUPABASE_KEY not set, subscribers are kept in memory");
            SupabaseDb::new_in_memory()
        }
    }
}
