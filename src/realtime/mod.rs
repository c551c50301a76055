//! Client-side session synchronization.
//!
//! Each connected client owns one [`adapter::RealtimeSession`]: a background
//! task that refetches the session snapshot on store change pings or manual
//! refresh, diffs it against the previously observed snapshot, and feeds the
//! resulting update events into a bounded notification buffer. Clients share
//! nothing with each other; the store is the single source of truth.

pub mod adapter;
pub mod diff;
pub mod feed;
