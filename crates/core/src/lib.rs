//! Core posting logic for the Oasis ledger.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Persistence is reached through the traits in [`posting::store`], implemented by
//! the db crate.
//!
//! # Modules
//!
//! - `account` - Account master records referenced by postings
//! - `posting` - Posting validation, commit orchestration and query reduction

pub mod account;
pub mod posting;
