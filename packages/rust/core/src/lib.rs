//! Batch jobs and domain logic for renewtrack.
//!
//! This crate ties together document loading, date extraction, the contract
//! store, and reminder delivery into the two batch jobs: [`ingest::ingest_all`]
//! and [`notify::run_notification_pass`].

pub mod document;
pub mod ingest;
pub mod notify;
pub mod pipeline;
