//! Batch deletion of learner xAPI statements from a Learning Locker-style
//! store.
//!
//! Each configured institution has a tab-separated deletion-request file.
//! For every row the purge pipeline expands the student's identity aliases,
//! builds a batch-delete filter, submits it to the store's
//! `batchdelete/initialise` endpoint over Basic auth, and finally polls the
//! job listing to show what the store accepted. Lifecycle events are posted
//! to the external process-monitoring service as institutions start and
//! finish.

pub mod config;
pub mod events;
pub mod observability;
pub mod purge;
pub mod secrets;
