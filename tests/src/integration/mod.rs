//! # Integration Tests
//!
//! The statement distribution service driven through its public API with
//! recording doubles for every collaborator.

pub mod scenarios;
