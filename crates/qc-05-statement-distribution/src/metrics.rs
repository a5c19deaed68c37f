//! # Statement Distribution Metrics
//!
//! Prometheus metrics for the statement gossip.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! qc-05-statement-distribution = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `statement_distribution_accepted_total` - Statements accepted (by kind)
//! - `statement_distribution_rejected_total` - Statements rejected (by reason)
//! - `statement_distribution_sent_total` - Statements sent to peers
//! - `statement_distribution_reputation_reports_total` - Reports (cost/benefit)
//! - `statement_distribution_active_relay_parents` - Live relay-parent contexts

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref STATEMENTS_ACCEPTED: IntCounterVec = register_int_counter_vec!(
        "statement_distribution_accepted_total",
        "Total number of statements accepted into the table",
        &["kind"]
    )
    .expect("Failed to create STATEMENTS_ACCEPTED metric");

    pub static ref STATEMENTS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "statement_distribution_rejected_total",
        "Total number of statements rejected or dropped",
        &["reason"]
    )
    .expect("Failed to create STATEMENTS_REJECTED metric");

    pub static ref STATEMENTS_SENT: IntCounter = register_int_counter!(
        "statement_distribution_sent_total",
        "Total number of statements sent to peers"
    )
    .expect("Failed to create STATEMENTS_SENT metric");

    pub static ref REPUTATION_REPORTS: IntCounterVec = register_int_counter_vec!(
        "statement_distribution_reputation_reports_total",
        "Total number of reputation reports",
        &["type"]
    )
    .expect("Failed to create REPUTATION_REPORTS metric");

    pub static ref ACTIVE_RELAY_PARENTS: IntGauge = register_int_gauge!(
        "statement_distribution_active_relay_parents",
        "Number of live relay-parent contexts"
    )
    .expect("Failed to create ACTIVE_RELAY_PARENTS metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

#[cfg(feature = "metrics")]
pub fn record_statement_accepted(kind: &str) {
    STATEMENTS_ACCEPTED.with_label_values(&[kind]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_statement_rejected(reason: &str) {
    STATEMENTS_REJECTED.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_statements_sent(count: u64) {
    STATEMENTS_SENT.inc_by(count);
}

#[cfg(feature = "metrics")]
pub fn record_reputation_report(is_cost: bool) {
    let label = if is_cost { "cost" } else { "benefit" };
    REPUTATION_REPORTS.with_label_values(&[label]).inc();
}

#[cfg(feature = "metrics")]
pub fn set_active_relay_parents(count: usize) {
    ACTIVE_RELAY_PARENTS.set(count as i64);
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_statement_accepted(_kind: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_statement_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_statements_sent(_count: u64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_reputation_report(_is_cost: bool) {}

#[cfg(not(feature = "metrics"))]
pub fn set_active_relay_parents(_count: usize) {}
