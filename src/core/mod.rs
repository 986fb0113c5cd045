//! Core curation logic.
//!
//! This module contains:
//! - SourceAggregator: ordered multi-source collection with early stop
//! - DecisionStore: append-only memory of finished and declined forms
//! - BoundedCache: small LRU used for memoizing lookups
//! - CurationSession: the operator-facing state machine

pub mod aggregator;
pub mod cache;
pub mod decision_store;
pub mod session;

// Re-export commonly used types
pub use aggregator::{
    AggregateError, Aggregation, AggregationSettings, SourceAggregator, SourceReport, SourceStatus,
};
pub use cache::BoundedCache;
pub use decision_store::{
    DecisionStore, DecisionStoreError, DecisionSummary, RecordResult, DECISIONS_FILE,
};
pub use session::{
    CurationSession, Decision, DecisionResult, SessionDeps, SessionError, SessionState,
    SessionSummary,
};
