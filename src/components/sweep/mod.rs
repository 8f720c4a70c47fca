//! Event listing, duplicate detection, keyword classification and mutation dispatch.

pub mod classify;
pub mod dedup;
pub mod dispatch;
pub mod lister;

pub use classify::{classify, plan_recolor, Decision, KeywordRule, RecolorPlan, RecolorSummary};
pub use dedup::{deletion_mutations, find_duplicates, DedupKey};
pub use dispatch::{apply_mutations, MutationFailure, MutationReport};
pub use lister::{event_pages, find_event_by_summary, list_calendars, list_events};
