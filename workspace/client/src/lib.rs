//! Typed client for the RentDesk API.
//!
//! Reads go through a [`QueryCache`] that deduplicates identical in-flight
//! loads; every mutation invalidates the [`CacheTag`]s whose data it changes,
//! so the next read refetches from the server. Form state for the allocation,
//! payment and assignment flows lives in [`drafts`] and is checked locally
//! before anything is sent.

pub mod api;
pub mod cache;
pub mod drafts;
pub mod error;

pub use api::ApiClient;
pub use cache::{CacheTag, QueryCache};
pub use drafts::{AdvanceDraft, ApplyAdvanceDraft, AssignmentDraft, PaymentDraft};
pub use error::{ClientError, Result};
