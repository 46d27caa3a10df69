//! Report services.
//!
//! Services own the business rules around the entity store: authorization, uniqueness,
//! optimistic concurrency and the post-create notification.

pub mod attachments;
pub mod reports;
