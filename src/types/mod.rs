// ABOUTME: Validated domain types shared by the client and the batch engine.
// ABOUTME: Organization names and opaque work-item identifiers.

mod organization;
mod work_item;

pub use organization::{Organization, OrganizationError};
pub use work_item::WorkItem;
