//! Common types used across the DOI sync workspace

mod doi;
mod status;

pub use doi::{Doi, DOI_ORG_URL};
pub use status::{DoiStatus, DoiType};
