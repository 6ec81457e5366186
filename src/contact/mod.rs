//! Contact-form intake: validation, the best-effort pipeline, and routes.

pub mod pipeline;
pub mod routes;
pub mod types;

pub use pipeline::{ContactOutcome, ContactPipeline};
pub use routes::{ContactRouteState, contact_routes};
pub use types::{ContactRequest, ContactResponse, Submission, parse_submission};
