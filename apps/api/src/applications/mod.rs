// Application workflow: status transitions, board grouping, applicant geocoding.

pub mod handlers;
pub mod locate;
pub mod status;
