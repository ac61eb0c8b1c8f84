// Candidate ↔ job matching: weighted multi-dimension scoring and capped ranking.

pub mod handlers;
pub mod scorer;
pub mod weights;
