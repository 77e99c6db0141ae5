pub mod assessment;
pub mod insight;
pub mod job_match;
pub mod resume;
pub mod user;
