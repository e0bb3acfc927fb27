//! RFC 9457 problem responses and the error catalog used across the server.
pub mod catalog;
pub mod problem;

pub use catalog::ErrDef;
pub use problem::{
    Problem, ProblemContext, ProblemResponse, APPLICATION_PROBLEM_JSON, REQUEST_ID_HEADER,
};
