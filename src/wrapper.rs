//! Build job requests from the command line and render them into wrapper scripts

/// Operator arguments are collected into a set of structs defined here
pub mod job_request;

/// Read wrapper templates and render them with job request content
pub mod job;
