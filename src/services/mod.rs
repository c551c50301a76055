/// OpenAPI document aggregation.
pub mod documentation;
/// Health status reporting.
pub mod health_service;
/// Session lifecycle and team mutation operations.
pub mod session_service;
/// Server-sent-events bridging for the per-session change stream.
pub mod sse_service;
