//! Domain services shared by the route handlers.
//!
//! Handlers stay thin: they validate path/body input, call into these
//! services, and map the outcome onto an `ApiResponse`. Anything that talks
//! to the Gemini pool or touches more than one table lives here.

pub mod extraction;
pub mod grading;
pub mod regions;
pub mod results;
