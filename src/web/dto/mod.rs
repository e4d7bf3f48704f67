//! Data Transfer Objects for Web API.

pub mod response;

pub use response::*;
