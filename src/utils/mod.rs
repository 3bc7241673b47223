//! Small helpers shared across the server.

pub mod html;
pub mod mime;
