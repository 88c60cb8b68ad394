//! Imagehost - request routing and response formatting for a RESTful image
//! hosting service
//!
//! Clients address images and their metadata through hierarchical paths,
//! optionally suffixed with a format extension (`.json`, `.xml`, `.html`).
//! The [`routing`] module decides which resource a request addresses and
//! whether it is admissible at all; [`formatter`] renders the resulting
//! [`model`] values in the representation the client asked for.

pub mod catalog;
pub mod config;
pub mod errors;
pub mod formatter;
pub mod metrics;
pub mod model;
pub mod routes;
pub mod routing;
pub mod server;
