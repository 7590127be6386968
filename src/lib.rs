//! Earshot: an audio content identification service.
//!
//! Reference recordings are fingerprinted into an in-memory inverted index;
//! short, noisy query clips are identified by offset-histogram voting over
//! matching fingerprints. The [`engine`] module is the core; [`audio`]
//! turns uploaded bytes into the PCM the core consumes, and [`server`] /
//! [`routes`] expose the whole thing over HTTP.

pub mod audio;
pub mod engine;
pub mod routes;
pub mod server;

pub use engine::{Engine, EngineConfig};
