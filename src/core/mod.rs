//! Core synthesis model — application root, resource graph, typed
//! vocabulary, CIDR validation, and tag merging.

pub mod app;
pub mod cidr;
pub mod graph;
pub mod tags;
pub mod types;
