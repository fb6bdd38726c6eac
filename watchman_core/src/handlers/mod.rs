//! HTTP endpoints exposing check reports

pub mod watchman;

pub use watchman::create_routes;
