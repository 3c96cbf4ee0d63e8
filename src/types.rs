//! Frontend-facing data transfer types

pub mod frontend_api;
