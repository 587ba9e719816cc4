//! Domain layer: plate normalization, the allow-list registry, access
//! decisions, and the ports the controller drives.

pub mod hardware;
pub mod model;
pub mod repository;
pub mod service;
