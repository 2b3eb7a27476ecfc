pub mod actuation;
pub mod backend_config;
pub mod error;
pub mod geometry_utils;
pub mod systems;
pub mod tether_interface;
pub mod tracking;
