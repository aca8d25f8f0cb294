pub mod error;
pub mod repo;
pub mod resources;
pub mod service;
