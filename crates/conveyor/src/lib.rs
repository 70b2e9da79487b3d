pub mod combine;
pub mod config;
pub mod directive;
pub mod graph;
pub mod orchestrator;
pub mod resolver;
pub mod types;
