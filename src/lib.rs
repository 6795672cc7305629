pub mod config;
pub mod dataset;
pub mod db;
pub mod deck;
pub mod domain;
pub mod filters;
pub mod generator;
pub mod handlers;
pub mod learner;
pub mod progress;
pub mod reducer;
pub mod session;
pub mod state;
