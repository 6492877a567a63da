pub mod bot;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod web;

pub use state::AppState;
