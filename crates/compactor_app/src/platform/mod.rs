mod app;
mod cli;
mod config;
mod effects;
mod logging;
mod scheduler;
mod ui;

pub use app::run_app;
