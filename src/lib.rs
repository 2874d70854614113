pub mod auth;
pub mod config;
pub mod database;
pub mod lifecycle;
pub mod schedule;
pub mod services;
