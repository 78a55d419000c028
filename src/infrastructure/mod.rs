pub mod auth;
pub mod config;
pub mod db;
pub mod repository;
pub mod state;
