pub mod auth;
pub mod board;
pub mod board_layout;
pub mod config;
pub mod error;
pub mod expectation;
pub mod logger;
pub mod messages;
pub mod model;
pub mod persistence;
pub mod pool;
pub mod rest;
pub mod rng;
pub mod server;
pub mod wallet;
