// Library exports for Battlesnake bot
// This allows the server, the replay tool and the integration tests to share the core logic

pub mod blocking;
pub mod board;
pub mod bot;
pub mod config;
pub mod debug_logger;
pub mod encoder;
pub mod flood;
pub mod handler;
pub mod learning;
pub mod pathfinding;
pub mod replay;
pub mod strategy;
pub mod tactics;
pub mod types;
