pub mod auth;
pub mod dashboard;
pub mod health;
pub mod nodes;
pub mod traffic_log;
