pub mod agent;
pub mod cli;
pub mod core;
pub mod notify;
pub mod platform;
pub mod relay;
pub mod session;
pub mod subscription;
