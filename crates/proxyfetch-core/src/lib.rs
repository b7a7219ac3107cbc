pub mod config;
pub mod logging;

pub mod events;
pub mod executor;
pub mod gate;
pub mod retry;
pub mod transport;
