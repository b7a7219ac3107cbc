#![allow(dead_code)]

pub mod proxy_server;
pub mod scripted;
