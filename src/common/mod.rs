//! 公共工具

pub mod auth;
