pub mod app;
pub mod config;
pub mod error;
pub mod light;
pub mod oauth;
pub mod secret;
pub mod version;
pub mod web;
