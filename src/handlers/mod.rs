pub mod admin;
pub mod auth;
pub mod configurator;
pub mod helpers;
pub mod middleware;
pub mod pages;
pub mod products;
