//! Application services layer.

pub mod catalog;
pub mod error;
pub mod stores;
pub mod syndication;
pub mod views;
