//! Presentation layer: askama view models and render helpers.

pub mod views;
