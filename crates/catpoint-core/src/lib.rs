//! Core of the Catpoint security controller.
//!
//! Holds the data model, the alarm decision rules, the storage and classifier
//! contracts, the observer registry and the [`service::SecurityService`]
//! engine that ties them together.

pub mod classifier;
pub mod error;
pub mod listeners;
pub mod models;
pub mod repository;
pub mod rules;
pub mod service;
pub mod settings;

pub use error::{Result, SecurityError};
