//! Camera-side collaborators for Catpoint.
//!
//! Loads camera frames from PPM files and provides the stand-in cat
//! classifiers the controller is driven with.

pub mod heuristic;
pub mod ppm;

pub use heuristic::{ColorHeuristicClassifier, FixedClassifier, StandInClassifier};
pub use ppm::{load_ppm, parse_ppm, ImageError};
