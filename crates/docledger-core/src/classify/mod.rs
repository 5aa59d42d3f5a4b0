//! Document classification: detectors, strategies and the loader that runs them.
//!
//! A [`DocumentLoader`] turns a file into text, then asks each [`Detector`]
//! that supports the content format, in priority order, whether one of its
//! strategies claims the content. Every attempt is written to the
//! [`DetectionProtocol`].

pub mod detector;
pub mod format;
pub mod loader;
pub mod protocol;
pub mod registry;
pub mod special_cases;
pub mod strategies;
pub mod strategy;

pub use detector::Detector;
pub use format::{ContentFormat, InputFormat};
pub use loader::DocumentLoader;
pub use protocol::{DetectionProtocol, DetectorAttempt, FileProtocol, ParsingResult, StrategyAttempt};
pub use registry::DetectorRegistry;
pub use special_cases::SpecialCases;
pub use strategy::{MatchContext, MatchOutcome, Strategy};
