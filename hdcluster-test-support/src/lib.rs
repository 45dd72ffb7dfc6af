//! Shared test utilities used across hdcluster crates.
//!
//! - [`capture`] records tracing spans and events for assertions.
//! - [`pbt`] reads the property-test run profile from the environment.
//! - [`dendrograms`] produces deterministic and seeded merge scripts.

pub mod capture;
pub mod dendrograms;
pub mod pbt;
