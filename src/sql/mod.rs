//! SQL assembly utilities
//!
//! - `sanitize` - identifier validation and quoting (the injection chokepoint)
//! - `build` - parameterized statement assembly from query descriptors

pub mod build;
pub mod sanitize;
