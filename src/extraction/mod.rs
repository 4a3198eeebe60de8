//! Job description parsing

pub mod requirements;

pub use requirements::{JobRequirements, RequirementExtractor};
