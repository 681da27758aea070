pub mod domain;
pub mod greyscale;
pub mod project;

pub use domain::{SombreroError, SombreroErrorCategory, SombreroResult};
