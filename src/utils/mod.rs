pub mod sampling;
pub mod validation;

pub use sampling::sample;
pub use validation::*;
