pub mod round;
pub mod serialization;
pub mod trick;
