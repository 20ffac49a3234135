pub mod definition;
pub mod extraction;
pub mod skip;

pub use definition::*;
pub use extraction::*;
pub use skip::*;
