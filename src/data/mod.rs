mod model;

pub use model::FixtureSet;
