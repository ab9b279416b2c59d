pub mod positional;

pub use positional::PositionalIndex;
