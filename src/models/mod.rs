pub mod asset;
pub mod design;
pub mod generation;

pub use asset::*;
pub use design::*;
pub use generation::*;
