mod class;
mod indexes;
mod types;

pub use class::*;
pub use indexes::*;
pub use types::*;
