pub mod model;
pub mod records;
pub mod snapshot;
pub mod validate;

pub use model::*;
pub use records::*;
pub use snapshot::*;
pub use validate::*;
