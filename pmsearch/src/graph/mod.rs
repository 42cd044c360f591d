//! The reference network and the collaborators to load it.

mod chromosome;
mod reference;
mod snapshot;

pub use chromosome::*;
pub use reference::*;
pub use snapshot::*;
