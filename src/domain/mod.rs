mod allocation;
mod entry;
mod money;
mod summary;

pub use allocation::*;
pub use entry::*;
pub use money::*;
pub use summary::*;
