pub mod injector;
pub mod offsets;
pub mod ranges;
pub mod tree;
pub mod walk;

pub use injector::*;
pub use offsets::*;
pub use ranges::*;
pub use tree::*;
pub use walk::*;
