pub mod io;
pub mod label;
pub mod model;
pub mod mutation;
pub mod registry;

pub use io::*;
pub use label::*;
pub use model::*;
pub use mutation::*;
pub use registry::*;

#[cfg(test)]
mod tests;
