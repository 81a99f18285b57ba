pub mod dir;
pub mod manager;

pub use dir::*;
pub use manager::*;
