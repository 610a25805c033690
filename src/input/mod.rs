pub mod source;
pub mod target;
pub mod tracker;
