pub mod context;
pub mod location;
