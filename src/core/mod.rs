pub mod grammar;
pub mod render;
pub mod rotator;
pub mod variants;
