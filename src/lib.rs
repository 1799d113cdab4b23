//! Spintext — copy variation for marketing pages.
//!
//! Renders brace templates such as `{Rent|Hire} a {keyword} in
//! {location(city_name)}` against a per-page context, and rotates
//! through template variants on a timer. Also defines the interfaces of
//! the order, payment and email collaborators the site talks to.

pub mod core;
pub mod schema;
pub mod services;

pub use crate::core::render::{render, render_with, Renderer};
pub use crate::core::rotator::{create_rotator, Rotator};
pub use crate::schema::context::Context;
