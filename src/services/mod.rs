//! Collaborators owned by other systems, seen through narrow traits.

pub mod email;
pub mod order;
pub mod payment;
