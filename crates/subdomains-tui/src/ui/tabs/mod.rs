//! One module per screen.

pub mod home;
pub mod order;
pub mod profile;
