//! API handlers
//!
//! Author: hephaex@gmail.com

pub mod health;
pub mod search;
pub mod upsert;
