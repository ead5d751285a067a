//! Domain models for the Shop Ops Platform

mod business;
mod product;
mod sale;
mod stock;

pub use business::*;
pub use product::*;
pub use sale::*;
pub use stock::*;
