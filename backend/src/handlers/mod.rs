//! HTTP request handlers for the Shop Ops Platform

pub mod business;
pub mod health;
pub mod products;
pub mod sales;

pub use business::*;
pub use health::*;
pub use products::*;
pub use sales::*;
