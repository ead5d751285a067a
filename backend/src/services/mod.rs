//! Business logic services for the Shop Ops Platform

pub mod business;
pub mod inventory;
pub mod sales;

pub use business::BusinessService;
pub use inventory::InventoryService;
pub use sales::SalesService;
