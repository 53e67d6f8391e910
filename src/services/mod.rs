// src/services/mod.rs

pub mod calculations;
pub mod enricher;
pub mod funds;
pub mod holdings;
pub mod portfolio;
pub mod price;
pub mod provider;
pub mod report;
pub mod yahoo;
