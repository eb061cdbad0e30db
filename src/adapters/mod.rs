// Adapters layer: concrete implementations for external systems (CSV files, delivery services).

pub mod customers;
pub mod delivery;
