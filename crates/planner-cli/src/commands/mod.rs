pub mod analytics;
pub mod payment;
pub mod project;
pub mod stress;
pub mod tax;
