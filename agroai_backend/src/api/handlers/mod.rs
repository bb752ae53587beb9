pub mod alerts;
pub mod detection;
pub mod purchases;
pub mod stats;
pub mod status;
pub mod weather;
