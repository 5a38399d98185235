pub mod lead_repo;
pub use lead_repo::{LeadStore, PgLeadRepository};
pub mod vehicle_repo;
pub use vehicle_repo::{PgVehicleRepository, VehicleStore};
pub mod memory_repo;
pub use memory_repo::{InMemoryLeadStore, InMemoryVehicleStore};
