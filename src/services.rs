pub mod state;
pub mod history;
pub mod time_window;
pub mod crm_service;
pub use crm_service::LeadService;
pub mod inventory_service;
pub use inventory_service::InventoryService;
pub mod dashboard_service;
pub use dashboard_service::DashboardService;
