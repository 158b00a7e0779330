pub mod api;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod logging;
pub mod refresh;
pub mod resource;
pub mod slot;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use dashboard::{AddOutcome, DashboardCoordinator};
pub use errors::{DashboardError, StoreError};
pub use resource::Resource;
pub use slot::ObservableSlot;
