// src/health/mod.rs
mod component;
mod identity;
mod panic_hook;
mod registry;
mod report;
mod status;

pub use component::Component;
pub use identity::{generate_service_id, persistent_service_id, IdentityError, SERVICE_ID_PREFIX};
pub use panic_hook::{install_quiet_panic_hook, is_running_check};
pub use registry::{CheckContext, HealthMonitor, Healthz};
pub use report::{HealthzReport, SERVICE_ID_KEY};
pub use status::{status_label, Status};
