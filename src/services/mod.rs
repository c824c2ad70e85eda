pub mod location_service;
pub mod notifier;
pub mod pass_service;
pub mod permission;
pub mod scan_service;
pub mod sos_service;
pub mod state_machine;
pub mod user_service;

pub use location_service::*;
pub use notifier::*;
pub use pass_service::*;
pub use scan_service::*;
pub use sos_service::*;
pub use user_service::*;
