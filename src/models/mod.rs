pub mod location;
pub mod pass;
pub mod sos_alert;
pub mod user;

pub use location::*;
pub use pass::*;
pub use sos_alert::*;
pub use user::*;
