pub mod pass_helpers;
pub mod recording;
pub mod test_db;
pub mod users;
