//! BDD step definitions for voltcheck

pub mod alert_steps;
pub mod session_steps;
pub mod store_steps;
