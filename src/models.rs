pub mod auth;
pub mod checklist;
pub mod intake;
pub mod report;
pub mod signature;
pub mod validation;
pub mod work_order;
