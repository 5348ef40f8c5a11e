pub mod checklist;
pub mod health;
pub mod reports;
pub mod validations;
pub mod work_orders;
