pub mod auth;
pub mod catalog;
pub mod checklist_service;
pub mod report;
pub mod status;
pub mod validation_service;
pub mod work_order_service;
