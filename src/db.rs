pub mod store;
pub use store::{AppliedReview, InspectionStore, OpenedValidation, ReviewEffects};
pub mod inspection_repo;
pub use inspection_repo::PgInspectionRepository;
pub mod memory_store;
pub use memory_store::MemoryInspectionStore;
