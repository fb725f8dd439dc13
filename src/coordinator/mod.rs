pub mod coordinator;
pub mod coordinator_tests;

pub use coordinator::Coordinator;
