pub mod selector;
pub mod selector_tests;

pub use selector::estimated_seconds;
pub use selector::score_unit;
pub use selector::select_unit;
pub use selector::validate_call;
