pub mod errors;
pub mod macros;
pub mod structs;

pub use errors::SimError;
pub use structs::CallOutcome;
pub use structs::CallRequest;
pub use structs::Direction;
pub use structs::ElevatorUnit;
pub use structs::EventKind;
pub use structs::EventRecord;
pub use structs::MotionState;
pub use structs::Stop;
pub use structs::StopKind;
pub use structs::StopQueue;
