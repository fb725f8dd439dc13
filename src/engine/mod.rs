pub mod engine;
pub mod fsm;

pub use engine::start_engine;
pub use engine::EngineHandle;
pub use fsm::UnitCommand;
pub use fsm::UnitFsm;
