/***************************************/
/*        3rd party libraries          */
/***************************************/
use thiserror::Error;

/***************************************/
/*       Public data structures        */
/***************************************/
/// Caller-facing error taxonomy. Simulation inconsistencies (boundary
/// breaches, queue desync) never appear here — the engine self-heals those
/// internally since no caller is waiting on a tick.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("floor {floor} is outside the building (valid range 1..={total_floors})")]
    FloorOutOfRange { floor: u8, total_floors: u8 },

    #[error("from and to floor are both {floor}; a call must change floors")]
    SameFloor { floor: u8 },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("no elevator units configured")]
    EmptyFleet,

    #[error("no elevator unit with id {id}")]
    UnknownUnit { id: u8 },

    #[error("fleet store failure: {reason}")]
    Store { reason: String },

    #[error("event log failure: {reason}")]
    EventLog { reason: String },

    #[error("movement engine failure: {reason}")]
    Engine { reason: String },
}
