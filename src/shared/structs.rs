/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Deserialize;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::SystemTime;

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    None,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MotionState {
    Idle,
    MovingUp,
    MovingDown,
    DoorsOpening,
    DoorsOpen,
    DoorsClosing,
}

impl MotionState {
    /// True only while the car is travelling between floors. Door phases
    /// report false even when further stops are queued.
    pub fn is_moving(&self) -> bool {
        matches!(self, MotionState::MovingUp | MotionState::MovingDown)
    }
}

/**
 * One simulated elevator car.
 *
 * Created once at fleet initialization and mutated exclusively by the
 * movement engine and the call-acceptance path. `target_floor` is `None`
 * while the unit is idle; while the stop queue is non-empty it always
 * equals the queue head.
 *
 * # Fields
 * - `id`:              Stable unit identifier within the fleet.
 * - `current_floor`:   1-based floor, always within building bounds.
 * - `target_floor`:    Floor currently driven toward, `None` when idle.
 * - `direction`:       Travel direction, `None` when idle or in a door phase.
 * - `motion_state`:    Observable movement/door phase.
 * - `is_moving`:       Derived from `motion_state`, kept for the wire format.
 * - `last_updated`:    Set on every mutation; staleness signals a stalled unit.
 */
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ElevatorUnit {
    pub id: u8,
    #[serde(rename = "currentFloor")]
    pub current_floor: u8,
    #[serde(rename = "targetFloor")]
    pub target_floor: Option<u8>,
    pub direction: Direction,
    #[serde(rename = "motionState")]
    pub motion_state: MotionState,
    #[serde(rename = "isMoving")]
    pub is_moving: bool,
    #[serde(rename = "lastUpdated")]
    pub last_updated: SystemTime,
}

impl ElevatorUnit {
    pub fn new(id: u8) -> ElevatorUnit {
        ElevatorUnit {
            id,
            current_floor: 1,
            target_floor: None,
            direction: Direction::None,
            motion_state: MotionState::Idle,
            is_moving: false,
            last_updated: SystemTime::now(),
        }
    }

    /// Sets the motion state and re-derives `is_moving` from the variant,
    /// so the serialized field cannot drift from the state.
    pub fn set_motion(&mut self, motion_state: MotionState) {
        self.motion_state = motion_state;
        self.is_moving = motion_state.is_moving();
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StopKind {
    Pickup,
    Dropoff,
}

/// One pending stop in a unit's queue, tagged with why the car stops there.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stop {
    pub kind: StopKind,
    pub floor: u8,
}

/// Ordered pending floors for one unit, consumed front to back.
pub type StopQueue = VecDeque<Stop>;

/// Ephemeral call input. Consumed into queue entries and a log record,
/// never persisted as an entity.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CallRequest {
    #[serde(rename = "fromFloor")]
    pub from_floor: u8,
    #[serde(rename = "toFloor")]
    pub to_floor: u8,
    pub requester: Option<String>,
}

/// Returned to the caller at call acceptance. The estimate covers the newly
/// accepted leg only and ignores any pre-existing queue on the chosen unit.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CallOutcome {
    #[serde(rename = "unitId")]
    pub unit_id: u8,
    #[serde(rename = "estimatedSeconds")]
    pub estimated_seconds: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    CallAccepted,
    MovementStarted,
    FloorReached,
    DoorsOpening,
    DoorsOpen,
    DoorsClosing,
    StopServed,
    Idle,
    Stopped,
    Anomaly,
}

/**
 * One append-only entry in the event log.
 *
 * Immutable once written, ordered by timestamp. The engine emits one (or on
 * arrival ticks, two) of these per state transition.
 */
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EventRecord {
    #[serde(rename = "unitId")]
    pub unit_id: u8,
    pub kind: EventKind,
    #[serde(rename = "fromFloor")]
    pub from_floor: u8,
    #[serde(rename = "toFloor")]
    pub to_floor: Option<u8>,
    #[serde(rename = "motionState")]
    pub motion_state: MotionState,
    pub direction: Direction,
    pub timestamp: SystemTime,
    pub detail: String,
}

impl EventRecord {
    pub fn for_unit(unit: &ElevatorUnit, kind: EventKind, detail: String) -> EventRecord {
        EventRecord {
            unit_id: unit.id,
            kind,
            from_floor: unit.current_floor,
            to_floor: unit.target_floor,
            motion_state: unit.motion_state,
            direction: unit.direction,
            timestamp: SystemTime::now(),
            detail,
        }
    }
}
