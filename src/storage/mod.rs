/***************************************/
/*        3rd party libraries          */
/***************************************/
use std::collections::BTreeMap;
use std::sync::Mutex;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::{ElevatorUnit, EventRecord, SimError};

/***************************************/
/*             Public API              */
/***************************************/
/// Durable home of the fleet. The engine serializes its own writes per unit
/// (one FSM thread per unit id), so implementations only need to tolerate
/// concurrent writers touching disjoint units.
pub trait FleetStore: Send + Sync {
    fn get_all(&self) -> Result<Vec<ElevatorUnit>, SimError>;
    fn get(&self, id: u8) -> Result<Option<ElevatorUnit>, SimError>;
    fn update(&self, unit: &ElevatorUnit) -> Result<(), SimError>;
}

/// Append-only log of every state transition. Read-back is owned by the
/// collaborator; the engine only ever appends.
pub trait EventLog: Send + Sync {
    fn append(&self, event: &EventRecord) -> Result<(), SimError>;
}

/**
 * In-process fleet store.
 *
 * Backed by a `BTreeMap` so `get_all` returns units in ascending id order,
 * which is what makes dispatch tie-breaking deterministic.
 */
pub struct InMemoryFleet {
    units: Mutex<BTreeMap<u8, ElevatorUnit>>,
}

impl InMemoryFleet {
    pub fn new(n_units: u8) -> InMemoryFleet {
        let units = (1..=n_units)
            .map(|id| (id, ElevatorUnit::new(id)))
            .collect::<BTreeMap<u8, ElevatorUnit>>();

        InMemoryFleet {
            units: Mutex::new(units),
        }
    }
}

impl FleetStore for InMemoryFleet {
    fn get_all(&self) -> Result<Vec<ElevatorUnit>, SimError> {
        let units = self.units.lock().map_err(|e| SimError::Store {
            reason: format!("fleet lock poisoned: {}", e),
        })?;
        Ok(units.values().cloned().collect())
    }

    fn get(&self, id: u8) -> Result<Option<ElevatorUnit>, SimError> {
        let units = self.units.lock().map_err(|e| SimError::Store {
            reason: format!("fleet lock poisoned: {}", e),
        })?;
        Ok(units.get(&id).cloned())
    }

    fn update(&self, unit: &ElevatorUnit) -> Result<(), SimError> {
        let mut units = self.units.lock().map_err(|e| SimError::Store {
            reason: format!("fleet lock poisoned: {}", e),
        })?;
        units.insert(unit.id, unit.clone());
        Ok(())
    }
}

/// In-process event log, with a snapshot accessor for the observer and tests.
pub struct InMemoryEventLog {
    entries: Mutex<Vec<EventRecord>>,
}

impl InMemoryEventLog {
    pub fn new() -> InMemoryEventLog {
        InMemoryEventLog {
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn snapshot(&self) -> Vec<EventRecord> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Default for InMemoryEventLog {
    fn default() -> InMemoryEventLog {
        InMemoryEventLog::new()
    }
}

impl EventLog for InMemoryEventLog {
    fn append(&self, event: &EventRecord) -> Result<(), SimError> {
        let mut entries = self.entries.lock().map_err(|e| SimError::EventLog {
            reason: format!("event log lock poisoned: {}", e),
        })?;
        entries.push(event.clone());
        Ok(())
    }
}
