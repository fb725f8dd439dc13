/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::info;
use std::sync::Arc;
use std::time::SystemTime;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::config::{ConfigPatch, SharedConfig, SimConfig};
use crate::dispatch;
use crate::engine::EngineHandle;
use crate::notifier::Notifier;
use crate::shared::{CallOutcome, CallRequest, ElevatorUnit, EventKind, EventRecord, SimError};
use crate::storage::{EventLog, FleetStore};

/**
 * Collaborator-facing API of the simulation core.
 *
 * Whatever request layer fronts the system (HTTP, a CLI loop, a test) talks
 * to this facade: accept a call, query state, stop everything, read or patch
 * the configuration. The coordinator never drives movement itself; it hands
 * accepted calls to the engine's per-unit threads.
 *
 * # Fields
 * - `config`:      Shared config handle, also read by the FSM threads.
 * - `store`:       Fleet snapshots for dispatch and status queries.
 * - `event_log`:   Records call acceptances alongside the engine's events.
 * - `notifier`:    Push channel for call-acceptance events.
 * - `engine`:      Per-unit command senders.
 */
pub struct Coordinator {
    config: SharedConfig,
    store: Arc<dyn FleetStore>,
    event_log: Arc<dyn EventLog>,
    notifier: Arc<dyn Notifier>,
    engine: EngineHandle,
}

impl Coordinator {
    pub fn new(
        config: SharedConfig,
        store: Arc<dyn FleetStore>,
        event_log: Arc<dyn EventLog>,
        notifier: Arc<dyn Notifier>,
        engine: EngineHandle,
    ) -> Coordinator {
        Coordinator {
            config,
            store,
            event_log,
            notifier,
            engine,
        }
    }

    /// Validates the call, scores the fleet, queues the stops on the winning
    /// unit and returns it with an advisory completion estimate. Nothing is
    /// mutated when validation or selection fails.
    pub fn accept_call(&self, request: &CallRequest) -> Result<CallOutcome, SimError> {
        let config = self.get_config();
        dispatch::validate_call(request.from_floor, request.to_floor, config.total_floors)?;

        let fleet = self.store.get_all()?;
        let unit = dispatch::select_unit(&fleet, request.from_floor)?;
        let estimated_seconds = dispatch::estimated_seconds(
            unit.current_floor,
            request.from_floor,
            request.to_floor,
            &config,
        );

        // Hand the call to the engine first; an acceptance must never be
        // logged for a call no unit will ever serve.
        let unit_id = unit.id;
        self.engine
            .send_call(unit_id, request.from_floor, request.to_floor)?;

        let requester = request.requester.as_deref().unwrap_or("anonymous");
        let event = EventRecord {
            unit_id,
            kind: EventKind::CallAccepted,
            from_floor: request.from_floor,
            to_floor: Some(request.to_floor),
            motion_state: unit.motion_state,
            direction: unit.direction,
            timestamp: SystemTime::now(),
            detail: format!(
                "call {} -> {} from {} assigned to unit {}",
                request.from_floor, request.to_floor, requester, unit_id
            ),
        };
        self.event_log.append(&event)?;
        self.notifier.publish_event(&event);

        info!(
            "Call {} -> {} assigned to unit {} (estimated {:.1}s)",
            request.from_floor, request.to_floor, unit_id, estimated_seconds
        );

        Ok(CallOutcome {
            unit_id,
            estimated_seconds,
        })
    }

    pub fn current_state(&self, unit_id: u8) -> Result<ElevatorUnit, SimError> {
        self.store
            .get(unit_id)?
            .ok_or(SimError::UnknownUnit { id: unit_id })
    }

    pub fn current_states(&self) -> Result<Vec<ElevatorUnit>, SimError> {
        self.store.get_all()
    }

    /// Cancels all scheduled ticks and clears all stop queues. Idempotent.
    pub fn stop_all(&self) {
        self.engine.stop_all();
    }

    pub fn get_config(&self) -> SimConfig {
        match self.config.read() {
            Ok(config) => config.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Applies a partial config update after validation. Units mid-journey
    /// finish their current tick on the old timings; new values take effect
    /// when the next tick is armed.
    pub fn set_config(&self, patch: &ConfigPatch) -> Result<SimConfig, SimError> {
        let next = self.get_config().patched(patch);
        next.validate()?;

        let mut config = match self.config.write() {
            Ok(config) => config,
            Err(poisoned) => poisoned.into_inner(),
        };
        *config = next.clone();
        info!(
            "Configuration updated: {} floors, {}s per floor, {}s per door phase",
            next.total_floors, next.floor_move_time, next.door_open_close_time
        );
        Ok(next)
    }

    /// Terminates the engine threads. Consumes the coordinator; used at
    /// process exit and in tests.
    pub fn shutdown(self) {
        self.engine.shutdown();
    }
}
