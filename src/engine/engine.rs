/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{debug, info};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread::Builder;
use std::thread::JoinHandle;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::config::SharedConfig;
use crate::engine::fsm::{UnitCommand, UnitFsm};
use crate::notifier::Notifier;
use crate::shared::{Direction, MotionState, SimError};
use crate::storage::{EventLog, FleetStore};

/**
 * Handle to the running movement engine.
 *
 * Owns one command sender per unit; the engine side exclusively owns each
 * unit's tick chain and its cancellation. Cross-unit ticks run on
 * independent threads with no ordering between them.
 */
pub struct EngineHandle {
    cmd_txs: BTreeMap<u8, cbc::Sender<UnitCommand>>,
    threads: Vec<JoinHandle<()>>,
}

impl EngineHandle {
    /// Forwards an accepted call to the chosen unit's FSM thread.
    pub fn send_call(&self, unit_id: u8, from_floor: u8, to_floor: u8) -> Result<(), SimError> {
        let tx = self
            .cmd_txs
            .get(&unit_id)
            .ok_or(SimError::UnknownUnit { id: unit_id })?;
        tx.send(UnitCommand::Call {
            from_floor,
            to_floor,
        })
        .map_err(|_| SimError::Engine {
            reason: format!("unit {} command channel disconnected", unit_id),
        })
    }

    /// Cancels every scheduled tick and clears every stop queue. All-or-
    /// nothing by design: no per-unit cancellation is exposed. Safe to call
    /// repeatedly.
    pub fn stop_all(&self) {
        info!("Stopping all movements");
        for (id, tx) in self.cmd_txs.iter() {
            if tx.send(UnitCommand::StopAll).is_err() {
                debug!("Unit {} command channel already closed", id);
            }
        }
    }

    #[cfg(test)]
    pub fn test_with_senders(cmd_txs: BTreeMap<u8, cbc::Sender<UnitCommand>>) -> Self {
        EngineHandle {
            cmd_txs,
            threads: Vec::new(),
        }
    }

    /// Terminates every unit thread and waits for them to exit.
    pub fn shutdown(self) {
        for tx in self.cmd_txs.values() {
            let _ = tx.send(UnitCommand::Terminate);
        }
        for handle in self.threads {
            let _ = handle.join();
        }
    }
}

/***************************************/
/*             Public API              */
/***************************************/
/// Spawns one FSM thread per unit found in the fleet store. Units restored
/// mid-journey are normalized to idle first: their queues did not survive
/// the restart, so a stale moving state would never advance again.
pub fn start_engine(
    config: SharedConfig,
    store: Arc<dyn FleetStore>,
    event_log: Arc<dyn EventLog>,
    notifier: Arc<dyn Notifier>,
) -> Result<EngineHandle, SimError> {
    let fleet = store.get_all()?;
    if fleet.is_empty() {
        return Err(SimError::EmptyFleet);
    }

    let mut cmd_txs = BTreeMap::new();
    let mut threads = Vec::new();

    for mut unit in fleet {
        if unit.motion_state != MotionState::Idle || unit.target_floor.is_some() {
            debug!(
                "Unit {} restored in state {:?}, normalizing to idle",
                unit.id, unit.motion_state
            );
            unit.target_floor = None;
            unit.direction = Direction::None;
            unit.set_motion(MotionState::Idle);
            store.update(&unit)?;
        }

        let (cmd_tx, cmd_rx) = cbc::unbounded::<UnitCommand>();
        let fsm = UnitFsm::new(
            unit.clone(),
            cmd_rx,
            config.clone(),
            store.clone(),
            event_log.clone(),
            notifier.clone(),
        );

        let thread = Builder::new()
            .name(format!("unit_fsm_{}", unit.id))
            .spawn(move || fsm.run())
            .map_err(|e| SimError::Engine {
                reason: format!("failed to spawn thread for unit {}: {}", unit.id, e),
            })?;

        cmd_txs.insert(unit.id, cmd_tx);
        threads.push(thread);
    }

    info!("Movement engine started with {} unit(s)", cmd_txs.len());
    Ok(EngineHandle { cmd_txs, threads })
}
