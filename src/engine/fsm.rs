/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{debug, error, warn};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

/***************************************/
/*           Local modules             */
/***************************************/
use crate::config::SharedConfig;
use crate::notifier::Notifier;
use crate::shared::{
    Direction, ElevatorUnit, EventKind, EventRecord, MotionState, SimError, Stop, StopKind,
    StopQueue,
};
use crate::storage::{EventLog, FleetStore};

/// Dwell with doors fully open, independent of the configured door timing.
const DOOR_OPEN_DWELL: Duration = Duration::from_secs(2);

/***************************************/
/*               Enums                 */
/***************************************/
pub enum UnitCommand {
    Call { from_floor: u8, to_floor: u8 },
    StopAll,
    Terminate,
}

/**
 * Per-unit movement state machine.
 *
 * One `UnitFsm` runs on its own thread and exclusively owns one unit's state
 * and stop queue. The loop selects over the command channel and a tick timer;
 * the timer is `never` while the unit is idle and re-armed after every tick,
 * so at most one tick is ever scheduled per unit. Every transition is
 * persisted through the fleet store and published through the notifier
 * before the next delay starts.
 *
 * # Fields
 * - `cmd_rx`:      Receives calls and global stop/terminate commands.
 * - `store`:       Write-through persistence for the unit's state.
 * - `event_log`:   Append-only record of every transition.
 * - `notifier`:    Best-effort push of state and event changes.
 * - `config`:      Shared timing/bounds; read when each tick is armed.
 * - `unit`:        Authoritative in-thread copy of the unit's state.
 * - `stops`:       Pending stops, pickup and dropoff entries in FIFO order.
 * - `tick_timer`:  The single scheduled tick, or `never` when idle.
 * - `door_dwell`:  Open-door dwell, fixed in production.
 */
pub struct UnitFsm {
    cmd_rx: cbc::Receiver<UnitCommand>,
    store: Arc<dyn FleetStore>,
    event_log: Arc<dyn EventLog>,
    notifier: Arc<dyn Notifier>,
    config: SharedConfig,
    unit: ElevatorUnit,
    stops: StopQueue,
    tick_timer: cbc::Receiver<Instant>,
    door_dwell: Duration,
}

impl UnitFsm {
    pub fn new(
        unit: ElevatorUnit,
        cmd_rx: cbc::Receiver<UnitCommand>,
        config: SharedConfig,
        store: Arc<dyn FleetStore>,
        event_log: Arc<dyn EventLog>,
        notifier: Arc<dyn Notifier>,
    ) -> UnitFsm {
        UnitFsm {
            cmd_rx,
            store,
            event_log,
            notifier,
            config,
            unit,
            stops: StopQueue::new(),
            tick_timer: cbc::never(),
            door_dwell: DOOR_OPEN_DWELL,
        }
    }

    pub fn run(mut self) {
        loop {
            cbc::select! {
                recv(self.cmd_rx) -> cmd => {
                    match cmd {
                        Ok(UnitCommand::Call { from_floor, to_floor }) => {
                            self.handle_call(from_floor, to_floor)
                        }
                        Ok(UnitCommand::StopAll) => self.handle_stop_all(),
                        Ok(UnitCommand::Terminate) => break,
                        // Coordinator side is gone, nothing left to drive us.
                        Err(_) => break,
                    }
                }
                recv(self.tick_timer) -> _ => self.handle_tick(),
            }
        }
    }

    /// Appends the accepted call's stops and starts the unit if it is idle.
    /// A unit with a tick chain already in flight keeps it; the new stops
    /// are simply served in turn.
    fn handle_call(&mut self, from_floor: u8, to_floor: u8) {
        if self.unit.current_floor != from_floor {
            self.stops.push_back(Stop {
                kind: StopKind::Pickup,
                floor: from_floor,
            });
        }
        self.stops.push_back(Stop {
            kind: StopKind::Dropoff,
            floor: to_floor,
        });

        debug!(
            "Unit {}: call {} -> {} queued, {} pending stop(s)",
            self.unit.id,
            from_floor,
            to_floor,
            self.stops.len()
        );

        if self.unit.motion_state == MotionState::Idle {
            self.start_next_leg();
        }
    }

    /// Global movement stop: cancel the scheduled tick, drop every pending
    /// stop and settle to idle. Idempotent; a unit that is already settled
    /// stays silent.
    fn handle_stop_all(&mut self) {
        self.stops.clear();
        self.tick_timer = cbc::never();

        if self.unit.motion_state != MotionState::Idle || self.unit.target_floor.is_some() {
            self.settle_idle(
                EventKind::Stopped,
                format!("movement stopped at floor {}", self.unit.current_floor),
            );
        }
    }

    fn handle_tick(&mut self) {
        match self.unit.motion_state {
            MotionState::MovingUp | MotionState::MovingDown => self.advance_one_floor(),
            MotionState::DoorsOpening => {
                self.unit.set_motion(MotionState::DoorsOpen);
                let detail = format!("doors open at floor {}", self.unit.current_floor);
                if self.commit(EventKind::DoorsOpen, detail).is_err() {
                    return;
                }
                self.tick_timer = cbc::after(self.door_dwell);
            }
            MotionState::DoorsOpen => {
                self.unit.set_motion(MotionState::DoorsClosing);
                let detail = format!("doors closing at floor {}", self.unit.current_floor);
                if self.commit(EventKind::DoorsClosing, detail).is_err() {
                    return;
                }
                self.tick_timer = cbc::after(self.door_time());
            }
            MotionState::DoorsClosing => self.finish_stop(),
            // No tick is ever armed while idle; a stray one is harmless.
            MotionState::Idle => {}
        }
    }

    /// Start rule: take the queue head as the target and set off toward it.
    /// A head at the current floor skips straight to the door cycle.
    fn start_next_leg(&mut self) {
        let head = match self.stops.front() {
            Some(stop) => *stop,
            None => {
                self.settle_idle(
                    EventKind::Idle,
                    format!("queue exhausted, idle at floor {}", self.unit.current_floor),
                );
                return;
            }
        };

        self.unit.target_floor = Some(head.floor);
        if head.floor == self.unit.current_floor {
            self.begin_door_cycle();
            return;
        }

        if head.floor > self.unit.current_floor {
            self.unit.direction = Direction::Up;
            self.unit.set_motion(MotionState::MovingUp);
        } else {
            self.unit.direction = Direction::Down;
            self.unit.set_motion(MotionState::MovingDown);
        }

        let detail = format!(
            "departing floor {} for floor {}",
            self.unit.current_floor, head.floor
        );
        if self.commit(EventKind::MovementStarted, detail).is_err() {
            return;
        }
        self.tick_timer = cbc::after(self.floor_time());
    }

    /// One-floor tick. The resulting floor leaving the building bounds is a
    /// simulation inconsistency, not a recoverable error.
    fn advance_one_floor(&mut self) {
        let next_floor = match self.unit.direction {
            Direction::Up => self.unit.current_floor.saturating_add(1),
            Direction::Down => self.unit.current_floor.wrapping_sub(1),
            Direction::None => {
                self.heal_to_idle("moving with no direction set".to_string());
                return;
            }
        };

        let total_floors = self.total_floors();
        if next_floor < 1 || next_floor > total_floors {
            self.heal_to_idle(format!(
                "floor {} is outside 1..={}",
                next_floor, total_floors
            ));
            return;
        }

        self.unit.current_floor = next_floor;

        if self.unit.target_floor == Some(next_floor) {
            let detail = format!("arrived at floor {}", next_floor);
            if self.commit(EventKind::FloorReached, detail).is_err() {
                return;
            }
            self.begin_door_cycle();
        } else {
            let detail = match self.unit.target_floor {
                Some(target) => format!("passing floor {} toward floor {}", next_floor, target),
                None => format!("passing floor {}", next_floor),
            };
            if self.commit(EventKind::FloorReached, detail).is_err() {
                return;
            }
            self.tick_timer = cbc::after(self.floor_time());
        }
    }

    fn begin_door_cycle(&mut self) {
        self.unit.direction = Direction::None;
        self.unit.set_motion(MotionState::DoorsOpening);
        let detail = format!("doors opening at floor {}", self.unit.current_floor);
        if self.commit(EventKind::DoorsOpening, detail).is_err() {
            return;
        }
        self.tick_timer = cbc::after(self.door_time());
    }

    /// Queue continuation after a completed door cycle: pop the served stop
    /// and either set off for the next one (no new external call needed) or
    /// settle to idle.
    fn finish_stop(&mut self) {
        match self.stops.pop_front() {
            Some(stop) if stop.floor == self.unit.current_floor => {
                let kind_str = match stop.kind {
                    StopKind::Pickup => "pickup",
                    StopKind::Dropoff => "dropoff",
                };
                let detail = format!("{} served at floor {}", kind_str, stop.floor);
                if self.commit(EventKind::StopServed, detail).is_err() {
                    return;
                }
            }
            Some(stop) => {
                self.heal_to_idle(format!(
                    "queue head {} does not match current floor {}",
                    stop.floor, self.unit.current_floor
                ));
                return;
            }
            None => {
                self.heal_to_idle("door cycle finished with an empty queue".to_string());
                return;
            }
        }

        if self.stops.is_empty() {
            self.settle_idle(
                EventKind::Idle,
                format!("queue exhausted, idle at floor {}", self.unit.current_floor),
            );
        } else {
            self.start_next_leg();
        }
    }

    fn settle_idle(&mut self, kind: EventKind, detail: String) {
        self.unit.target_floor = None;
        self.unit.direction = Direction::None;
        self.unit.set_motion(MotionState::Idle);
        self.tick_timer = cbc::never();
        // The chain is over either way; a failed final write only costs the
        // settle event.
        let _ = self.commit(kind, detail);
    }

    /// Self-healing for simulation inconsistencies. Never surfaced to a
    /// caller: the tick that found the problem has no one waiting on it.
    fn heal_to_idle(&mut self, reason: String) {
        error!(
            "Unit {}: simulation inconsistency, self-healing to idle: {}",
            self.unit.id, reason
        );
        self.stops.clear();
        self.settle_idle(
            EventKind::Anomaly,
            format!("reset to idle at floor {}: {}", self.unit.current_floor, reason),
        );
    }

    /// Write-through of the current unit state plus one event record. A
    /// store or log failure abandons the rest of the tick and drops the
    /// scheduled continuation; there is no retry. Callers can detect the
    /// stall through `last_updated` staleness.
    fn commit(&mut self, kind: EventKind, detail: String) -> Result<(), SimError> {
        self.unit.last_updated = SystemTime::now();

        if let Err(e) = self.store.update(&self.unit) {
            warn!(
                "Unit {}: fleet store write failed, dropping tick chain: {}",
                self.unit.id, e
            );
            self.tick_timer = cbc::never();
            return Err(e);
        }
        self.notifier.publish_unit_changed(&self.unit);

        let event = EventRecord::for_unit(&self.unit, kind, detail);
        if let Err(e) = self.event_log.append(&event) {
            warn!(
                "Unit {}: event log append failed, dropping tick chain: {}",
                self.unit.id, e
            );
            self.tick_timer = cbc::never();
            return Err(e);
        }
        self.notifier.publish_event(&event);

        Ok(())
    }

    fn floor_time(&self) -> Duration {
        let cfg = match self.config.read() {
            Ok(cfg) => cfg,
            Err(poisoned) => poisoned.into_inner(),
        };
        Duration::from_secs_f64(cfg.floor_move_time)
    }

    fn door_time(&self) -> Duration {
        let cfg = match self.config.read() {
            Ok(cfg) => cfg,
            Err(poisoned) => poisoned.into_inner(),
        };
        Duration::from_secs_f64(cfg.door_open_close_time)
    }

    fn total_floors(&self) -> u8 {
        let cfg = match self.config.read() {
            Ok(cfg) => cfg,
            Err(poisoned) => poisoned.into_inner(),
        };
        cfg.total_floors
    }
}

/***************************************/
/*            Test helpers             */
/***************************************/
#[cfg(test)]
impl UnitFsm {
    pub fn test_unit(&self) -> &ElevatorUnit {
        &self.unit
    }

    pub fn test_set_unit(&mut self, unit: ElevatorUnit) {
        self.unit = unit;
    }

    pub fn test_stops(&self) -> &StopQueue {
        &self.stops
    }

    pub fn test_set_stops(&mut self, stops: StopQueue) {
        self.stops = stops;
    }

    pub fn test_handle_call(&mut self, from_floor: u8, to_floor: u8) {
        self.handle_call(from_floor, to_floor);
    }

    pub fn test_handle_tick(&mut self) {
        self.handle_tick();
    }

    pub fn test_set_door_dwell(&mut self, dwell: Duration) {
        self.door_dwell = dwell;
    }
}
