/*
 * Unit tests for the coordinator facade
 *
 * The unit tests follow the Arrange, Act, Assert pattern. Each test stands
 * up the full stack (store, event log, notifier, engine threads) around the
 * coordinator and drives it through the collaborator-facing API.
 */

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod coordinator_tests {
    use crate::config::{ConfigPatch, SimConfig};
    use crate::coordinator::Coordinator;
    use crate::engine::{self, EngineHandle, UnitCommand};
    use crate::notifier::ChannelNotifier;
    use crate::shared::{CallRequest, EventKind, EventRecord, MotionState, SimError};
    use crate::storage::{FleetStore, InMemoryEventLog, InMemoryFleet};
    use crossbeam_channel as cbc;
    use std::collections::BTreeMap;
    use std::sync::{Arc, RwLock};
    use std::time::Duration;

    const RECV_TIMEOUT: Duration = Duration::from_secs(5);

    fn fast_config(n_units: u8) -> SimConfig {
        SimConfig {
            total_floors: 10,
            floor_move_time: 0.02,
            door_open_close_time: 0.01,
            n_units,
        }
    }

    fn setup_coordinator(
        config: SimConfig,
        unit_floors: &[u8],
    ) -> (
        Coordinator,
        Arc<InMemoryEventLog>,
        cbc::Receiver<EventRecord>,
    ) {
        // Arrange the collaborators
        assert_eq!(unit_floors.len(), config.n_units as usize);
        let store = Arc::new(InMemoryFleet::new(config.n_units));
        for (i, floor) in unit_floors.iter().enumerate() {
            let mut unit = store.get(i as u8 + 1).unwrap().unwrap();
            unit.current_floor = *floor;
            store.update(&unit).unwrap();
        }

        let event_log = Arc::new(InMemoryEventLog::new());
        let (notifier, _unit_rx, event_rx) = ChannelNotifier::new();
        let shared_config = Arc::new(RwLock::new(config));

        let engine = engine::start_engine(
            shared_config.clone(),
            store.clone(),
            event_log.clone(),
            Arc::new(notifier.clone()),
        )
        .unwrap();

        let coordinator = Coordinator::new(
            shared_config,
            store,
            event_log.clone(),
            Arc::new(notifier),
            engine,
        );
        (coordinator, event_log, event_rx)
    }

    fn call(from_floor: u8, to_floor: u8) -> CallRequest {
        CallRequest {
            from_floor,
            to_floor,
            requester: Some("test".to_string()),
        }
    }

    #[test]
    fn test_accept_call_returns_unit_and_estimate() {
        // Arrange: everyone idle at floor 1, 1s per floor, 0.5s per door phase
        let config = SimConfig {
            total_floors: 10,
            floor_move_time: 1.0,
            door_open_close_time: 0.5,
            n_units: 2,
        };
        let (coordinator, _event_log, _event_rx) = setup_coordinator(config, &[1, 1]);

        // Act
        let outcome = coordinator.accept_call(&call(1, 5)).unwrap();

        // Assert: first unit wins the tie, 4 x 1.0 + 2 x 0.5 = 5.0
        assert_eq!(outcome.unit_id, 1);
        assert!((outcome.estimated_seconds - 5.0).abs() < 1e-9);

        // Cleanup
        coordinator.stop_all();
        coordinator.shutdown();
    }

    #[test]
    fn test_estimate_includes_approach_leg() {
        // Arrange: single unit parked at floor 3
        let config = SimConfig {
            total_floors: 10,
            floor_move_time: 1.0,
            door_open_close_time: 0.5,
            n_units: 1,
        };
        let (coordinator, _event_log, _event_rx) = setup_coordinator(config, &[3]);

        // Act
        let outcome = coordinator.accept_call(&call(1, 5)).unwrap();

        // Assert: (|3-1| + |1-5|) x 1.0 + 2 x 0.5 = 7.0
        assert!((outcome.estimated_seconds - 7.0).abs() < 1e-9);

        // Cleanup
        coordinator.stop_all();
        coordinator.shutdown();
    }

    #[test]
    fn test_same_floor_calls_leave_state_untouched() {
        // Arrange
        let (coordinator, event_log, _event_rx) = setup_coordinator(fast_config(2), &[1, 1]);
        let before = coordinator.current_states().unwrap();

        // Act
        for floor in 1..=10 {
            let result = coordinator.accept_call(&call(floor, floor));
            assert!(matches!(result, Err(SimError::SameFloor { floor: f }) if f == floor));
        }

        // Assert: no unit mutated, nothing logged
        assert_eq!(coordinator.current_states().unwrap(), before);
        assert!(event_log.snapshot().is_empty());

        // Cleanup
        coordinator.shutdown();
    }

    #[test]
    fn test_out_of_range_calls_rejected() {
        // Arrange
        let (coordinator, _event_log, _event_rx) = setup_coordinator(fast_config(1), &[1]);

        // Act / Assert
        assert!(matches!(
            coordinator.accept_call(&call(0, 5)),
            Err(SimError::FloorOutOfRange { floor: 0, .. })
        ));
        assert!(matches!(
            coordinator.accept_call(&call(1, 11)),
            Err(SimError::FloorOutOfRange { floor: 11, .. })
        ));
        assert!(matches!(
            coordinator.accept_call(&call(12, 1)),
            Err(SimError::FloorOutOfRange { floor: 12, .. })
        ));

        // Cleanup
        coordinator.shutdown();
    }

    #[test]
    fn test_unknown_unit_status_query() {
        // Arrange
        let (coordinator, _event_log, _event_rx) = setup_coordinator(fast_config(2), &[1, 1]);

        // Act / Assert
        assert!(coordinator.current_state(1).is_ok());
        assert!(matches!(
            coordinator.current_state(42),
            Err(SimError::UnknownUnit { id: 42 })
        ));

        // Cleanup
        coordinator.shutdown();
    }

    #[test]
    fn test_nearest_idle_unit_selected() {
        // Arrange: unit 1 at floor 5, unit 2 at floor 1
        let (coordinator, _event_log, _event_rx) = setup_coordinator(fast_config(2), &[5, 1]);

        // Act
        let outcome = coordinator.accept_call(&call(1, 3)).unwrap();

        // Assert
        assert_eq!(outcome.unit_id, 2);

        // Cleanup
        coordinator.stop_all();
        coordinator.shutdown();
    }

    #[test]
    fn test_stop_all_is_idempotent_and_cancels_ticks() {
        // Arrange
        let (coordinator, _event_log, event_rx) = setup_coordinator(fast_config(2), &[1, 1]);
        coordinator.accept_call(&call(1, 6)).unwrap();
        loop {
            let event = event_rx.recv_timeout(RECV_TIMEOUT).unwrap();
            if event.kind == EventKind::FloorReached {
                break;
            }
        }

        // Act
        coordinator.stop_all();
        loop {
            let event = event_rx.recv_timeout(RECV_TIMEOUT).unwrap();
            if event.kind == EventKind::Stopped {
                break;
            }
        }

        // Assert: every unit settled, no tick fires afterwards
        for unit in coordinator.current_states().unwrap() {
            assert_eq!(unit.motion_state, MotionState::Idle);
            assert_eq!(unit.target_floor, None);
            assert!(!unit.is_moving);
        }
        assert!(
            event_rx.recv_timeout(Duration::from_millis(200)).is_err(),
            "no tick may fire after stop_all"
        );

        // Act: second stop is safe and silent
        coordinator.stop_all();
        assert!(event_rx.recv_timeout(Duration::from_millis(200)).is_err());

        // Cleanup
        coordinator.shutdown();
    }

    #[test]
    fn test_failed_handoff_leaves_no_acceptance_event() {
        // Arrange: the unit's FSM thread is gone, so its command channel
        // rejects every send
        let store = Arc::new(InMemoryFleet::new(1));
        let event_log = Arc::new(InMemoryEventLog::new());
        let (notifier, _unit_rx, event_rx) = ChannelNotifier::new();
        let shared_config = Arc::new(RwLock::new(fast_config(1)));

        let (cmd_tx, cmd_rx) = cbc::unbounded::<UnitCommand>();
        drop(cmd_rx);
        let mut cmd_txs = BTreeMap::new();
        cmd_txs.insert(1, cmd_tx);
        let engine = EngineHandle::test_with_senders(cmd_txs);

        let coordinator = Coordinator::new(
            shared_config,
            store,
            event_log.clone(),
            Arc::new(notifier),
            engine,
        );

        // Act
        let result = coordinator.accept_call(&call(1, 5));

        // Assert: the call fails and no acceptance is recorded anywhere
        assert!(matches!(result, Err(SimError::Engine { .. })));
        assert!(
            event_log.snapshot().is_empty(),
            "a call the engine never received must not be logged"
        );
        assert!(event_rx.try_recv().is_err());
    }

    #[test]
    fn test_set_config_rejects_invalid_values() {
        // Arrange
        let (coordinator, _event_log, _event_rx) = setup_coordinator(fast_config(1), &[1]);
        let before = coordinator.get_config();

        // Act / Assert
        let too_few_floors = ConfigPatch {
            total_floors: Some(1),
            ..ConfigPatch::default()
        };
        assert!(matches!(
            coordinator.set_config(&too_few_floors),
            Err(SimError::InvalidConfig { .. })
        ));

        let negative_speed = ConfigPatch {
            floor_move_time: Some(-1.0),
            ..ConfigPatch::default()
        };
        assert!(matches!(
            coordinator.set_config(&negative_speed),
            Err(SimError::InvalidConfig { .. })
        ));

        let zero_door_time = ConfigPatch {
            door_open_close_time: Some(0.0),
            ..ConfigPatch::default()
        };
        assert!(matches!(
            coordinator.set_config(&zero_door_time),
            Err(SimError::InvalidConfig { .. })
        ));

        assert_eq!(coordinator.get_config(), before);

        // Cleanup
        coordinator.shutdown();
    }

    #[test]
    fn test_non_finite_timings_rejected() {
        // Purpose: inf/NaN slip past a plain <= 0.0 check and TOML parses
        // them as legal floats, but the tick timers cannot represent them

        // Arrange
        let (coordinator, _event_log, _event_rx) = setup_coordinator(fast_config(1), &[1]);
        let before = coordinator.get_config();

        // Act / Assert: runtime patches
        for bad in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let patch = ConfigPatch {
                floor_move_time: Some(bad),
                ..ConfigPatch::default()
            };
            assert!(
                matches!(coordinator.set_config(&patch), Err(SimError::InvalidConfig { .. })),
                "floorMoveTime {} must be rejected",
                bad
            );
            let patch = ConfigPatch {
                door_open_close_time: Some(bad),
                ..ConfigPatch::default()
            };
            assert!(
                matches!(coordinator.set_config(&patch), Err(SimError::InvalidConfig { .. })),
                "doorOpenCloseTime {} must be rejected",
                bad
            );
        }
        assert_eq!(coordinator.get_config(), before);

        // Act / Assert: the file-loading path parses inf but fails validation
        let parsed = toml::from_str::<SimConfig>("floorMoveTime = inf").unwrap();
        assert!(matches!(parsed.validate(), Err(SimError::InvalidConfig { .. })));
        let parsed = toml::from_str::<SimConfig>("doorOpenCloseTime = nan").unwrap();
        assert!(matches!(parsed.validate(), Err(SimError::InvalidConfig { .. })));

        // Cleanup
        coordinator.shutdown();
    }

    #[test]
    fn test_set_config_applies_to_later_calls() {
        // Arrange
        let (coordinator, _event_log, _event_rx) = setup_coordinator(fast_config(1), &[1]);

        // Act: shrink the building to 4 floors
        let patch = ConfigPatch {
            total_floors: Some(4),
            ..ConfigPatch::default()
        };
        let updated = coordinator.set_config(&patch).unwrap();

        // Assert
        assert_eq!(updated.total_floors, 4);
        assert_eq!(coordinator.get_config().total_floors, 4);
        assert!(matches!(
            coordinator.accept_call(&call(1, 5)),
            Err(SimError::FloorOutOfRange { floor: 5, .. })
        ));
        assert!(coordinator.accept_call(&call(1, 4)).is_ok());

        // Cleanup
        coordinator.stop_all();
        coordinator.shutdown();
    }
}
