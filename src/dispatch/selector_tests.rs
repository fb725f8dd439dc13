/*
 * Unit tests for the dispatch selector
 *
 * The unit tests follow the Arrange, Act, Assert pattern.
 */

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod selector_tests {
    use crate::config::SimConfig;
    use crate::dispatch::selector::{estimated_seconds, score_unit, select_unit, validate_call};
    use crate::shared::{Direction, ElevatorUnit, MotionState, SimError};

    fn unit_at(id: u8, floor: u8, motion: MotionState) -> ElevatorUnit {
        let mut unit = ElevatorUnit::new(id);
        unit.current_floor = floor;
        unit.set_motion(motion);
        unit.direction = match motion {
            MotionState::MovingUp => Direction::Up,
            MotionState::MovingDown => Direction::Down,
            _ => Direction::None,
        };
        unit
    }

    fn test_config() -> SimConfig {
        SimConfig {
            total_floors: 10,
            floor_move_time: 1.0,
            door_open_close_time: 0.5,
            n_units: 2,
        }
    }

    #[test]
    fn test_same_floor_rejected_on_every_floor() {
        // Arrange
        let total_floors = 10;

        // Act / Assert
        for floor in 1..=total_floors {
            let result = validate_call(floor, floor, total_floors);
            assert!(
                matches!(result, Err(SimError::SameFloor { floor: f }) if f == floor),
                "floor {} should fail the same-floor check",
                floor
            );
        }
    }

    #[test]
    fn test_out_of_range_floors_rejected() {
        // Arrange
        let total_floors = 10;

        // Act
        let below_from = validate_call(0, 5, total_floors);
        let above_from = validate_call(11, 5, total_floors);
        let below_to = validate_call(5, 0, total_floors);
        let above_to = validate_call(5, 11, total_floors);
        let valid = validate_call(1, 10, total_floors);

        // Assert
        assert!(matches!(below_from, Err(SimError::FloorOutOfRange { floor: 0, .. })));
        assert!(matches!(above_from, Err(SimError::FloorOutOfRange { floor: 11, .. })));
        assert!(matches!(below_to, Err(SimError::FloorOutOfRange { floor: 0, .. })));
        assert!(matches!(above_to, Err(SimError::FloorOutOfRange { floor: 11, .. })));
        assert!(valid.is_ok());
    }

    #[test]
    fn test_estimate_from_pickup_floor() {
        // Purpose: unit already at the pickup floor, 4 floors of travel
        // plus one door phase pair: 4 x 1.0 + 2 x 0.5 = 5.0

        // Arrange
        let config = test_config();

        // Act
        let estimate = estimated_seconds(1, 1, 5, &config);

        // Assert
        assert!((estimate - 5.0).abs() < 1e-9, "got {}", estimate);
    }

    #[test]
    fn test_estimate_includes_approach_leg() {
        // Purpose: (|3-1| + |1-5|) x 1.0 + 2 x 0.5 = 7.0

        // Arrange
        let config = test_config();

        // Act
        let estimate = estimated_seconds(3, 1, 5, &config);

        // Assert
        assert!((estimate - 7.0).abs() < 1e-9, "got {}", estimate);
    }

    #[test]
    fn test_nearest_idle_unit_wins() {
        // Arrange
        let fleet = vec![
            unit_at(1, 5, MotionState::Idle),
            unit_at(2, 1, MotionState::Idle),
        ];

        // Act
        let selected = select_unit(&fleet, 1).unwrap();

        // Assert
        assert_eq!(selected.id, 2);
    }

    #[test]
    fn test_idle_bonus_dominates_within_three_floors() {
        // Purpose: idle (-50) beats moving-toward (-20) exactly while the
        // distance gap is under 3 floors; at 3 the scores tie and fleet
        // order decides.

        // Arrange: pickup at floor 1, moving unit heading down toward it
        let pickup = 1;
        let moving = unit_at(1, 3, MotionState::MovingDown); // d=2, score 20-20=0
        let idle_gap_two = unit_at(2, 5, MotionState::Idle); // d=4, score 40-50=-10
        let idle_gap_three = unit_at(3, 6, MotionState::Idle); // d=5, score 50-50=0
        let idle_gap_four = unit_at(4, 7, MotionState::Idle); // d=6, score 60-50=10

        // Act
        let with_gap_two = select_unit(&[moving.clone(), idle_gap_two], pickup).unwrap().id;
        let with_gap_three = select_unit(&[moving.clone(), idle_gap_three], pickup).unwrap().id;
        let with_gap_four = select_unit(&[moving, idle_gap_four], pickup).unwrap().id;

        // Assert
        assert_eq!(with_gap_two, 2, "idle wins while the gap is under 3");
        assert_eq!(with_gap_three, 1, "tie goes to the first unit in fleet order");
        assert_eq!(with_gap_four, 1, "moving-toward wins past the threshold");
    }

    #[test]
    fn test_moving_away_is_penalized_not_excluded() {
        // Arrange: both at distance 2 from the pickup
        let pickup = 3;
        let away = unit_at(1, 5, MotionState::MovingUp);
        let toward = unit_at(2, 5, MotionState::MovingDown);

        // Act
        let away_score = score_unit(&away, pickup);
        let toward_score = score_unit(&toward, pickup);
        let selected = select_unit(&[away.clone(), toward], pickup).unwrap().id;
        let only_away = select_unit(&[away], pickup).unwrap().id;

        // Assert
        assert_eq!(away_score, 50);
        assert_eq!(toward_score, 0);
        assert_eq!(selected, 2);
        assert_eq!(only_away, 1, "a unit moving away is still selectable");
    }

    #[test]
    fn test_door_phase_units_scored_on_distance_only() {
        // Arrange
        let pickup = 2;
        let opening = unit_at(1, 4, MotionState::DoorsOpening);
        let open = unit_at(2, 4, MotionState::DoorsOpen);
        let closing = unit_at(3, 4, MotionState::DoorsClosing);

        // Act / Assert
        assert_eq!(score_unit(&opening, pickup), 20);
        assert_eq!(score_unit(&open, pickup), 20);
        assert_eq!(score_unit(&closing, pickup), 20);
    }

    #[test]
    fn test_empty_fleet_is_a_configuration_error() {
        // Act
        let result = select_unit(&[], 1);

        // Assert
        assert!(matches!(result, Err(SimError::EmptyFleet)));
    }
}
