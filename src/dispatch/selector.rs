/***************************************/
/*           Local modules             */
/***************************************/
use crate::config::SimConfig;
use crate::shared::{ElevatorUnit, MotionState, SimError};

/***************************************/
/*             Public API              */
/***************************************/
/// Checks a call against the building bounds before any state is touched.
/// Violations name the failing constraint; nothing is mutated on failure.
pub fn validate_call(from_floor: u8, to_floor: u8, total_floors: u8) -> Result<(), SimError> {
    if from_floor < 1 || from_floor > total_floors {
        return Err(SimError::FloorOutOfRange {
            floor: from_floor,
            total_floors,
        });
    }
    if to_floor < 1 || to_floor > total_floors {
        return Err(SimError::FloorOutOfRange {
            floor: to_floor,
            total_floors,
        });
    }
    if from_floor == to_floor {
        return Err(SimError::SameFloor { floor: from_floor });
    }
    Ok(())
}

/// Picks the unit to serve a pickup at `pickup_floor`. Lower score wins;
/// the first unit with the minimal score in fleet order is chosen, so ties
/// are deterministic for a fixed fleet ordering. Fails only on an empty
/// fleet, which is a configuration error.
pub fn select_unit(fleet: &[ElevatorUnit], pickup_floor: u8) -> Result<&ElevatorUnit, SimError> {
    let mut best: Option<(&ElevatorUnit, i32)> = None;

    for unit in fleet {
        let score = score_unit(unit, pickup_floor);
        match best {
            Some((_, best_score)) if score >= best_score => {}
            _ => best = Some((unit, score)),
        }
    }

    best.map(|(unit, _)| unit).ok_or(SimError::EmptyFleet)
}

/// Greedy dispatch score. Distance dominates; an idle car gets a flat bonus,
/// a car already travelling toward the pickup a smaller one, and a car
/// travelling away a penalty rather than exclusion. Door-phase cars are
/// scored on distance alone.
pub fn score_unit(unit: &ElevatorUnit, pickup_floor: u8) -> i32 {
    let distance = (i32::from(unit.current_floor) - i32::from(pickup_floor)).abs();
    let mut score = 10 * distance;

    match unit.motion_state {
        MotionState::Idle => score -= 50,
        MotionState::MovingUp | MotionState::MovingDown => {
            let toward = match unit.motion_state {
                MotionState::MovingUp => pickup_floor > unit.current_floor,
                _ => pickup_floor < unit.current_floor,
            };
            if toward {
                score -= 20;
            } else {
                score += 30;
            }
        }
        _ => {}
    }

    score
}

/// Advisory completion estimate for the newly accepted leg, returned to the
/// caller at acceptance. Ignores any queue already on the unit.
pub fn estimated_seconds(unit_floor: u8, from_floor: u8, to_floor: u8, config: &SimConfig) -> f64 {
    let approach = (i32::from(unit_floor) - i32::from(from_floor)).abs() as f64;
    let journey = (i32::from(from_floor) - i32::from(to_floor)).abs() as f64;
    (approach + journey) * config.floor_move_time + 2.0 * config.door_open_close_time
}
