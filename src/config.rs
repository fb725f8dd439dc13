/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::warn;
use serde::Deserialize;
use serde::Serialize;
use std::fs;
use std::sync::Arc;
use std::sync::RwLock;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::SimError;

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    #[serde(rename = "totalFloors", default = "default_total_floors")]
    pub total_floors: u8,
    #[serde(rename = "floorMoveTime", default = "default_floor_move_time")]
    pub floor_move_time: f64,
    #[serde(rename = "doorOpenCloseTime", default = "default_door_open_close_time")]
    pub door_open_close_time: f64,
    #[serde(rename = "nUnits", default = "default_n_units")]
    pub n_units: u8,
}

/// Partial runtime update; unrecognized options are rejected at the parsing
/// layer, absent fields leave the current value untouched. The fleet size is
/// fixed at bootstrap and deliberately not patchable.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigPatch {
    #[serde(rename = "totalFloors")]
    pub total_floors: Option<u8>,
    #[serde(rename = "floorMoveTime")]
    pub floor_move_time: Option<f64>,
    #[serde(rename = "doorOpenCloseTime")]
    pub door_open_close_time: Option<f64>,
}

/// Config handle shared between the coordinator and the per-unit FSM
/// threads. Timing values are read when a tick is armed, so a change applies
/// from the next armed tick onward and never retroactively.
pub type SharedConfig = Arc<RwLock<SimConfig>>;

fn default_total_floors() -> u8 {
    10
}

fn default_floor_move_time() -> f64 {
    5.0
}

fn default_door_open_close_time() -> f64 {
    2.0
}

fn default_n_units() -> u8 {
    5
}

impl Default for SimConfig {
    fn default() -> SimConfig {
        SimConfig {
            total_floors: default_total_floors(),
            floor_move_time: default_floor_move_time(),
            door_open_close_time: default_door_open_close_time(),
            n_units: default_n_units(),
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        if self.total_floors < 2 {
            return Err(SimError::InvalidConfig {
                reason: format!("totalFloors must be at least 2, got {}", self.total_floors),
            });
        }
        // Timings feed Duration::from_secs_f64, which rejects non-finite
        // values; they must never get past this gate.
        if !self.floor_move_time.is_finite() || self.floor_move_time <= 0.0 {
            return Err(SimError::InvalidConfig {
                reason: format!(
                    "floorMoveTime must be a positive finite number, got {}",
                    self.floor_move_time
                ),
            });
        }
        if !self.door_open_close_time.is_finite() || self.door_open_close_time <= 0.0 {
            return Err(SimError::InvalidConfig {
                reason: format!(
                    "doorOpenCloseTime must be a positive finite number, got {}",
                    self.door_open_close_time
                ),
            });
        }
        if self.n_units == 0 {
            return Err(SimError::InvalidConfig {
                reason: "nUnits must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the patched config without mutating self; the caller swaps it
    /// into the shared handle only after validation passes.
    pub fn patched(&self, patch: &ConfigPatch) -> SimConfig {
        SimConfig {
            total_floors: patch.total_floors.unwrap_or(self.total_floors),
            floor_move_time: patch.floor_move_time.unwrap_or(self.floor_move_time),
            door_open_close_time: patch
                .door_open_close_time
                .unwrap_or(self.door_open_close_time),
            n_units: self.n_units,
        }
    }
}

/***************************************/
/*             Public API              */
/***************************************/
pub fn load_config(path: &str) -> Result<SimConfig, SimError> {
    let config = match fs::read_to_string(path) {
        Ok(config_str) => toml::from_str(&config_str).map_err(|e| SimError::InvalidConfig {
            reason: format!("failed to parse {}: {}", path, e),
        })?,
        Err(e) => {
            warn!("No configuration file at {} ({}), using defaults", path, e);
            SimConfig::default()
        }
    };
    config.validate()?;
    Ok(config)
}
