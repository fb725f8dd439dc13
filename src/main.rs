/* 3rd party libraries */
use clap::{Arg, Command};
use crossbeam_channel as cbc;
use log::{error, info, warn};
use std::io::BufRead;
use std::sync::{Arc, RwLock};
use std::thread::Builder;

/* Custom libraries */
use config::{ConfigPatch, SharedConfig};
use coordinator::Coordinator;
use notifier::ChannelNotifier;
use shared::CallRequest;
use storage::{InMemoryEventLog, InMemoryFleet};

/* Modules */
mod config;
mod coordinator;
mod dispatch;
mod engine;
mod notifier;
mod shared;
mod storage;

/* Main */
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Command line arguments
    let matches = Command::new("elevator-sim")
        .about("Simulated elevator fleet with greedy dispatch and per-unit movement engines")
        .arg(
            Arg::new("config")
                .long("config")
                .takes_value(true)
                .default_value("config.toml")
                .help("Path to the TOML configuration file"),
        )
        .arg(
            Arg::new("floors")
                .long("floors")
                .takes_value(true)
                .help("Override the number of floors"),
        )
        .arg(
            Arg::new("units")
                .long("units")
                .takes_value(true)
                .help("Override the fleet size"),
        )
        .get_matches();

    // Load the configuration
    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("config.toml");
    let mut sim_config = crate::unwrap_or_exit!(config::load_config(config_path));
    if let Some(floors) = matches.get_one::<String>("floors") {
        sim_config.total_floors = crate::unwrap_or_exit!(floors.parse::<u8>().map_err(|e| {
            format!("invalid --floors value {:?}: {}", floors, e)
        }));
    }
    if let Some(units) = matches.get_one::<String>("units") {
        sim_config.n_units = crate::unwrap_or_exit!(units.parse::<u8>().map_err(|e| {
            format!("invalid --units value {:?}: {}", units, e)
        }));
    }
    crate::unwrap_or_exit!(sim_config.validate());

    // Collaborators: in-process store, event log and push channel
    let shared_config: SharedConfig = Arc::new(RwLock::new(sim_config.clone()));
    let store = Arc::new(InMemoryFleet::new(sim_config.n_units));
    let event_log = Arc::new(InMemoryEventLog::new());
    let (channel_notifier, unit_rx, event_rx) = ChannelNotifier::new();
    let notifier = Arc::new(channel_notifier);

    // Start the movement engine, one FSM thread per unit
    let engine = crate::unwrap_or_exit!(engine::start_engine(
        shared_config.clone(),
        store.clone(),
        event_log.clone(),
        notifier.clone(),
    ));
    let coordinator = Coordinator::new(shared_config, store, event_log, notifier, engine);

    // Observer thread: mirrors push notifications to the log and emits event
    // records as JSON lines, standing in for the external push transport
    let observer_thread = Builder::new().name("observer".into());
    crate::unwrap_or_exit!(observer_thread.spawn(move || loop {
        cbc::select! {
            recv(unit_rx) -> msg => {
                match msg {
                    Ok(unit) => info!(
                        "Unit {} at floor {} ({:?}, direction {:?})",
                        unit.id, unit.current_floor, unit.motion_state, unit.direction
                    ),
                    Err(_) => break,
                }
            }
            recv(event_rx) -> msg => {
                match msg {
                    Ok(event) => match serde_json::to_string(&event) {
                        Ok(line) => println!("{}", line),
                        Err(e) => warn!("Failed to serialize event: {}", e),
                    },
                    Err(_) => break,
                }
            }
        }
    }));

    info!(
        "elevator-sim ready: {} units, {} floors (type 'help' for commands)",
        sim_config.n_units, sim_config.total_floors
    );

    // Command loop, the stand-in for the network request layer
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        };
        let parts = line.split_whitespace().collect::<Vec<&str>>();

        match parts.as_slice() {
            [] => {}
            ["help"] => print_help(),
            ["call", from, to] | ["call", from, to, _] => {
                let requester = parts.get(3).map(|r| r.to_string());
                match (from.parse::<u8>(), to.parse::<u8>()) {
                    (Ok(from_floor), Ok(to_floor)) => {
                        let request = CallRequest {
                            from_floor,
                            to_floor,
                            requester,
                        };
                        match coordinator.accept_call(&request) {
                            Ok(outcome) => println!(
                                "unit {} dispatched, estimated {:.1}s",
                                outcome.unit_id, outcome.estimated_seconds
                            ),
                            Err(e) => println!("error: {}", e),
                        }
                    }
                    _ => println!("error: call takes two floor numbers"),
                }
            }
            ["status"] => match coordinator.current_states() {
                Ok(units) => {
                    for unit in units {
                        println!(
                            "unit {}: floor {} {:?} target {:?}",
                            unit.id, unit.current_floor, unit.motion_state, unit.target_floor
                        );
                    }
                }
                Err(e) => println!("error: {}", e),
            },
            ["status", id] => match id.parse::<u8>() {
                Ok(unit_id) => match coordinator.current_state(unit_id) {
                    Ok(unit) => println!(
                        "unit {}: floor {} {:?} target {:?}",
                        unit.id, unit.current_floor, unit.motion_state, unit.target_floor
                    ),
                    Err(e) => println!("error: {}", e),
                },
                Err(_) => println!("error: status takes a unit id"),
            },
            ["config"] => {
                let cfg = coordinator.get_config();
                println!(
                    "{} floors, {}s per floor, {}s per door phase, {} units",
                    cfg.total_floors, cfg.floor_move_time, cfg.door_open_close_time, cfg.n_units
                );
            }
            ["set", key, value] => {
                let mut patch = ConfigPatch::default();
                let parsed = match *key {
                    "floors" => value
                        .parse::<u8>()
                        .map(|v| patch.total_floors = Some(v))
                        .is_ok(),
                    "floor-time" => value
                        .parse::<f64>()
                        .map(|v| patch.floor_move_time = Some(v))
                        .is_ok(),
                    "door-time" => value
                        .parse::<f64>()
                        .map(|v| patch.door_open_close_time = Some(v))
                        .is_ok(),
                    _ => {
                        println!("error: unknown option {:?} (floors, floor-time, door-time)", key);
                        continue;
                    }
                };
                if !parsed {
                    println!("error: invalid value {:?} for {}", value, key);
                    continue;
                }
                match coordinator.set_config(&patch) {
                    Ok(cfg) => println!(
                        "config updated: {} floors, {}s per floor, {}s per door phase",
                        cfg.total_floors, cfg.floor_move_time, cfg.door_open_close_time
                    ),
                    Err(e) => println!("error: {}", e),
                }
            }
            ["stop"] => {
                coordinator.stop_all();
                println!("all movements stopped");
            }
            ["quit"] | ["exit"] => break,
            _ => println!("error: unknown command (type 'help')"),
        }
    }

    coordinator.shutdown();
    info!("elevator-sim shut down");
}

fn print_help() {
    println!("commands:");
    println!("  call <from> <to> [requester]   request an elevator");
    println!("  status [id]                    show unit state");
    println!("  config                         show configuration");
    println!("  set <floors|floor-time|door-time> <value>");
    println!("  stop                           stop all movements");
    println!("  quit                           exit");
}
