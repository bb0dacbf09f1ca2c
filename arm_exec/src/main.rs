//! Main arm control executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logger and modules
//!     - Main loop:
//!         - Actuator sensing from the simulated world
//!         - Telecommand processing from the timed script
//!         - Arm control processing
//!         - Demand application and world stepping
//!         - Display refresh on the 1 Hz sub-cycle
//!
//! # Modules
//!
//! All cyclic modules (e.g. `arm_ctrl`) shall provide a public struct
//! implementing the `util::module::State` trait.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use arm_lib::{
    arm_ctrl::{ArmCtrlInit, Params},
    data_store::DataStore,
    tc_processor, CYCLE_FREQUENCY_HZ, CYCLE_PERIOD_S,
};
use world_if::sim::{SimScene, SimWorld};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{info, warn};
use std::env;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Parameter file for the arm control module.
const ARM_CTRL_PARAMS_FILE: &str = "arm_ctrl.toml";

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("arm_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution
    info!("Arm Control Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let params: Params = util::params::load(ARM_CTRL_PARAMS_FILE)
        .wrap_err("Could not load arm_ctrl params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE TC SOURCE ----

    // Commands come from a timed script given as the single CLI argument
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        return Err(eyre!(
            "Expected the path to a command script as the only argument, \
            found {} argument(s)",
            args.len() - 1
        ));
    }

    info!("Loading script from \"{}\"", &args[1]);

    let mut script = ScriptInterpreter::new(&args[1]).wrap_err("Failed to load script")?;

    info!(
        "Loaded script lasts {:.02} s and contains {} TCs\n",
        script.get_duration(),
        script.get_num_tcs()
    );

    // ---- INITIALISE WORLD ----

    let scene: SimScene = util::params::load(&params.scene_file)
        .wrap_err("Could not load the scene")?;

    let mut world = SimWorld::new(scene);

    let scan = world.scan();
    info!(
        "Scanned arm \"{}\": {} actuator(s) found",
        scan.tag,
        scan.actuators.len()
    );

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    ds.arm_ctrl
        .init(
            ArmCtrlInit {
                params_file: ARM_CTRL_PARAMS_FILE,
                scan,
            },
            &session,
        )
        .wrap_err("Failed to initialise ArmCtrl")?;
    info!("ArmCtrl init complete");

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(CYCLE_FREQUENCY_HZ);

        // ---- DATA INPUT ----

        ds.arm_sense = world.sense();

        // ---- TELECOMMAND PROCESSING ----

        match script.get_pending_tcs() {
            PendingTcs::None => (),
            PendingTcs::Some(tc_vec) => {
                for tc in tc_vec.iter() {
                    tc_processor::exec(&mut ds, tc);
                }
            }
            // Exit if end of script reached
            PendingTcs::EndOfScript => {
                info!("End of TC script reached, stopping");
                break;
            }
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        let arm_ctrl_input = arm_lib::arm_ctrl::InputData {
            axes: ds.operator_input,
            sense: ds.arm_sense.clone(),
        };

        match ds.arm_ctrl.proc(&arm_ctrl_input) {
            Ok((o, r)) => {
                ds.arm_ctrl_output = o;
                ds.arm_ctrl_status_rpt = r;
            }
            Err(e) => {
                // ArmCtrl errors usually just mean a bad TC, so just issue
                // the warning and continue
                warn!("Error during ArmCtrl processing: {}", e)
            }
        };

        // ---- WORLD UPDATE ----

        world.apply(&ds.arm_ctrl_output);
        world.step(CYCLE_PERIOD_S);

        // ---- DISPLAY REFRESH ----

        if ds.is_1_hz_cycle {
            let text = ds.arm_ctrl.display_text(&ds.arm_sense);
            info!("{}", text);
            world.set_display(text);
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    info!("End of execution");

    Ok(())
}
