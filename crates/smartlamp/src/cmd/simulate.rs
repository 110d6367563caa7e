use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use smartlamp::sim::{serve, LampFirmware};
use smartlamp_transport::DeviceSocket;
use tracing::info;

use crate::cmd::SimulateArgs;
use crate::exit::{transport_error, CliError, CliResult, INTERNAL, SUCCESS};

pub fn run(args: SimulateArgs) -> CliResult<i32> {
    let socket =
        DeviceSocket::bind(&args.path).map_err(|err| transport_error("bind failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let firmware = LampFirmware::new()
        .with_fractional(args.fractional)
        .with_led(args.led);
    let firmware =
        serve(&socket, firmware, &running).map_err(|err| transport_error("serve failed", err))?;
    info!(led = firmware.led(), "simulated lamp stopped");

    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
