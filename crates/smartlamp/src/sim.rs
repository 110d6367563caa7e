//! Device-side simulation of the lamp firmware.
//!
//! [`LampFirmware`] answers the line protocol the way the microcontroller
//! does; [`serve`] runs it behind a [`DeviceSocket`] so the host side can
//! be exercised end to end without hardware.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use smartlamp_frame::{CommandName, MAX_LINE_LEN};
use smartlamp_transport::{DeviceSocket, Transport, TransportError};
use tracing::{debug, info};

/// Reply to a line the firmware does not understand.
pub const UNKNOWN_COMMAND_REPLY: &str = "ERR Unknown command.\n";

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const REPLY_TIMEOUT: Duration = Duration::from_millis(1000);

/// State and readings of a simulated lamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LampFirmware {
    led: i32,
    ldr: i32,
    temp_centi: i32,
    hum_centi: i32,
    fractional: bool,
}

impl Default for LampFirmware {
    fn default() -> Self {
        Self {
            led: 0,
            ldr: 512,
            temp_centi: 2450,
            hum_centi: 5825,
            fractional: false,
        }
    }
}

impl LampFirmware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report temperature and humidity with two decimals.
    pub fn with_fractional(mut self, fractional: bool) -> Self {
        self.fractional = fractional;
        self
    }

    pub fn with_led(mut self, led: i32) -> Self {
        self.led = led;
        self
    }

    /// Set the sensor readings; temperature and humidity in hundredths.
    pub fn with_readings(mut self, ldr: i32, temp_centi: i32, hum_centi: i32) -> Self {
        self.ldr = ldr;
        self.temp_centi = temp_centi;
        self.hum_centi = hum_centi;
        self
    }

    pub fn led(&self) -> i32 {
        self.led
    }

    /// Handle one command line and return the reply line.
    pub fn handle_line(&mut self, line: &str) -> String {
        let line = line.trim_end_matches(['\n', '\r']);
        let (name, argument) = match line.split_once(' ') {
            Some((name, argument)) => (name, Some(argument)),
            None => (line, None),
        };
        let Ok(command) = name.parse::<CommandName>() else {
            return UNKNOWN_COMMAND_REPLY.to_string();
        };

        let payload = match (command, argument) {
            (CommandName::GetLdr, None) => self.ldr.to_string(),
            (CommandName::GetLed, None) => self.led.to_string(),
            (CommandName::SetLed, Some(argument)) => match argument.trim().parse::<i32>() {
                Ok(level) if (0..=100).contains(&level) => {
                    self.led = level;
                    "1".to_string()
                }
                _ => "-1".to_string(),
            },
            (CommandName::GetTemp, None) => self.sensor(self.temp_centi),
            (CommandName::GetHum, None) => self.sensor(self.hum_centi),
            _ => return UNKNOWN_COMMAND_REPLY.to_string(),
        };
        format!("RES {command} {payload}\n")
    }

    fn sensor(&self, centi: i32) -> String {
        if self.fractional {
            let sign = if centi < 0 { "-" } else { "" };
            let abs = centi.unsigned_abs();
            format!("{sign}{}.{:02}", abs / 100, abs % 100)
        } else {
            (centi / 100).to_string()
        }
    }
}

/// Answer commands on accepted connections until `running` is cleared.
///
/// Connections are served one at a time; a closed connection goes back
/// to accepting.
pub fn serve(
    socket: &DeviceSocket,
    mut firmware: LampFirmware,
    running: &AtomicBool,
) -> smartlamp_transport::Result<LampFirmware> {
    info!(path = %socket.path().display(), "simulated lamp listening");
    while running.load(Ordering::SeqCst) {
        let Some(mut link) = socket.accept_timeout(POLL_INTERVAL)? else {
            continue;
        };
        debug!(peer = link.peer(), "host connected");
        serve_link(&mut link, &mut firmware, running)?;
        link.close();
    }
    Ok(firmware)
}

fn serve_link(
    link: &mut dyn Transport,
    firmware: &mut LampFirmware,
    running: &AtomicBool,
) -> smartlamp_transport::Result<()> {
    while running.load(Ordering::SeqCst) {
        let line = match link.receive(MAX_LINE_LEN, POLL_INTERVAL) {
            Ok(line) => line,
            Err(TransportError::Timeout(_)) => continue,
            Err(TransportError::Disconnected | TransportError::Closed) => {
                debug!("host disconnected");
                return Ok(());
            }
            Err(err) => return Err(err),
        };
        let text = String::from_utf8_lossy(&line);
        let reply = firmware.handle_line(&text);
        debug!(command = text.trim_end(), reply = reply.trim_end(), "handled");
        match link.send(reply.as_bytes(), REPLY_TIMEOUT) {
            Ok(_) => {}
            Err(TransportError::Disconnected | TransportError::Closed) => return Ok(()),
            Err(err) => return Err(err),
        }
    }
    Ok(())
}
