#![cfg(unix)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use smartlamp::attr::{AttrError, RegistryConfig, SensorFormat};
use smartlamp::session::EngineConfig;
use smartlamp::sim::{serve, LampFirmware};
use smartlamp::transport::{DeviceSocket, SocketTransport};
use smartlamp::{DeviceHost, HostState};

struct Simulator {
    path: PathBuf,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<LampFirmware>>,
}

impl Simulator {
    fn start(tag: &str, firmware: LampFirmware) -> Self {
        let path = PathBuf::from(format!(
            "/tmp/smartlamp-sim-{tag}-{}-{}.sock",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        let socket = DeviceSocket::bind(&path).expect("simulator should bind");
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let worker = thread::spawn(move || {
            serve(&socket, firmware, &flag).expect("simulator should serve")
        });
        Self {
            path,
            running,
            worker: Some(worker),
        }
    }

    fn connect(&self) -> SocketTransport {
        SocketTransport::connect(&self.path).expect("simulator should accept")
    }

    fn stop(mut self) -> LampFirmware {
        self.running.store(false, Ordering::SeqCst);
        self.worker
            .take()
            .expect("worker present")
            .join()
            .expect("simulator thread should not panic")
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn fast_engine() -> EngineConfig {
    EngineConfig {
        settle_delay: Duration::from_millis(5),
        retry_backoff: Duration::from_millis(5),
        prime_delay: Duration::ZERO,
        ..EngineConfig::default()
    }
}

#[test]
fn attach_read_write_detach() {
    let sim = Simulator::start("lifecycle", LampFirmware::new());
    let host = DeviceHost::new(
        fast_engine(),
        RegistryConfig::default().with_sensor_format(SensorFormat::Integer),
    );

    let surface = host.on_attach(Box::new(sim.connect())).unwrap();
    let session = host.session().unwrap();
    assert_eq!(session.priming_reading(), Some(512));
    assert_eq!(session.transport_name(), "unix-socket");

    assert_eq!(surface.store("led", "75\n").unwrap(), 3);
    assert_eq!(surface.show("led").unwrap(), "75\n");
    assert_eq!(surface.show("ldr").unwrap(), "512\n");
    assert_eq!(surface.show("temp").unwrap(), "24\n");
    assert_eq!(surface.collapsed_reads(), 0);

    assert!(host.on_detach());
    assert_eq!(host.state(), HostState::Detached);
    assert!(matches!(surface.show("led"), Err(AttrError::DeviceDetached)));

    let firmware = sim.stop();
    assert_eq!(firmware.led(), 75);
}

#[test]
fn raw_text_policy_forwards_device_text() {
    let sim = Simulator::start("rawtext", LampFirmware::new().with_fractional(true));
    let host = DeviceHost::new(
        fast_engine(),
        RegistryConfig::default().with_sensor_format(SensorFormat::RawText),
    );

    let surface = host.on_attach(Box::new(sim.connect())).unwrap();
    assert_eq!(surface.show("temp").unwrap(), "24.50\n");
    assert_eq!(surface.show("hum").unwrap(), "58.25\n");
}

#[test]
fn integer_policy_collapses_fractional_reply() {
    let sim = Simulator::start("collapse", LampFirmware::new().with_fractional(true));
    let host = DeviceHost::new(
        fast_engine(),
        RegistryConfig::default().with_sensor_format(SensorFormat::Integer),
    );

    let surface = host.on_attach(Box::new(sim.connect())).unwrap();
    assert_eq!(surface.show("hum").unwrap(), "-1\n");
    assert_eq!(surface.collapsed_reads(), 1);
    assert!(surface.last_failure().is_some());
}

#[test]
fn out_of_range_write_is_accepted_by_host() {
    let sim = Simulator::start("range", LampFirmware::new().with_led(20));
    let host = DeviceHost::new(fast_engine(), RegistryConfig::default());

    let surface = host.on_attach(Box::new(sim.connect())).unwrap();
    surface.store("led", "150").unwrap();
    assert_eq!(surface.show("led").unwrap(), "20\n");
}

#[test]
fn concurrent_readers_share_one_link() {
    let sim = Simulator::start("concurrent", LampFirmware::new());
    let host = DeviceHost::new(
        fast_engine(),
        RegistryConfig::default().with_sensor_format(SensorFormat::Integer),
    );
    let surface = host.on_attach(Box::new(sim.connect())).unwrap();

    let workers: Vec<_> = ["ldr", "temp", "hum", "led"]
        .into_iter()
        .map(|name| {
            let surface = Arc::clone(&surface);
            thread::spawn(move || {
                (0..5)
                    .map(|_| surface.show(name).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let expected = ["512\n", "24\n", "58\n", "0\n"];
    for (worker, expected) in workers.into_iter().zip(expected) {
        let readings = worker.join().unwrap();
        assert!(readings.iter().all(|r| r == expected), "{readings:?}");
    }
    assert_eq!(surface.collapsed_reads(), 0);
}
