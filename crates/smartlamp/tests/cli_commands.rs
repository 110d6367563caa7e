#![cfg(all(unix, feature = "cli"))]

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/smartlamp-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn wait_for_socket(path: &Path, timeout: Duration) {
    let start = Instant::now();
    while !path.exists() {
        if start.elapsed() >= timeout {
            panic!("simulator socket did not appear");
        }
        thread::sleep(Duration::from_millis(25));
    }
}

struct SimulatedLamp {
    dir: PathBuf,
    sock: PathBuf,
    child: Child,
}

impl SimulatedLamp {
    fn start(tag: &str, extra: &[&str]) -> Self {
        let dir = unique_temp_dir(tag);
        let sock = dir.join("lamp.sock");
        let child = Command::new(env!("CARGO_BIN_EXE_smartlamp"))
            .arg("--log-level")
            .arg("error")
            .arg("simulate")
            .arg(&sock)
            .args(extra)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("simulate should start");
        wait_for_socket(&sock, Duration::from_secs(3));
        Self { dir, sock, child }
    }

    fn device(&self) -> String {
        format!("unix:{}", self.sock.display())
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_smartlamp"))
            .env_remove("SMARTLAMP_DEVICE")
            .arg("--log-level")
            .arg("error")
            .arg("--device")
            .arg(self.device())
            .arg("--settle")
            .arg("10ms")
            .arg("--no-prime")
            .args(args)
            .output()
            .expect("smartlamp should run")
    }
}

impl Drop for SimulatedLamp {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

#[test]
fn write_then_read_over_simulator() {
    let lamp = SimulatedLamp::start("write-read", &[]);

    let output = lamp.run(&["--format", "json", "write", "led", "75"]);
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("attribute-write.schema.json"));
    assert!(stdout.contains("\"bytes\":2"));

    let output = lamp.run(&["--format", "raw", "read", "led"]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(String::from_utf8_lossy(&output.stdout), "75\n");
}

#[test]
fn read_json_reports_value() {
    let lamp = SimulatedLamp::start("read-json", &["--led", "30"]);

    let output = lamp.run(&["--format", "json", "read", "ldr"]);
    assert!(output.status.success(), "{output:?}");
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("read should emit json");
    assert_eq!(payload["attribute"], "ldr");
    assert_eq!(payload["text"], "512\n");
    assert_eq!(payload["sentinel"], false);

    let output = lamp.run(&["--format", "pretty", "read", "led"]);
    assert_eq!(String::from_utf8_lossy(&output.stdout), "led=30\n");
}

#[test]
fn fractional_sensor_needs_raw_policy() {
    let lamp = SimulatedLamp::start("fractional", &["--fractional"]);

    let output = lamp.run(&["--format", "raw", "--sensor-format", "raw", "read", "temp"]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(String::from_utf8_lossy(&output.stdout), "24.50\n");

    let output = lamp.run(&[
        "--format",
        "raw",
        "--sensor-format",
        "integer",
        "read",
        "temp",
    ]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(String::from_utf8_lossy(&output.stdout), "-1\n");

    let output = lamp.run(&["--sensor-format", "integer", "read", "temp", "--strict"]);
    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn caller_errors_map_to_exit_codes() {
    let lamp = SimulatedLamp::start("caller-errors", &[]);

    assert_eq!(lamp.run(&["write", "led", "abc"]).status.code(), Some(60));
    assert_eq!(lamp.run(&["write", "ldr", "5"]).status.code(), Some(50));
    assert_eq!(lamp.run(&["read", "color"]).status.code(), Some(64));
}

#[test]
fn probe_reports_link() {
    let lamp = SimulatedLamp::start("probe", &[]);

    let output = Command::new(env!("CARGO_BIN_EXE_smartlamp"))
        .arg("--log-level")
        .arg("error")
        .arg("--format")
        .arg("json")
        .arg("--device")
        .arg(lamp.device())
        .arg("probe")
        .output()
        .expect("probe should run");

    assert!(output.status.success(), "{output:?}");
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("probe should emit json");
    assert_eq!(payload["transport"], "unix-socket");
    assert_eq!(payload["mtu"], 64);
    assert_eq!(payload["priming_reading"], 512);
}

#[test]
fn missing_device_is_usage_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_smartlamp"))
        .env_remove("SMARTLAMP_DEVICE")
        .arg("read")
        .arg("ldr")
        .output()
        .expect("read should run");
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn absent_socket_is_transport_error() {
    let dir = unique_temp_dir("absent");
    let output = Command::new(env!("CARGO_BIN_EXE_smartlamp"))
        .arg("--device")
        .arg(format!("unix:{}", dir.join("none.sock").display()))
        .arg("read")
        .arg("ldr")
        .output()
        .expect("read should run");
    assert_eq!(output.status.code(), Some(3));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn list_needs_no_device() {
    let output = Command::new(env!("CARGO_BIN_EXE_smartlamp"))
        .env_remove("SMARTLAMP_DEVICE")
        .arg("--format")
        .arg("json")
        .arg("list")
        .output()
        .expect("list should run");

    assert!(output.status.success());
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("list should emit json");
    let attributes = payload["attributes"].as_array().expect("attribute array");
    assert_eq!(attributes.len(), 4);
    assert_eq!(attributes[0]["name"], "led");
    assert_eq!(attributes[0]["mode"], "0664");
    assert_eq!(attributes[1]["write_command"], serde_json::Value::Null);
}

#[test]
fn version_reports_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_smartlamp"))
        .arg("version")
        .output()
        .expect("version should run");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("smartlamp {}", env!("CARGO_PKG_VERSION"))
    );
}
