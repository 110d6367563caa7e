#![cfg(unix)]

use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use smartlamp_frame::{Command, CommandName};
use smartlamp_session::{DeviceSession, EngineConfig, EngineError};
use smartlamp_transport::{DeviceSocket, SocketTransport, Transport};

const WAIT: Duration = Duration::from_secs(2);

fn socket_path(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "smartlamp-stale-{tag}-{}-{}.sock",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ))
}

/// Device that reads one command per script entry and answers it after
/// the given delay.
fn scripted_device(
    tag: &str,
    script: Vec<(Duration, String)>,
) -> (PathBuf, JoinHandle<Vec<String>>) {
    let path = socket_path(tag);
    let socket = DeviceSocket::bind(&path).expect("device socket should bind");
    let worker = thread::spawn(move || {
        let mut link = socket
            .accept_timeout(WAIT)
            .expect("accept should not fail")
            .expect("host should connect");
        let mut seen = Vec::new();
        for (delay, reply) in script {
            let line = link.receive(64, WAIT).expect("command should arrive");
            seen.push(String::from_utf8_lossy(&line).into_owned());
            thread::sleep(delay);
            link.send(reply.as_bytes(), WAIT).expect("reply should be sent");
        }
        seen
    });
    (path, worker)
}

fn short_budget() -> EngineConfig {
    EngineConfig {
        receive_attempts: 3,
        receive_timeout: Duration::from_millis(50),
        prime_on_attach: false,
        ..EngineConfig::immediate()
    }
}

fn get_ldr() -> Command {
    Command::new(CommandName::GetLdr)
}

#[test]
fn late_reply_never_answers_the_next_command() {
    let (path, device) = scripted_device(
        "late",
        vec![
            (Duration::from_millis(400), "RES GET_LDR 111\n".to_string()),
            (Duration::ZERO, "RES GET_LDR 222\n".to_string()),
        ],
    );
    let transport = SocketTransport::connect(&path).expect("host should connect");
    let session = DeviceSession::attach(Box::new(transport), short_budget()).unwrap();

    let err = session.execute(&get_ldr()).unwrap_err();
    assert!(matches!(
        err,
        EngineError::TransportReadExhausted { attempts: 3, .. }
    ));

    // Give the late answer time to land in the socket buffer.
    thread::sleep(Duration::from_millis(500));

    let response = session.execute(&get_ldr()).unwrap();
    assert_eq!(response.payload(), "222");

    session.detach();
    let seen = device.join().unwrap();
    assert_eq!(seen, vec!["GET_LDR\n", "GET_LDR\n"]);
}

#[test]
fn oversized_reply_is_rejected_and_link_recovers() {
    let long_reply = format!("RES GET_LDR {}\n", "9".repeat(80));
    let (path, device) = scripted_device(
        "oversized",
        vec![
            (Duration::ZERO, long_reply),
            (Duration::ZERO, "RES GET_LED 40\n".to_string()),
        ],
    );
    let transport = SocketTransport::connect(&path).expect("host should connect");
    assert_eq!(transport.endpoints().mtu, 64);
    let session = DeviceSession::attach(Box::new(transport), short_budget()).unwrap();

    let err = session.execute(&get_ldr()).unwrap_err();
    assert!(err.is_malformed_response());

    let response = session.execute(&Command::new(CommandName::GetLed)).unwrap();
    assert_eq!(response.integer().unwrap(), 40);

    session.detach();
    device.join().unwrap();
}
