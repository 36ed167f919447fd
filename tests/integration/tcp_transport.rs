//! Integration tests: simulator served over TCP

use crate::common::two_row_dataset;
use imu_simulator::{
    serve, AccelData, ClientError, CommandRouter, FatalError, I2cInterface, ImuDriver,
    RequestChannel, ServeError, SimulatedI2c, SimulatorConfig, SystemClock, TcpChannel,
    TcpTransport,
};
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const FAST_ODR: Duration = Duration::from_millis(5);

/// Start a simulator on an ephemeral port
fn spawn_simulator() -> (SocketAddr, JoinHandle<Result<(), ServeError>>) {
    let config = SimulatorConfig {
        endpoint: "127.0.0.1:0".to_owned(),
        output_data_rate: FAST_ODR,
        ..SimulatorConfig::default()
    };
    let mut transport = TcpTransport::bind(config.endpoint.as_str()).unwrap();
    let address = transport.local_addr().unwrap();

    let handle = thread::spawn(move || {
        let mut router = CommandRouter::from_config(&config, two_row_dataset(), SystemClock);
        serve(&mut transport, &mut router)
    });
    (address, handle)
}

#[test]
fn test_register_access_over_tcp() {
    let (address, _server) = spawn_simulator();
    let mut bus = SimulatedI2c::new(TcpChannel::connect(address).unwrap());

    assert_eq!(bus.read_byte(0x21).unwrap(), 0x06);
    bus.write_byte(0x21, 0x42).unwrap();
    assert_eq!(bus.read_byte(0x21).unwrap(), 0x42);
    assert_eq!(bus.read_byte(0x7E).unwrap(), 0xAB);
}

#[test]
fn test_driver_over_tcp() {
    let (address, _server) = spawn_simulator();
    let bus = SimulatedI2c::new(TcpChannel::connect(address).unwrap());
    let mut driver = ImuDriver::new(I2cInterface::new(bus));

    driver.enable_accelerometer().unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut samples = Vec::new();
    while samples.len() < 3 {
        assert!(Instant::now() < deadline, "no data ready within 5 s");
        if driver.data_ready().unwrap() {
            samples.push(driver.read_accel().unwrap());
        } else {
            thread::sleep(Duration::from_millis(1));
        }
    }

    let row_1 = AccelData {
        x: 16384,
        y: -16384,
        z: 8192,
    };
    let row_2 = AccelData {
        x: 4096,
        y: 0,
        z: -8192,
    };
    assert_eq!(samples, [row_1, row_2, row_1]);
}

#[test]
fn test_nul_terminated_requests() {
    let (address, _server) = spawn_simulator();
    let mut stream = TcpStream::connect(address).unwrap();

    // C clients send the terminating NUL of their string buffer
    stream.write_all(b"READ_BYTE 0x21\0").unwrap();
    stream.write_all(b"START 0x7f WRITE\0").unwrap();

    let mut reader = BufReader::new(stream);
    let mut reply = String::new();
    reader.read_line(&mut reply).unwrap();
    assert_eq!(reply, "0x06\n");
    reply.clear();
    reader.read_line(&mut reply).unwrap();
    assert_eq!(reply, "ACK\n");
}

#[test]
fn test_next_client_after_disconnect() {
    let (address, _server) = spawn_simulator();

    {
        let mut first = TcpChannel::connect(address).unwrap();
        assert_eq!(first.request("WRITE_BYTE 0x21 0x07").unwrap(), "SUCCESS");
        assert_eq!(first.request("START 0x7f WRITE").unwrap(), "ACK");
    }

    // Register state outlives the connection, the bus session does not
    let mut second = TcpChannel::connect(address).unwrap();
    assert_eq!(second.request("READ_BYTE 0x21").unwrap(), "0x07");
    assert!(second
        .request("0x21")
        .unwrap()
        .starts_with("ERROR: Unexpected"));
    assert_eq!(second.request("START 0x7f WRITE").unwrap(), "ACK");
}

#[test]
fn test_fatal_error_stops_server() {
    let (address, server) = spawn_simulator();
    let mut channel = TcpChannel::connect(address).unwrap();

    let reply = channel.request("WRITE_BYTE 0x1f 0x01").unwrap();
    assert!(reply.starts_with("ERROR: Fatal: "), "{reply}");

    assert!(matches!(
        server.join().unwrap(),
        Err(ServeError::Fatal(FatalError::UnsupportedAccelMode(0x01)))
    ));
    assert!(matches!(
        channel.request("READ_BYTE 0x21"),
        Err(ClientError::Io(_))
    ));
}
