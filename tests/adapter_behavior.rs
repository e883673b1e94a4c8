//! Behavioral tests for the compatibility adapter over the mock transport.
//!
//! These exercise the adapter contract end to end: validation before
//! hardware, full reconfiguration on every change, settings snapshot and
//! restore, the close/reopen cycle on port changes, and line-state
//! forwarding.

use std::time::Duration;

use pretty_assertions::assert_eq;

use ftdi_serial::{
    ControlLine, DataBits, FtdiSerial, MockOpener, MockTransport, Parity, SerialConfig,
    SerialError, StatusLine, StopBits,
};

fn open_mock() -> (FtdiSerial, MockTransport, MockOpener) {
    let mock = MockTransport::new("MOCK0");
    let opener = MockOpener::new(mock.clone());
    let serial = FtdiSerial::open_with(
        Box::new(opener.clone()),
        Some("MOCK0"),
        SerialConfig::default(),
    )
    .expect("mock open");
    (serial, mock, opener)
}

#[test]
fn default_settings_snapshot() {
    let (serial, _mock, _opener) = open_mock();
    let json = serde_json::to_value(serial.settings()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "baudrate": 9600,
            "bytesize": 8,
            "parity": "N",
            "stopbits": 1,
            "xonxoff": false,
            "dsrdtr": false,
            "rtscts": false,
            "timeout": null,
            "writeTimeout": null,
            "interCharTimeout": null,
        })
    );
}

#[test]
fn invalid_baud_rate_leaves_previous_value() {
    let (mut serial, _mock, _opener) = open_mock();
    serial.set_baudrate(115_200).unwrap();
    assert_eq!(serial.baudrate(), 115_200);

    let result = serial.set_baudrate(0);
    assert!(matches!(result, Err(SerialError::InvalidConfiguration(_))));
    assert_eq!(serial.baudrate(), 115_200);
}

#[test]
fn invalid_configuration_never_touches_hardware() {
    let mock = MockTransport::new("MOCK0");
    let opener = MockOpener::new(mock.clone());
    let config = SerialConfig {
        baud_rate: 0,
        ..Default::default()
    };

    let result = FtdiSerial::open_with(Box::new(opener.clone()), Some("MOCK0"), config);
    assert!(matches!(result, Err(SerialError::InvalidConfiguration(_))));
    assert!(opener.open_log().is_empty(), "opener must not be reached");
    assert_eq!(mock.reconfigure_count(), 0);
}

#[test]
fn open_failure_propagates_unchanged() {
    let mock = MockTransport::new("MOCK0");
    let opener = MockOpener::new(mock.clone());
    opener.fail_next_open("device already claimed");

    let result = FtdiSerial::open_with(Box::new(opener), Some("MOCK0"), SerialConfig::default());
    match result {
        Err(SerialError::PortOpen(message)) => assert_eq!(message, "device already claimed"),
        other => panic!("expected PortOpen, got {other:?}"),
    }
}

#[test]
fn each_change_pushes_the_full_configuration_exactly_once() {
    let (mut serial, mock, _opener) = open_mock();
    let baseline = mock.reconfigure_count();

    serial.set_baudrate(115_200).unwrap();
    assert_eq!(mock.reconfigure_count(), baseline + 1);
    assert_eq!(mock.last_config().unwrap().baud_rate, 115_200);

    serial.set_parity(Parity::Even).unwrap();
    assert_eq!(mock.reconfigure_count(), baseline + 2);
    let pushed = mock.last_config().unwrap();
    // The push carries the whole configuration, not just the changed field.
    assert_eq!(pushed.baud_rate, 115_200);
    assert_eq!(pushed.parity, Parity::Even);

    serial.set_stopbits(StopBits::Two).unwrap();
    serial.set_bytesize(DataBits::Seven).unwrap();
    serial.set_timeout(Some(Duration::from_millis(500))).unwrap();
    serial.set_xonxoff(true).unwrap();
    assert_eq!(mock.reconfigure_count(), baseline + 6);
}

#[test]
fn dsrdtr_follows_rtscts_until_overridden() {
    let (mut serial, _mock, _opener) = open_mock();
    assert!(!serial.dsrdtr());

    serial.set_rtscts(true).unwrap();
    serial.set_dsrdtr(None).unwrap();
    assert!(serial.dsrdtr(), "unset dsrdtr follows rtscts");

    serial.set_dsrdtr(Some(false)).unwrap();
    assert!(!serial.dsrdtr(), "explicit value stops following");
    serial.set_rtscts(false).unwrap();
    serial.set_rtscts(true).unwrap();
    assert!(!serial.dsrdtr(), "explicit value survives rtscts changes");
}

#[test]
fn settings_roundtrip_is_a_no_op() {
    let (mut serial, mock, _opener) = open_mock();
    serial.set_baudrate(57_600).unwrap();
    serial.set_parity(Parity::Odd).unwrap();

    let snapshot = serial.settings();
    let pushes_before = mock.reconfigure_count();

    serial.apply_settings(&snapshot).unwrap();
    assert_eq!(serial.settings(), snapshot);
    assert_eq!(
        mock.reconfigure_count(),
        pushes_before,
        "identical snapshot must not touch the transport"
    );
}

#[test]
fn settings_restore_goes_through_validating_setters() {
    let (mut serial, mock, _opener) = open_mock();
    let snapshot = serial.settings();

    serial.set_baudrate(230_400).unwrap();
    serial.set_stopbits(StopBits::Two).unwrap();
    serial.set_timeout(Some(Duration::from_secs(2))).unwrap();

    serial.apply_settings(&snapshot).unwrap();
    assert_eq!(serial.baudrate(), 9600);
    assert_eq!(serial.stopbits(), StopBits::One);
    assert_eq!(serial.timeout(), None);
    assert_eq!(mock.last_config().unwrap(), SerialConfig::default());
}

#[test]
fn settings_restore_pins_dsrdtr_out_of_follow_mode() {
    let (mut serial, _mock, _opener) = open_mock();
    serial.set_dsrdtr(Some(true)).unwrap();
    let snapshot = serial.settings();
    assert!(snapshot.dsrdtr);
    assert!(!snapshot.rtscts);

    // Leave the adapter in follow mode where dsrdtr tracks rtscts.
    serial.set_dsrdtr(None).unwrap();
    serial.set_rtscts(true).unwrap();
    assert!(serial.dsrdtr());

    serial.apply_settings(&snapshot).unwrap();
    assert!(!serial.rtscts());
    assert!(serial.dsrdtr(), "restore must reproduce the snapshot");
    assert_eq!(serial.settings(), snapshot);
}

#[test]
fn restored_snapshot_rejects_bad_timeouts() {
    let (mut serial, _mock, _opener) = open_mock();
    let mut snapshot = serial.settings();
    snapshot.timeout = Some(-1.0);

    let result = serial.apply_settings(&snapshot);
    assert!(matches!(result, Err(SerialError::InvalidConfiguration(_))));
    assert_eq!(serial.timeout(), None, "failed apply leaves field untouched");
}

#[test]
fn set_port_while_open_closes_and_reopens() {
    let (mut serial, _mock, opener) = open_mock();
    assert_eq!(serial.name(), "MOCK0");

    serial.set_port(Some("MOCK1")).unwrap();
    assert!(serial.is_open());
    assert_eq!(serial.name(), "MOCK1");
    assert_eq!(
        opener.open_log(),
        vec![Some("MOCK0".to_owned()), Some("MOCK1".to_owned())]
    );
}

#[test]
fn set_port_while_closed_does_not_open() {
    let (mut serial, _mock, opener) = open_mock();
    serial.close();

    serial.set_port(Some("MOCK1")).unwrap();
    assert!(!serial.is_open());
    assert_eq!(opener.open_log().len(), 1, "only the constructor opened");
}

#[test]
fn read_write_and_flush_forward_to_the_transport() {
    let (mut serial, mut mock, _opener) = open_mock();
    mock.enqueue_read(b"hello");

    let mut buffer = [0u8; 16];
    let n = serial.read(&mut buffer).unwrap();
    assert_eq!(&buffer[..n], b"hello");

    let written = serial.write(b"world").unwrap();
    assert_eq!(written, 5);
    serial.flush().unwrap();
    assert_eq!(mock.write_log(), vec![b"world".to_vec()]);
    assert_eq!(mock.flush_count(), 1);

    mock.enqueue_read(b"stale");
    serial.flush_input().unwrap();
    serial.flush_output().unwrap();
    assert!(mock.input_discarded());
    assert!(mock.output_discarded());
    assert_eq!(serial.in_waiting(), Some(0));
}

#[test]
fn line_states_forward_both_directions() {
    let (mut serial, mut mock, _opener) = open_mock();

    serial.set_rts(true).unwrap();
    serial.set_dtr(false).unwrap();
    assert_eq!(mock.control_line(ControlLine::Rts), Some(true));
    assert_eq!(mock.control_line(ControlLine::Dtr), Some(false));

    mock.set_status_line(StatusLine::Cts, true);
    mock.set_status_line(StatusLine::Ri, true);
    assert!(serial.cts().unwrap());
    assert!(!serial.dsr().unwrap());
    assert!(serial.ri().unwrap());
    assert!(!serial.cd());
}

#[test]
fn settings_snapshot_survives_json() {
    let (mut serial, _mock, _opener) = open_mock();
    serial.set_baudrate(19_200).unwrap();
    serial.set_parity(Parity::Mark).unwrap();
    serial.set_stopbits(StopBits::OnePointFive).unwrap();

    let json = serde_json::to_string(&serial.settings()).unwrap();
    let restored = serde_json::from_str(&json).unwrap();
    serial.apply_settings(&restored).unwrap();
    assert_eq!(serial.settings(), restored);
}
