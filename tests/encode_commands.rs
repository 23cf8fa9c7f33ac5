use lumi_sysex::command::{self, Command, Key, Rgb, Scale};
use lumi_sysex::{encode, CodecError, ErrorKind, Value};
use strum::IntoEnumIterator;

fn rgb(red: u8, green: u8, blue: u8) -> Rgb {
    Rgb { red, green, blue }
}

fn valid_samples() -> Vec<(&'static str, Value)> {
    let mut samples = vec![
        ("color", Value::from((0u8, rgb(0xff, 0x88, 0x00)))),
        ("color", Value::from((1u8, rgb(0x12, 0x34, 0x56)))),
        ("fixedVelocityEnabled", Value::from(true)),
        ("fixedVelocityEnabled", Value::from(false)),
        ("pressureTracking", Value::from(0)),
        ("pressureTracking", Value::from("ChannelPressure")),
    ];
    let ranges: &[(&str, i32, i32)] = &[
        ("colorMode", 0, 3),
        ("brightness", 0, 100),
        ("channel", 1, 16),
        ("octave", -3, 4),
        ("transpose", -11, 11),
        ("strikeSensitivity", 0, 127),
        ("sensitivity", 0, 127),
        ("fixedVelocity", 0, 127),
    ];
    for (name, lo, hi) in ranges {
        for v in *lo..=*hi {
            samples.push((*name, Value::from(v)));
        }
    }
    for scale in Scale::iter() {
        let name: &'static str = scale.into();
        samples.push(("scale", Value::from(name)));
    }
    for key in Key::iter() {
        let name: &'static str = key.into();
        samples.push(("root", Value::from(name)));
    }
    samples
}

#[test]
fn every_valid_value_gives_clean_payload() {
    for (name, value) in valid_samples() {
        let payload = encode(name, value.clone())
            .unwrap_or_else(|err| panic!("{} {:?}: {}", name, value, err));
        assert_eq!(payload.len(), 8);
        assert!(
            payload.iter().all(|b| *b <= 0x7f),
            "{} {:?} -> {:02x?}",
            name,
            value,
            payload
        );
        assert_eq!(payload[0], 0x10);
    }
}

#[test]
fn every_command_name_is_accepted() {
    let names: Vec<&str> = Command::iter().map(|c| c.into()).collect();
    assert_eq!(names.len(), 13);
    for (name, _) in valid_samples() {
        assert!(names.contains(&name));
    }
}

#[test]
fn color_mode() {
    assert_eq!(
        encode("colorMode", 2).unwrap(),
        [0x10, 0x40, 0x42, 0x00, 0x00, 0x00, 0x00, 0x00]
    );
}

#[test]
fn root_key() {
    assert_eq!(
        encode("root", "C#").unwrap(),
        [0x10, 0x30, 0x23, 0x00, 0x00, 0x00, 0x00, 0x00]
    );
}

#[test]
fn scale() {
    assert_eq!(
        encode("scale", "Dorian").unwrap(),
        [0x10, 0x60, 0x62, 0x01, 0x00, 0x00, 0x00, 0x00]
    );
    assert_eq!(
        encode("scale", "Harmonic Minor").unwrap(),
        [0x10, 0x60, 0x42, 0x00, 0x00, 0x00, 0x00, 0x00]
    );
}

#[test]
fn fixed_velocity_flag_toggles_one_bit() {
    let on = encode("fixedVelocityEnabled", true).unwrap();
    let off = encode("fixedVelocityEnabled", false).unwrap();
    assert_eq!(on, [0x10, 0x70, 0x21, 0x00, 0x00, 0x00, 0x00, 0x00]);
    assert_eq!(off, [0x10, 0x70, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00]);
    let differing: Vec<usize> = (0..8).filter(|i| on[*i] != off[*i]).collect();
    assert_eq!(differing, vec![2]);
    assert_eq!((on[2] ^ off[2]).count_ones(), 1);
    assert_eq!(encode("fixedVelocityEnabled", 1).unwrap(), on);
}

#[test]
fn seven_bit_settings() {
    assert_eq!(
        encode("brightness", 100).unwrap(),
        [0x10, 0x40, 0x04, 0x19, 0x00, 0x00, 0x00, 0x00]
    );
    assert_eq!(
        encode("strikeSensitivity", 64).unwrap(),
        [0x10, 0x20, 0x01, 0x10, 0x00, 0x00, 0x00, 0x00]
    );
    assert_eq!(
        encode("sensitivity", 127).unwrap(),
        [0x10, 0x50, 0x61, 0x1f, 0x00, 0x00, 0x00, 0x00]
    );
    assert_eq!(
        encode("fixedVelocity", 100).unwrap(),
        [0x10, 0x00, 0x02, 0x19, 0x00, 0x00, 0x00, 0x00]
    );
}

#[test]
fn thirty_two_bit_settings() {
    assert_eq!(
        encode("channel", 1).unwrap(),
        [0x10, 0x00, 0x20, 0x00, 0x00, 0x00, 0x00, 0x00]
    );
    assert_eq!(
        encode("channel", 16).unwrap(),
        [0x10, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00]
    );
    assert_eq!(
        encode("octave", 2).unwrap(),
        [0x10, 0x40, 0x40, 0x00, 0x00, 0x00, 0x00, 0x00]
    );
}

#[test]
fn negative_values_are_twos_complement() {
    assert_eq!(
        encode("octave", -3).unwrap(),
        [0x10, 0x40, 0x20, 0x7f, 0x7f, 0x7f, 0x7f, 0x03]
    );
    assert_eq!(
        encode("transpose", -11).unwrap(),
        [0x10, 0x50, 0x20, 0x7d, 0x7f, 0x7f, 0x7f, 0x03]
    );
}

#[test]
fn colors() {
    assert_eq!(
        encode("color", (0u8, rgb(0xff, 0x88, 0x00))).unwrap(),
        [0x10, 0x20, 0x04, 0x00, 0x44, 0x7f, 0x7f, 0x03]
    );
    assert_eq!(
        encode("color", (1u8, rgb(0x12, 0x34, 0x56))).unwrap(),
        [0x10, 0x30, 0x44, 0x15, 0x1a, 0x12, 0x7e, 0x03]
    );
}

#[test]
fn pressure_tracking_modes() {
    assert_eq!(
        encode("pressureTracking", 0).unwrap(),
        [0x10, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00]
    );
    assert_eq!(
        encode("pressureTracking", 1).unwrap(),
        [0x10, 0x00, 0x24, 0x00, 0x00, 0x00, 0x00, 0x00]
    );
    assert_eq!(
        encode("pressureTracking", "PolyAftertouch").unwrap(),
        encode("pressureTracking", 0).unwrap()
    );
}

#[test]
fn unknown_command() {
    let err = encode("volume", 3).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownCommand);
    assert_eq!(
        err,
        CodecError::UnknownCommand {
            name: "volume".to_owned()
        }
    );
    // names are case sensitive
    assert!(encode("ColorMode", 1).is_err());
}

#[test]
fn unknown_scale_and_key_are_rejected() {
    let err = encode("scale", "Hungarian").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(
        err,
        CodecError::InvalidName {
            command: "scale".to_owned(),
            name: "Hungarian".to_owned()
        }
    );
    assert_eq!(encode("root", "H").unwrap_err().kind(), ErrorKind::InvalidArgument);
    assert!(encode("root", "c#").is_err());
}

#[test]
fn out_of_range_values_are_rejected() {
    let cases: &[(&str, i32)] = &[
        ("colorMode", 4),
        ("colorMode", -1),
        ("brightness", 101),
        ("channel", 0),
        ("channel", 17),
        ("octave", -4),
        ("octave", 5),
        ("transpose", 12),
        ("transpose", -12),
        ("sensitivity", 128),
        ("strikeSensitivity", -1),
        ("fixedVelocity", 200),
        ("fixedVelocityEnabled", 2),
        ("pressureTracking", 2),
    ];
    for (name, value) in cases {
        let err = encode(name, *value).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{} {}", name, value);
        match err {
            CodecError::OutOfRange { value: v, .. } => assert_eq!(v, i64::from(*value)),
            other => panic!("{} {}: {:?}", name, value, other),
        }
    }
}

#[test]
fn bad_color_slot_is_rejected() {
    assert_eq!(
        encode("color", (2u8, rgb(1, 2, 3))).unwrap_err(),
        CodecError::BadColorSlot { slot: 2 }
    );
}

#[test]
fn mismatched_value_types_are_rejected() {
    assert!(encode("color", 3).is_err());
    assert!(encode("scale", 3).is_err());
    assert!(encode("octave", true).is_err());
    assert!(encode("fixedVelocityEnabled", "yes").is_err());
}

#[test]
fn command_line_values() {
    let spec = command::lookup("color").unwrap();
    let value = spec.parse_value("1:#123456").unwrap();
    assert_eq!(
        spec.encode(&value).unwrap(),
        encode("color", (1u8, rgb(0x12, 0x34, 0x56))).unwrap()
    );
    assert!(spec.parse_value("x:#123456").is_err());
    assert!(spec.parse_value("#12345").is_err());
}
