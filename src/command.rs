//! Block control commands and their payload layouts.

use crate::bits::{BitAccumulator, Payload, PAYLOAD_LEN};
use crate::error::{
    BadColor, BadColorSlot, CodecError, InvalidName, OutOfRange, Result, UnknownCommand,
    WrongValueType,
};
use crate::sysex;
use crate::topology::TopologyId;

use linked_hash_map::LinkedHashMap;
use snafu::{ensure, OptionExt};
use std::fmt;
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, EnumIter, EnumString, IntoStaticStr};

const ADDRESS_BITS: u32 = 7;
const MARKER_BITS: u32 = 5;

/// Every block setting lives in this subsystem.
const BLOCK_SETTINGS: u8 = 0x10;

/// Second address byte moves up by this much for the root color slot.
const COLOR_SLOT_STEP: u8 = 0x10;
const COLOR_TERMINATOR: u32 = 0xff;
const COLOR_CHANNEL_BITS: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, AsRefStr, IntoStaticStr, EnumIter)]
pub enum Command {
    #[strum(serialize = "color")]
    Color,
    #[strum(serialize = "colorMode")]
    ColorMode,
    #[strum(serialize = "scale")]
    Scale,
    #[strum(serialize = "root")]
    Root,
    #[strum(serialize = "brightness")]
    Brightness,
    #[strum(serialize = "channel")]
    Channel,
    #[strum(serialize = "octave")]
    Octave,
    #[strum(serialize = "transpose")]
    Transpose,
    #[strum(serialize = "strikeSensitivity")]
    StrikeSensitivity,
    #[strum(serialize = "sensitivity")]
    Sensitivity,
    #[strum(serialize = "fixedVelocityEnabled")]
    FixedVelocityEnabled,
    #[strum(serialize = "fixedVelocity")]
    FixedVelocity,
    #[strum(serialize = "pressureTracking")]
    PressureTracking,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr, EnumIter)]
pub enum Scale {
    Major,
    Minor,
    #[strum(serialize = "Harmonic Minor")]
    HarmonicMinor,
    #[strum(serialize = "Pentatonic Neutral")]
    PentatonicNeutral,
    #[strum(serialize = "Pentatonic Major")]
    PentatonicMajor,
    #[strum(serialize = "Pentatonic Minor")]
    PentatonicMinor,
    Blues,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Locrian,
    #[strum(serialize = "Whole Tone")]
    WholeTone,
    #[strum(serialize = "Arabic (a)")]
    ArabicA,
    #[strum(serialize = "Arabic (b)")]
    ArabicB,
    Japanese,
    Ryukyu,
    #[strum(serialize = "8-tone Spanish")]
    EightToneSpanish,
    Chromatic,
}

impl Scale {
    /// Scales are numbered in declaration order; the index is split over two
    /// groups as `(index % 4) << 5 | 0x02` and `index / 4`.
    pub fn code(self) -> [u8; 2] {
        let index = self as u8;
        [((index % 4) << 5) | 0x02, index / 4]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr, EnumIter)]
pub enum Key {
    C,
    #[strum(serialize = "C#")]
    CSharp,
    D,
    #[strum(serialize = "D#")]
    DSharp,
    E,
    F,
    #[strum(serialize = "F#")]
    FSharp,
    G,
    #[strum(serialize = "G#")]
    GSharp,
    A,
    #[strum(serialize = "A#")]
    ASharp,
    B,
}

impl Key {
    /// Same split as `Scale::code`, tagged with `0x03`.
    pub fn code(self) -> [u8; 2] {
        let index = self as u8;
        [((index % 4) << 5) | 0x03, index / 4]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr, EnumIter)]
pub enum PressureMode {
    PolyAftertouch,
    ChannelPressure,
}

impl PressureMode {
    pub fn code(self) -> [u8; 1] {
        match self {
            PressureMode::PolyAftertouch => [0x04],
            PressureMode::ChannelPressure => [0x24],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl FromStr for Rgb {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        let digits = s.trim().trim_start_matches('#');
        match hex::decode(digits).ok().as_ref().map(Vec::as_slice) {
            Some(&[red, green, blue]) => Ok(Rgb { red, green, blue }),
            _ => BadColor { color: s }.fail(),
        }
    }
}

/// Argument to a block command.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Flag(bool),
    Name(String),
    /// Slot 0 is the primary color, slot 1 the root note color.
    Color { slot: u8, rgb: Rgb },
}

impl Value {
    fn describe(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Flag(_) => "flag",
            Value::Name(_) => "name",
            Value::Color { .. } => "color",
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Flag(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Name(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Name(v)
    }
}

impl From<(u8, Rgb)> for Value {
    fn from((slot, rgb): (u8, Rgb)) -> Self {
        Value::Color { slot, rgb }
    }
}

/// Fixed-width field packed ahead of the value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Field {
    pub value: u32,
    pub width: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Layout {
    /// Signed or unsigned integer packed LSB first, checked against bounds.
    Packed { width: u32, min: i32, max: i32 },
    Flag,
    /// Slot picks the address, then blue, green, red and a terminator byte.
    Color,
    Scale,
    Key,
    PressureTracking,
}

/// Legal values of a command, for listing.
#[derive(Debug, Clone, PartialEq)]
pub enum Bounds {
    Discrete(Vec<&'static str>),
    /// Low to high, inclusive
    Range(i32, i32),
    Color,
    Flag,
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bounds::Discrete(names) => f.write_str(&names.join("\n")),
            Bounds::Range(lo, hi) => write!(f, "[{}..{}]", lo, hi),
            Bounds::Color => f.write_str("[0|1:]#rrggbb"),
            Bounds::Flag => f.write_str("on\noff"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    pub command: Command,
    pub address: [u8; 2],
    pub marker: Option<Field>,
    pub layout: Layout,
}

lazy_static! {
    pub static ref COMMANDS: LinkedHashMap<Command, CommandSpec> = build_command_table();
}

fn marker(value: u32) -> Option<Field> {
    Some(Field {
        value,
        width: MARKER_BITS,
    })
}

fn packed(width: u32, min: i32, max: i32) -> Layout {
    Layout::Packed { width, min, max }
}

fn build_command_table() -> LinkedHashMap<Command, CommandSpec> {
    let table = vec![
        (Command::Color, 0x20, marker(0b00100), Layout::Color),
        (Command::ColorMode, 0x40, marker(0b00010), packed(2, 0, 3)),
        (Command::Scale, 0x60, None, Layout::Scale),
        (Command::Root, 0x30, None, Layout::Key),
        (Command::Brightness, 0x40, marker(0b00100), packed(7, 0, 100)),
        (Command::Channel, 0x00, marker(0b00000), packed(32, 1, 16)),
        (Command::Octave, 0x40, marker(0b00000), packed(32, -3, 4)),
        (Command::Transpose, 0x50, marker(0b00000), packed(32, -11, 11)),
        (Command::StrikeSensitivity, 0x20, marker(0b00001), packed(7, 0, 127)),
        (Command::Sensitivity, 0x50, marker(0b00001), packed(7, 0, 127)),
        (Command::FixedVelocityEnabled, 0x70, marker(0b00001), Layout::Flag),
        (Command::FixedVelocity, 0x00, marker(0b00010), packed(7, 0, 127)),
        (Command::PressureTracking, 0x00, None, Layout::PressureTracking),
    ];
    let mut map = LinkedHashMap::new();
    for (command, sub_command, marker, layout) in table {
        map.insert(
            command,
            CommandSpec {
                command,
                address: [BLOCK_SETTINGS, sub_command],
                marker,
                layout,
            },
        );
    }
    map
}

/// Resolve a command by its wire name, e.g. `colorMode`.
pub fn lookup(name: &str) -> Result<&'static CommandSpec> {
    Command::from_str(name)
        .ok()
        .and_then(|command| COMMANDS.get(&command))
        .context(UnknownCommand { name })
}

/// Build the 8-byte payload for a named command.
pub fn encode<V: Into<Value>>(name: &str, value: V) -> Result<Payload> {
    lookup(name)?.encode(&value.into())
}

/// Encode and frame a command for one block, or all of them with `TopologyId::ALL`.
pub fn encode_frame<V: Into<Value>>(topology: TopologyId, name: &str, value: V) -> Result<Vec<u8>> {
    let payload = encode(name, value)?;
    Ok(sysex::frame_command(topology, &payload))
}

impl CommandSpec {
    pub fn name(&self) -> &'static str {
        self.command.into()
    }

    pub fn bounds(&self) -> Bounds {
        match self.layout {
            Layout::Packed { min, max, .. } => Bounds::Range(min, max),
            Layout::Flag => Bounds::Flag,
            Layout::Color => Bounds::Color,
            Layout::Scale => Bounds::Discrete(Scale::iter().map(Into::into).collect()),
            Layout::Key => Bounds::Discrete(Key::iter().map(Into::into).collect()),
            Layout::PressureTracking => {
                Bounds::Discrete(PressureMode::iter().map(Into::into).collect())
            }
        }
    }

    pub fn encode(&self, value: &Value) -> Result<Payload> {
        match self.layout {
            Layout::Packed { width, min, max } => {
                let v = self.int_value(value)?;
                self.check_range(v, min, max)?;
                // negative values go out as two's complement
                self.pack(self.address[1], &[(v as u32, width)])
            }
            Layout::Flag => {
                let on = match value {
                    Value::Flag(on) => *on,
                    Value::Int(v) => {
                        self.check_range(*v, 0, 1)?;
                        *v == 1
                    }
                    other => return self.wrong_type(other),
                };
                self.pack(self.address[1], &[(on as u32, 1)])
            }
            Layout::Color => match value {
                Value::Color { slot, rgb } => {
                    ensure!(*slot <= 1, BadColorSlot { slot: *slot });
                    let address = self.address[1] + COLOR_SLOT_STEP * (slot & 1);
                    self.pack(
                        address,
                        &[
                            (u32::from(rgb.blue), COLOR_CHANNEL_BITS),
                            (u32::from(rgb.green), COLOR_CHANNEL_BITS),
                            (u32::from(rgb.red), COLOR_CHANNEL_BITS),
                            (COLOR_TERMINATOR, COLOR_CHANNEL_BITS),
                        ],
                    )
                }
                other => self.wrong_type(other),
            },
            Layout::Scale => {
                let scale: Scale = self.named(value)?;
                Ok(self.literal(&scale.code()))
            }
            Layout::Key => {
                let key: Key = self.named(value)?;
                Ok(self.literal(&key.code()))
            }
            Layout::PressureTracking => {
                let mode = match value {
                    Value::Int(v) => {
                        self.check_range(*v, 0, PressureMode::iter().count() as i32 - 1)?;
                        PressureMode::iter().nth(*v as usize)
                    }
                    _ => Some(self.named::<PressureMode>(value)?),
                };
                match mode {
                    Some(mode) => Ok(self.literal(&mode.code())),
                    None => self.wrong_type(value),
                }
            }
        }
    }

    /// Interpret command line text according to this command's layout.
    pub fn parse_value(&self, text: &str) -> Result<Value> {
        let text = text.trim();
        match self.layout {
            Layout::Packed { .. } => text.parse::<i32>().map(Value::Int).ok().context(
                WrongValueType {
                    command: self.name(),
                    expected: "integer",
                    found: "text",
                },
            ),
            Layout::Flag => match text.to_ascii_lowercase().as_str() {
                "on" | "true" | "1" => Ok(Value::Flag(true)),
                "off" | "false" | "0" => Ok(Value::Flag(false)),
                _ => WrongValueType {
                    command: self.name(),
                    expected: "on/off",
                    found: "text",
                }
                .fail(),
            },
            Layout::Color => {
                let mut parts = text.splitn(2, ':');
                match (parts.next(), parts.next()) {
                    (Some(slot), Some(color)) => {
                        let slot = slot
                            .trim()
                            .parse::<u8>()
                            .ok()
                            .context(BadColor { color: text })?;
                        Ok(Value::Color {
                            slot,
                            rgb: color.parse()?,
                        })
                    }
                    _ => Ok(Value::Color {
                        slot: 0,
                        rgb: text.parse()?,
                    }),
                }
            }
            Layout::Scale | Layout::Key => Ok(Value::Name(text.to_owned())),
            Layout::PressureTracking => Ok(text
                .parse::<i32>()
                .map(Value::Int)
                .unwrap_or_else(|_| Value::Name(text.to_owned()))),
        }
    }

    fn int_value(&self, value: &Value) -> Result<i32> {
        match value {
            Value::Int(v) => Ok(*v),
            other => self.wrong_type(other),
        }
    }

    fn named<T: FromStr>(&self, value: &Value) -> Result<T> {
        match value {
            Value::Name(name) => T::from_str(name).ok().context(InvalidName {
                command: self.name(),
                name: name.as_str(),
            }),
            other => self.wrong_type(other),
        }
    }

    fn check_range(&self, value: i32, min: i32, max: i32) -> Result<()> {
        ensure!(
            value >= min && value <= max,
            OutOfRange {
                command: self.name(),
                value: i64::from(value),
                min,
                max,
            }
        );
        Ok(())
    }

    fn wrong_type<T>(&self, value: &Value) -> Result<T> {
        WrongValueType {
            command: self.name(),
            expected: match self.layout {
                Layout::Packed { .. } => "integer",
                Layout::Flag => "flag",
                Layout::Color => "color",
                Layout::Scale | Layout::Key | Layout::PressureTracking => "name",
            },
            found: value.describe(),
        }
        .fail()
    }

    fn pack(&self, sub_command: u8, fields: &[(u32, u32)]) -> Result<Payload> {
        let mut bits = BitAccumulator::new();
        bits.append(u32::from(self.address[0]), ADDRESS_BITS)?
            .append(u32::from(sub_command), ADDRESS_BITS)?;
        if let Some(marker) = self.marker {
            bits.append(marker.value, marker.width)?;
        }
        for (value, width) in fields {
            bits.append(*value, *width)?;
        }
        Ok(bits.get())
    }

    fn literal(&self, code: &[u8]) -> Payload {
        let mut payload = [0u8; PAYLOAD_LEN];
        payload[..2].copy_from_slice(&self.address);
        payload[2..2 + code.len()].copy_from_slice(code);
        payload
    }
}
