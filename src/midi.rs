//! MIDI transport over midir: locating LUMI ports, sending framed commands
//! and collecting block announcements.

use crate::command::{self, Value};
use crate::config::Config;
use crate::error::CodecError;
use crate::sysex::{self, hex_dump};
use crate::topology::{DiscoveredTopologies, TopologyId};

use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use snafu::{OptionExt, ResultExt, Snafu};

use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

pub type Result<T> = ::std::result::Result<T, MidiError>;

#[derive(Debug, Snafu)]
pub enum MidiError {
    #[snafu(display("MIDI client initialization failed: {}", reason))]
    MidiInit { reason: String },

    #[snafu(display("No output port matching '{}'", port_name))]
    NoOutputPort { port_name: String },

    #[snafu(display("No input port matching '{}'", port_name))]
    NoInputPort { port_name: String },

    #[snafu(display("Could not connect to '{}': {}", port_name, reason))]
    Connect { port_name: String, reason: String },

    #[snafu(display("Send failed: {}", reason))]
    SendFailed { reason: String },

    #[snafu(display("{}", source))]
    Codec { source: CodecError },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MidiPort {
    pub number: usize,
    pub name: String,
}

pub fn output_ports(midi_client: &MidiOutput) -> Vec<MidiPort> {
    (0..midi_client.port_count())
        .filter_map(|number| {
            midi_client
                .port_name(number)
                .ok()
                .map(|name| MidiPort { number, name })
        })
        .collect()
}

pub fn input_ports(midi_client: &MidiInput) -> Vec<MidiPort> {
    (0..midi_client.port_count())
        .filter_map(|number| {
            midi_client
                .port_name(number)
                .ok()
                .map(|name| MidiPort { number, name })
        })
        .collect()
}

/// First port whose name starts with `prefix`.
pub fn find_port(ports: Vec<MidiPort>, prefix: &str) -> Option<MidiPort> {
    ports.into_iter().find(|port| port.name.starts_with(prefix))
}

/// Output side of a LUMI connection.
///
/// Without a connection every send is dropped with a warning, matching the
/// behavior of a front end with no device selected.
#[derive(Default)]
pub struct LumiOutput {
    connection: Option<MidiOutputConnection>,
    port_name: Option<String>,
}

impl LumiOutput {
    pub fn open(config: &Config) -> Result<Self> {
        let midi_client = MidiOutput::new(&config.client_name).map_err(|err| MidiError::MidiInit {
            reason: err.to_string(),
        })?;
        let port = find_port(output_ports(&midi_client), &config.port_prefix).context(
            NoOutputPort {
                port_name: config.port_prefix.as_str(),
            },
        )?;
        let connection = midi_client
            .connect(port.number, &port.name)
            .map_err(|err| MidiError::Connect {
                port_name: port.name.clone(),
                reason: err.to_string(),
            })?;
        log::info!("connected to output '{}'", port.name);
        Ok(LumiOutput {
            connection: Some(connection),
            port_name: Some(port.name),
        })
    }

    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_ref().map(String::as_str)
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn send_command<V: Into<Value>>(
        &mut self,
        topology: TopologyId,
        name: &str,
        value: V,
    ) -> Result<()> {
        let body = command::encode_frame(topology, name, value).context(Codec)?;
        self.send(&body)
    }

    pub fn request_serial(&mut self) -> Result<()> {
        self.send(&sysex::frame_serial_request())
    }

    pub fn reset_topology(&mut self) -> Result<()> {
        self.send(&sysex::frame_topology_reset())
    }

    fn send(&mut self, body: &[u8]) -> Result<()> {
        match self.connection.as_mut() {
            None => {
                log::warn!("no output selected, dropping {}", hex_dump(body));
                Ok(())
            }
            Some(connection) => {
                log::debug!("OUT: {}", hex_dump(body));
                connection
                    .send(&sysex::wrap(body))
                    .map_err(|err| MidiError::SendFailed {
                        reason: err.to_string(),
                    })
            }
        }
    }
}

/// State carried by the input callback.
#[derive(Debug)]
pub struct Inbox {
    pub topologies: Arc<DiscoveredTopologies>,
    /// ROLI bodies that were not block announcements, e.g. serial replies.
    pub replies: Vec<Vec<u8>>,
}

impl Inbox {
    pub fn new(topologies: Arc<DiscoveredTopologies>) -> Self {
        Inbox {
            topologies,
            replies: Vec::new(),
        }
    }
}

/// Route one raw inbound message.
pub fn receive(message: &[u8], inbox: &mut Inbox) {
    match sysex::unwrap(message) {
        Some(body) => {
            log::debug!("IN : {}", hex_dump(body));
            if inbox.topologies.observe(body).is_none() {
                inbox.replies.push(body.to_vec());
            }
        }
        None => log::trace!("ignoring {}", hex_dump(message)),
    }
}

/// Input side of a LUMI connection, feeding a shared topology set.
pub struct TopologyListener(MidiInputConnection<Inbox>);

impl TopologyListener {
    pub fn open(config: &Config, topologies: Arc<DiscoveredTopologies>) -> Result<Self> {
        let mut midi_in = MidiInput::new(&config.client_name).map_err(|err| MidiError::MidiInit {
            reason: err.to_string(),
        })?;
        midi_in.ignore(Ignore::None);
        let port = find_port(input_ports(&midi_in), &config.port_prefix).context(
            NoInputPort {
                port_name: config.port_prefix.as_str(),
            },
        )?;
        let port_name = port.name.clone();
        let connection = midi_in
            .connect(
                port.number,
                "Block announcements",
                |_ts, message, inbox| receive(message, inbox),
                Inbox::new(topologies),
            )
            .map_err(|err| MidiError::Connect {
                port_name: port_name.clone(),
                reason: err.to_string(),
            })?;
        log::info!("listening on input '{}'", port_name);
        Ok(TopologyListener(connection))
    }

    /// Keep listening for `wait_millis`, then hand back what arrived.
    pub fn close_wait(self, wait_millis: u64) -> Inbox {
        sleep(Duration::from_millis(wait_millis));
        self.0.close().1
    }
}
