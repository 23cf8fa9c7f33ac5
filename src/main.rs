use structopt::StructOpt;

use lumi_sysex::command::{self, COMMANDS};
use lumi_sysex::config::Config;
use lumi_sysex::midi::{self, LumiOutput, TopologyListener};
use lumi_sysex::sysex::{self, hex_dump};
use lumi_sysex::topology::{DiscoveredTopologies, TopologyId};

use midir::MidiOutput;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(StructOpt, Debug)]
#[structopt(
    name = "lumi_sysex",
    about = "Send block settings to ROLI LUMI Keys and discover chained blocks"
)]
struct LumiSysex {
    /// YAML file overriding client name, port prefix and listen time
    #[structopt(long = "config", parse(from_os_str))]
    config: Option<PathBuf>,

    /// Name prefix of the keyboard's MIDI ports
    #[structopt(long = "port")]
    port: Option<String>,

    #[structopt(subcommand)]
    subcmd: Option<Command>,
}

#[derive(StructOpt, Debug)]
enum Command {
    #[structopt(name = "list")]
    /// List ports, commands or a command's values
    List {
        #[structopt(subcommand)]
        subcmd: Option<List>,
    },
    #[structopt(name = "encode")]
    /// Print the SysEx message for a command without sending it
    Encode {
        /// Name of the command as listed
        command_name: String,
        /// Value within the command's bounds
        value: String,
        /// Topology id of the target block, 0 for all
        #[structopt(long = "block", default_value = "0")]
        block: u8,
    },
    #[structopt(name = "set")]
    /// Send a command to the keyboard
    Set {
        /// Name of the command as listed
        command_name: String,
        /// Value within the command's bounds
        value: String,
        /// Topology id of the target block, 0 for all
        #[structopt(long = "block", default_value = "0")]
        block: u8,
    },
    #[structopt(name = "serial")]
    /// Request the serial number and print replies
    Serial,
    #[structopt(name = "discover")]
    /// Reset the topology and print the ids of announced blocks
    Discover,
}

#[derive(StructOpt, Debug)]
enum List {
    /// All MIDI output ports
    Ports,

    /// All known commands
    Commands,

    /// A single command's possible values
    Bounds {
        /// Name of the command as listed
        command_name: String,
    },
}

fn encode_message(command_name: &str, value: &str, block: u8) -> Result<Vec<u8>, Box<dyn Error>> {
    let spec = command::lookup(command_name)?;
    let payload = spec.encode(&spec.parse_value(value)?)?;
    Ok(sysex::frame_command(TopologyId::new(block)?, &payload))
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let app = LumiSysex::from_args();
    let mut config = Config::load(app.config.as_ref().map(PathBuf::as_path))?;
    if let Some(port) = app.port {
        config.port_prefix = port;
    }
    let cmd = app.subcmd.unwrap_or(Command::List { subcmd: None });

    match cmd {
        Command::List { subcmd } => match subcmd.unwrap_or(List::Ports) {
            List::Ports => {
                let midi_out = MidiOutput::new(&config.client_name)?;
                midi::output_ports(&midi_out)
                    .iter()
                    .for_each(|port| println!("{}", port.name));
            }
            List::Commands => COMMANDS.values().for_each(|spec| println!("{}", spec.name())),
            List::Bounds { command_name } => {
                let spec = command::lookup(&command_name)?;
                println!("{}", spec.bounds());
            }
        },
        Command::Encode {
            command_name,
            value,
            block,
        } => {
            let msg = encode_message(&command_name, &value, block)?;
            println!("{}", hex_dump(&sysex::wrap(&msg)));
        }
        Command::Set {
            command_name,
            value,
            block,
        } => {
            let spec = command::lookup(&command_name)?;
            let value = spec.parse_value(&value)?;
            let mut output = LumiOutput::open(&config)?;
            output.send_command(TopologyId::new(block)?, &command_name, value)?;
        }
        Command::Serial => {
            let listener = TopologyListener::open(&config, Arc::new(DiscoveredTopologies::new()))?;
            LumiOutput::open(&config)?.request_serial()?;
            for reply in listener.close_wait(config.listen_millis).replies {
                println!("{}", hex_dump(&reply));
            }
        }
        Command::Discover => {
            let topologies = Arc::new(DiscoveredTopologies::new());
            let listener = TopologyListener::open(&config, Arc::clone(&topologies))?;
            LumiOutput::open(&config)?.reset_topology()?;
            listener.close_wait(config.listen_millis);
            topologies
                .snapshot()
                .iter()
                .filter(|id| !id.is_broadcast())
                .for_each(|id| println!("{}", id));
        }
    }

    Ok(())
}
