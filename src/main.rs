use std::error::Error;
use std::net::{SocketAddrV4, UdpSocket};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::thread;

use jdw_osc_lib::osc_stack::OSCStack;
use ringbuf::traits::{Producer, Split};
use ringbuf::HeapRb;

use crate::config::Config;
use crate::feedback::{Feedback, OscFeedback, SilentFeedback};
use crate::mute_daemon::MuteDaemon;
use crate::osc_client::OscClient;
use crate::pedal_model::MidiEvent;
use crate::reconciler::Reconciler;
use crate::state::SurfaceState;
use crate::surface::OscSurface;

mod config;
mod feedback;
mod midi_mapping;
mod midi_reading;
mod mute_daemon;
mod osc_client;
mod osc_model;
mod pedal_model;
mod reconciler;
mod state;
mod surface;
mod util;

// Pedal events are rare, this only has to survive a burst of jitter
const MIDI_PIPE_CAPACITY: usize = 100;

struct Args {
    verbose: bool,
    list_ports: bool,
    config: Option<PathBuf>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    Args {
        verbose: args.iter().any(|a| a == "--verbose" || a == "-v"),
        list_ports: args.iter().any(|a| a == "--list-ports"),
        config: args
            .iter()
            .position(|a| a == "--config")
            .and_then(|i| args.get(i + 1))
            .map(PathBuf::from),
    }
}

fn init_logging(verbose: bool) {
    use simplelog::{ColorChoice, LevelFilter, TermLogger, TerminalMode};

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };

    if let Err(err) = TermLogger::init(log_level, simplelog::Config::default(), TerminalMode::Mixed, ColorChoice::Auto) {
        eprintln!("Could not set up logging: {}", err);
    }
}

fn main() {
    let args = parse_args();
    init_logging(args.verbose);

    match run(args) {
        Ok(_) => (),
        Err(err) => log::error!("Error: {}", err),
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    if args.list_ports {
        let ports = midi_reading::list_ports()?;
        println!("MIDI inputs:\n{}", midi_reading::describe_ports(&ports));
        return Ok(());
    }

    let config = Config::load(args.config.as_deref());

    // State init

    let surface_state = Arc::new(Mutex::new(SurfaceState::new()));
    let osc_read_state = surface_state.clone();

    let socket = UdpSocket::bind(SocketAddrV4::from_str("127.0.0.1:0")?)?;
    let bridge_client = OscClient::new(socket.try_clone()?, config.bridge_addr()?);
    let reconcile_settings = config.reconcile_settings();
    let surface = OscSurface::new(
        surface_state,
        bridge_client,
        config.surface_labels(),
        reconcile_settings.retry_interval,
    );

    // Bridge reports thread
    let listen_addr = config.listen_addr();
    log::info!("Listening for surface bridge reports on {}", listen_addr);
    thread::spawn(move || {
        OSCStack::init(listen_addr)
            .on_message(osc_model::SURFACE_ACK, &|_msg| {
                util::lock(&osc_read_state).acknowledge();
            })
            .on_message(osc_model::SURFACE_LABELS, &|msg| {
                util::lock(&osc_read_state).set_labels(&msg.args);
            })
            .begin();
    });

    surface.handshake(config.handshake_timeout())?;

    // Start reading MIDI

    let (midi_pub, midi_sub) = HeapRb::<MidiEvent>::new(MIDI_PIPE_CAPACITY).split();
    let midi_pub = Arc::new(Mutex::new(midi_pub));

    let connections = midi_reading::connect_all(config.port_filter(), move |message| {
        if let Some(event) = midi_mapping::parse(message) {
            if util::lock(&midi_pub).try_push(event).is_err() {
                log::warn!("MIDI pipe full, dropping {:?}", event);
            }
        }
    });

    // Stays alive for as long as the daemon runs
    let _connections = match connections {
        Ok(connections) => connections,
        Err(err) => {
            log::error!("Could not access your MIDI devices. {}", err);
            return Ok(());
        }
    };

    let feedback: Box<dyn Feedback> = if config.feedback_enabled() {
        Box::new(OscFeedback::new(
            OscClient::new(socket, config.feedback_addr()?),
            config.feedback_settings(),
        ))
    } else {
        Box::new(SilentFeedback)
    };

    MuteDaemon::new(
        config.pedal_mapping(),
        Reconciler::new(reconcile_settings),
        surface,
        feedback,
    )
    .begin(midi_sub)
}
