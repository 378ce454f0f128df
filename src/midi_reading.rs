use std::error::Error;
use std::fmt::Display;

use itertools::Itertools;
use midir::{Ignore, MidiInput, MidiInputConnection};

const CLIENT_NAME: &str = "jdw-pedal-mute";

pub fn list_ports() -> Result<Vec<String>, Box<dyn Error>> {
    let midi_in = MidiInput::new(CLIENT_NAME)?;

    Ok(midi_in
        .ports()
        .iter()
        .filter_map(|port| midi_in.port_name(port).ok())
        .collect())
}

pub fn describe_ports(names: &[String]) -> String {
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.iter().map(|name| format!("  {}", name)).join("\n")
    }
}

fn port_matches(name: &str, filter: Option<&str>) -> bool {
    filter.map_or(true, |wanted| name.contains(wanted))
}

// Index of `name` in a fresh port listing, preferring the position it had before
fn locate_port(fresh: &[String], index: usize, name: &str) -> Option<usize> {
    if fresh.get(index).map(String::as_str) == Some(name) {
        return Some(index);
    }
    fresh.iter().position(|candidate| candidate == name)
}

// Tries every wanted port on its own; a port that refuses is logged and skipped
fn connect_each<C, E, F>(names: &[String], filter: Option<&str>, mut connect: F) -> Vec<C>
where
    E: Display,
    F: FnMut(usize, &str) -> Result<C, E>,
{
    let mut connections = Vec::new();

    for (index, name) in names.iter().enumerate() {
        if !port_matches(name, filter) {
            log::debug!("Skipping MIDI input {}", name);
            continue;
        }

        match connect(index, name) {
            Ok(connection) => {
                log::info!("Listening for sustain events from {}", name);
                connections.push(connection);
            }
            Err(err) => log::warn!("Could not listen to MIDI input {}: {}", name, err),
        }
    }

    connections
}

fn connect_port<F>(index: usize, name: &str, callback: F) -> Result<MidiInputConnection<()>, Box<dyn Error>>
where
    F: 'static + Fn(&[u8]) + Send,
{
    // Connecting consumes the MidiInput, so every port gets its own
    let mut midi_in = MidiInput::new(CLIENT_NAME)?;
    midi_in.ignore(Ignore::None);

    let ports = midi_in.ports();
    let fresh: Vec<String> = ports
        .iter()
        .map(|port| midi_in.port_name(port).unwrap_or_default())
        .collect();

    let port = locate_port(&fresh, index, name)
        .and_then(|found| ports.get(found))
        .ok_or("port disappeared before connecting")?;

    let connection = midi_in
        .connect(
            port,
            "jdw-pedal-mute-input",
            move |_stamp, message, _| callback(message),
            (),
        )
        .map_err(|err| err.to_string())?;

    Ok(connection)
}

/*
    Connect to every input port (or those whose name contains `filter`) and hand
    each raw message to `callback`. The returned connections must be kept alive,
    dropping them closes the ports.
*/
pub fn connect_all<F>(
    filter: Option<&str>,
    callback: F,
) -> Result<Vec<MidiInputConnection<()>>, Box<dyn Error>>
where
    F: 'static + Fn(&[u8]) + Send + Clone,
{
    let names = list_ports()?;

    let connections = connect_each(&names, filter, |index, name| {
        connect_port(index, name, callback.clone())
    });

    if connections.is_empty() {
        return Err(format!(
            "No usable MIDI inputs. Available:\n{}",
            describe_ports(&names)
        )
        .into());
    }

    Ok(connections)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_is_a_substring_match() {
        assert!(port_matches("Arturia MiniLab mkII:0", None));
        assert!(port_matches("Arturia MiniLab mkII:0", Some("MiniLab")));
        assert!(!port_matches("Midi Through Port-0", Some("MiniLab")));
    }

    #[test]
    fn port_listing() {
        assert_eq!(describe_ports(&[]), "(none)");
        assert_eq!(
            describe_ports(&["A".to_string(), "B".to_string()]),
            "  A\n  B"
        );
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn refused_port_does_not_stop_the_rest() {
        let ports = names(&["Midi Through Port-0", "Arturia MiniLab mkII:0", "Pedal Box"]);

        let mut tried = Vec::new();
        let connected = connect_each(&ports, None, |index, name| {
            tried.push(index);
            if name.starts_with("Arturia") {
                Err("device busy")
            } else {
                Ok(name.to_string())
            }
        });

        assert_eq!(tried, vec![0, 1, 2]);
        assert_eq!(connected, names(&["Midi Through Port-0", "Pedal Box"]));
    }

    #[test]
    fn filtered_ports_are_never_tried() {
        let ports = names(&["Midi Through Port-0", "Pedal Box 1", "Pedal Box 2"]);

        let mut tried = Vec::new();
        let connected: Vec<usize> = connect_each(&ports, Some("Pedal"), |index, _| {
            tried.push(index);
            Ok::<_, String>(index)
        });

        assert_eq!(tried, vec![1, 2]);
        assert_eq!(connected, vec![1, 2]);

        let none: Vec<usize> = connect_each(&ports, Some("Nope"), |index, _| Ok::<_, String>(index));
        assert!(none.is_empty());
    }

    #[test]
    fn ports_are_relocated_by_name() {
        let fresh = names(&["Pedal Box", "Midi Through Port-0"]);

        assert_eq!(locate_port(&fresh, 0, "Pedal Box"), Some(0));
        // Listing shifted between enumerating and connecting
        assert_eq!(locate_port(&fresh, 1, "Pedal Box"), Some(0));
        assert_eq!(locate_port(&fresh, 5, "Midi Through Port-0"), Some(1));
        assert_eq!(locate_port(&fresh, 0, "Arturia MiniLab mkII:0"), None);

        // Two identical devices keep their own slots
        let twins = names(&["Pedal Box", "Pedal Box"]);
        assert_eq!(locate_port(&twins, 1, "Pedal Box"), Some(1));
    }
}
