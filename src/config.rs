use std::net::SocketAddrV4;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::feedback::FeedbackSettings;
use crate::midi_mapping::PedalMapping;
use crate::reconciler::ReconcileSettings;
use crate::surface::SurfaceLabels;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:17780";
const DEFAULT_BRIDGE_ADDR: &str = "127.0.0.1:13350";
const DEFAULT_SAMPLER_ADDR: &str = "127.0.0.1:13339";

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    midi: MidiConfig,
    #[serde(default)]
    mute: MuteConfig,
    #[serde(default)]
    surface: SurfaceConfig,
    #[serde(default)]
    feedback: FeedbackConfig,
}

#[derive(Deserialize, Default)]
struct MidiConfig {
    port_filter: Option<String>,
    sustain_cc: Option<u8>,
    sustain_pedal_mutes: Option<bool>,
}

#[derive(Deserialize, Default)]
struct MuteConfig {
    max_attempts: Option<u32>,
    debounce_ms: Option<u64>,
    retry_interval_ms: Option<u64>,
}

#[derive(Deserialize, Default)]
struct SurfaceConfig {
    listen_addr: Option<String>,
    bridge_addr: Option<String>,
    turn_on_label: Option<String>,
    turn_off_label: Option<String>,
    handshake_timeout_ms: Option<u64>,
}

#[derive(Deserialize, Default)]
struct FeedbackConfig {
    enabled: Option<bool>,
    target_addr: Option<String>,
    pack_name: Option<String>,
    muted_index: Option<i32>,
    unmuted_index: Option<i32>,
    volume: Option<f32>,
}

pub struct Config {
    file: ConfigFile,
}

impl Config {
    /// Embedded defaults, overridden by `path` or the user config file when present.
    pub fn load(path: Option<&Path>) -> Self {
        let mut file = match toml::from_str::<ConfigFile>(DEFAULT_CONFIG) {
            Ok(file) => file,
            Err(e) => {
                log::error!(target: "config", "embedded config.toml is broken, using built-in defaults: {}", e);
                ConfigFile::default()
            }
        };

        let user_path = path.map(Path::to_path_buf).or_else(user_config_path);
        if let Some(path) = user_path {
            if let Some(user) = read_user_config(&path) {
                merge(&mut file, user);
            }
        }

        Config { file }
    }

    pub fn port_filter(&self) -> Option<&str> {
        self.file.midi.port_filter.as_deref()
    }

    pub fn pedal_mapping(&self) -> PedalMapping {
        let fallback = PedalMapping::default();
        PedalMapping {
            sustain_cc: self
                .file
                .midi
                .sustain_cc
                .filter(|cc| *cc < 128)
                .unwrap_or(fallback.sustain_cc),
            sustain_pedal_mutes: self
                .file
                .midi
                .sustain_pedal_mutes
                .unwrap_or(fallback.sustain_pedal_mutes),
        }
    }

    pub fn surface_labels(&self) -> SurfaceLabels {
        let fallback = SurfaceLabels::default();
        SurfaceLabels {
            turn_on: self.file.surface.turn_on_label.clone().unwrap_or(fallback.turn_on),
            turn_off: self.file.surface.turn_off_label.clone().unwrap_or(fallback.turn_off),
        }
    }

    pub fn reconcile_settings(&self) -> ReconcileSettings {
        let fallback = ReconcileSettings::default();
        let debounce = self
            .file
            .mute
            .debounce_ms
            .map(Duration::from_millis)
            .unwrap_or(fallback.debounce);

        ReconcileSettings {
            max_attempts: self.file.mute.max_attempts.unwrap_or(fallback.max_attempts),
            debounce,
            // Retries follow the debounce unless told otherwise
            retry_interval: self
                .file
                .mute
                .retry_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(debounce),
            labels: self.surface_labels(),
        }
    }

    pub fn handshake_timeout(&self) -> Option<Duration> {
        self.file.surface.handshake_timeout_ms.map(Duration::from_millis)
    }

    pub fn listen_addr(&self) -> String {
        self.file
            .surface
            .listen_addr
            .clone()
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string())
    }

    pub fn bridge_addr(&self) -> Result<SocketAddrV4, String> {
        parse_addr(self.file.surface.bridge_addr.as_deref(), DEFAULT_BRIDGE_ADDR)
    }

    pub fn feedback_enabled(&self) -> bool {
        self.file.feedback.enabled.unwrap_or(true)
    }

    pub fn feedback_addr(&self) -> Result<SocketAddrV4, String> {
        parse_addr(self.file.feedback.target_addr.as_deref(), DEFAULT_SAMPLER_ADDR)
    }

    pub fn feedback_settings(&self) -> FeedbackSettings {
        let fallback = FeedbackSettings::default();
        let feedback = &self.file.feedback;
        FeedbackSettings {
            pack_name: feedback.pack_name.clone().unwrap_or(fallback.pack_name),
            muted_index: feedback.muted_index.unwrap_or(fallback.muted_index),
            unmuted_index: feedback.unmuted_index.unwrap_or(fallback.unmuted_index),
            volume: feedback.volume.unwrap_or(fallback.volume).clamp(0.0, 1.0),
        }
    }
}

fn parse_addr(value: Option<&str>, fallback: &str) -> Result<SocketAddrV4, String> {
    let raw = value.unwrap_or(fallback);
    SocketAddrV4::from_str(raw).map_err(|e| format!("invalid address {}: {}", raw, e))
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("jdw-pedal-mute").join("config.toml"))
}

fn read_user_config(path: &Path) -> Option<ConfigFile> {
    if !path.exists() {
        return None;
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
            Ok(user) => Some(user),
            Err(e) => {
                log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e);
                None
            }
        },
        Err(e) => {
            log::warn!(target: "config", "could not read config {}: {}", path.display(), e);
            None
        }
    }
}

fn merge_field<T>(base: &mut Option<T>, user: Option<T>) {
    if user.is_some() {
        *base = user;
    }
}

fn merge(base: &mut ConfigFile, user: ConfigFile) {
    merge_field(&mut base.midi.port_filter, user.midi.port_filter);
    merge_field(&mut base.midi.sustain_cc, user.midi.sustain_cc);
    merge_field(&mut base.midi.sustain_pedal_mutes, user.midi.sustain_pedal_mutes);

    merge_field(&mut base.mute.max_attempts, user.mute.max_attempts);
    merge_field(&mut base.mute.debounce_ms, user.mute.debounce_ms);
    merge_field(&mut base.mute.retry_interval_ms, user.mute.retry_interval_ms);

    merge_field(&mut base.surface.listen_addr, user.surface.listen_addr);
    merge_field(&mut base.surface.bridge_addr, user.surface.bridge_addr);
    merge_field(&mut base.surface.turn_on_label, user.surface.turn_on_label);
    merge_field(&mut base.surface.turn_off_label, user.surface.turn_off_label);
    merge_field(&mut base.surface.handshake_timeout_ms, user.surface.handshake_timeout_ms);

    merge_field(&mut base.feedback.enabled, user.feedback.enabled);
    merge_field(&mut base.feedback.target_addr, user.feedback.target_addr);
    merge_field(&mut base.feedback.pack_name, user.feedback.pack_name);
    merge_field(&mut base.feedback.muted_index, user.feedback.muted_index);
    merge_field(&mut base.feedback.unmuted_index, user.feedback.unmuted_index);
    merge_field(&mut base.feedback.volume, user.feedback.volume);
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::feedback::VOLUME;
    use crate::reconciler::{DEBOUNCE, MAX_ATTEMPTS};
    use crate::surface::{TURN_OFF_MICROPHONE, TURN_ON_MICROPHONE};

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn embedded_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let config = Config::load(Some(missing.as_path()));

        assert_eq!(config.pedal_mapping(), PedalMapping::default());
        assert!(!config.pedal_mapping().sustain_pedal_mutes);
        assert_eq!(config.port_filter(), None);

        let settings = config.reconcile_settings();
        assert_eq!(settings.max_attempts, MAX_ATTEMPTS);
        assert_eq!(settings.debounce, DEBOUNCE);
        assert_eq!(settings.retry_interval, DEBOUNCE);
        assert_eq!(settings.labels.turn_on, TURN_ON_MICROPHONE);
        assert_eq!(settings.labels.turn_off, TURN_OFF_MICROPHONE);

        assert_eq!(config.feedback_settings().volume, VOLUME);
        assert!(config.feedback_enabled());
        assert_eq!(config.handshake_timeout(), None);
        assert_eq!(config.listen_addr(), DEFAULT_LISTEN_ADDR);
        assert_eq!(config.bridge_addr().unwrap().to_string(), DEFAULT_BRIDGE_ADDR);
        assert_eq!(config.feedback_addr().unwrap().to_string(), DEFAULT_SAMPLER_ADDR);
    }

    #[test]
    fn partial_user_file_overrides_only_its_keys() {
        let file = write_config(
            r#"
            [midi]
            port_filter = "MiniLab"
            sustain_pedal_mutes = true

            [mute]
            debounce_ms = 80

            [surface]
            turn_on_label = "Unmute"
            "#,
        );
        let config = Config::load(Some(file.path()));

        assert_eq!(config.port_filter(), Some("MiniLab"));
        assert!(config.pedal_mapping().sustain_pedal_mutes);
        assert_eq!(config.pedal_mapping().sustain_cc, 64);

        let settings = config.reconcile_settings();
        assert_eq!(settings.debounce, Duration::from_millis(80));
        assert_eq!(settings.retry_interval, Duration::from_millis(80));
        assert_eq!(settings.max_attempts, MAX_ATTEMPTS);
        assert_eq!(settings.labels.turn_on, "Unmute");
        assert_eq!(settings.labels.turn_off, TURN_OFF_MICROPHONE);
    }

    #[test]
    fn malformed_user_file_is_ignored() {
        let file = write_config("[mute\ndebounce_ms = ");
        let config = Config::load(Some(file.path()));

        assert_eq!(config.reconcile_settings().debounce, DEBOUNCE);
    }

    #[test]
    fn out_of_range_values_fall_back() {
        let file = write_config(
            r#"
            [midi]
            sustain_cc = 200

            [feedback]
            volume = 4.0

            [surface]
            bridge_addr = "nowhere"
            "#,
        );
        let config = Config::load(Some(file.path()));

        assert_eq!(config.pedal_mapping().sustain_cc, 64);
        assert_eq!(config.feedback_settings().volume, 1.0);
        assert!(config.bridge_addr().is_err());
    }
}
