use rosc::OscPacket;

use crate::osc_client::OscClient;
use crate::osc_model;

pub const VOLUME: f32 = 0.1;

/// Audible confirmation that the mic reached a state.
pub trait Feedback {
    fn play(&mut self, muted: bool);
}

impl<T: Feedback + ?Sized> Feedback for Box<T> {
    fn play(&mut self, muted: bool) {
        (**self).play(muted)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackSettings {
    pub pack_name: String,
    pub muted_index: i32,
    pub unmuted_index: i32,
    pub volume: f32,
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        FeedbackSettings {
            pack_name: "pedal_mute".to_string(),
            muted_index: 0,
            unmuted_index: 1,
            volume: VOLUME,
        }
    }
}

// Plays the clips through the sampler; each clip message is built on first use
pub struct OscFeedback {
    client: OscClient,
    settings: FeedbackSettings,
    muted_clip: Option<OscPacket>,
    unmuted_clip: Option<OscPacket>,
}

impl OscFeedback {
    pub fn new(client: OscClient, settings: FeedbackSettings) -> OscFeedback {
        OscFeedback {
            client,
            settings,
            muted_clip: None,
            unmuted_clip: None,
        }
    }

    fn clip(&mut self, muted: bool) -> &OscPacket {
        let settings = &self.settings;
        if muted {
            self.muted_clip.get_or_insert_with(|| {
                osc_model::create_play_sample(settings.muted_index, &settings.pack_name, settings.volume)
            })
        } else {
            self.unmuted_clip.get_or_insert_with(|| {
                osc_model::create_play_sample(settings.unmuted_index, &settings.pack_name, settings.volume)
            })
        }
    }
}

impl Feedback for OscFeedback {
    fn play(&mut self, muted: bool) {
        let packet = self.clip(muted).clone();
        self.client.send(&packet);
    }
}

pub struct SilentFeedback;

impl Feedback for SilentFeedback {
    fn play(&mut self, muted: bool) {
        log::debug!("Feedback disabled, not playing {} clip", if muted { "muted" } else { "unmuted" });
    }
}
