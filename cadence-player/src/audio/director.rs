//! Dual-channel audio director
//!
//! **Responsibilities:**
//! - Own the music and voice-over channels exclusively; nothing else sets
//!   their source or volume
//! - Duck music under an active voice-over and restore it afterwards, with
//!   one ramp in flight at a time (a new request preempts the running ramp)
//! - Loop the category playlist, treating track errors as track ends
//! - Offer an idempotent `play()` for the host's "enable audio" affordance
//!
//! The director is passive: the engine calls it on segment changes, pause
//! toggles, scheduler fade steps and media polls, and turns the returned
//! [`DirectorEvent`]s into bus events.

use std::collections::HashMap;

use cadence_common::events::{AudioChannelKind, TrackInfo};
use cadence_common::{ClassPlaylists, FadeCurve, MusicPlaylist, PlaylistCategory, Voiceover};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::channel::{AudioChannel, ChannelEvent, ChannelStatus};
use crate::config::AudioConfig;
use crate::media::{AudioBackend, MediaError, MediaSource, PlayOrigin};

/// Something the host should hear about
#[derive(Debug, Clone, PartialEq)]
pub enum DirectorEvent {
    TrackChanged(TrackInfo),
    DuckingChanged { ducked: bool, target_volume: f32 },
    AutoplayBlocked(AudioChannelKind),
}

/// Observable audio state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioSnapshot {
    pub music: ChannelStatus,
    pub voiceover: ChannelStatus,
    pub category: Option<PlaylistCategory>,
    pub playlist_id: Option<String>,
    pub track_index: Option<usize>,
    pub ducked: bool,
    /// Some channel is waiting for a user gesture
    pub needs_user_gesture: bool,
}

/// Mixing parameters
#[derive(Debug, Clone)]
pub struct DuckingSettings {
    pub music_volume: f32,
    pub ducked_volume: f32,
    pub voiceover_volume: f32,
    pub fade_ms: u64,
    pub curve: FadeCurve,
}

impl From<&AudioConfig> for DuckingSettings {
    fn from(config: &AudioConfig) -> Self {
        Self {
            music_volume: config.music_volume,
            ducked_volume: config.ducked_music_volume(),
            voiceover_volume: config.voiceover_volume,
            fade_ms: config.duck_fade_ms,
            curve: config.fade_curve,
        }
    }
}

pub struct AudioDirector {
    music: AudioChannel,
    voiceover: AudioChannel,
    playlists: ClassPlaylists,
    category: Option<PlaylistCategory>,
    track_indices: HashMap<PlaylistCategory, usize>,
    settings: DuckingSettings,
    ducked: bool,
    /// Playback is currently wanted (engine running, not paused)
    engaged: bool,
    released: bool,
}

impl AudioDirector {
    pub fn new(
        music_backend: Box<dyn AudioBackend>,
        voiceover_backend: Box<dyn AudioBackend>,
        playlists: ClassPlaylists,
        settings: DuckingSettings,
    ) -> Self {
        Self {
            music: AudioChannel::new(AudioChannelKind::Music, music_backend, settings.music_volume),
            voiceover: AudioChannel::new(
                AudioChannelKind::Voiceover,
                voiceover_backend,
                settings.voiceover_volume,
            ),
            playlists,
            category: None,
            track_indices: HashMap::new(),
            settings,
            ducked: false,
            engaged: false,
            released: false,
        }
    }

    /// Switch the music channel to `category`'s playlist
    ///
    /// Re-selecting the active category does nothing. Switching resets the
    /// target playlist to its first track and leaves the other playlist's
    /// position untouched.
    pub fn select_category(&mut self, category: PlaylistCategory) -> Vec<DirectorEvent> {
        if self.released || self.category == Some(category) {
            return Vec::new();
        }
        info!("Music category -> {}", category);
        self.category = Some(category);
        self.track_indices.insert(category, 0);

        if self.playlists.get(category).is_none() {
            debug!("No {} playlist supplied; music silent", category);
            self.music.unload();
            return Vec::new();
        }
        self.load_current_track()
    }

    fn current_playlist(&self) -> Option<&MusicPlaylist> {
        self.category.and_then(|c| self.playlists.get(c))
    }

    /// Load the current category's current track and play it if engaged
    fn load_current_track(&mut self) -> Vec<DirectorEvent> {
        let Some(category) = self.category else {
            return Vec::new();
        };
        let index = self.track_index(category);
        let Some((info, source)) = self.current_playlist().and_then(|playlist| {
            playlist.track(index).map(|track| {
                let duration_ms = cadence_common::time::seconds_f64_to_millis(track.duration_seconds);
                (
                    TrackInfo::new(category, &playlist.id, index, track),
                    MediaSource::new(track.audio_url.clone(), (duration_ms > 0).then_some(duration_ms)),
                )
            })
        }) else {
            return Vec::new();
        };

        info!("Music track {} ({}) -> {}", index, info.playlist_id, info.title);
        self.music.load(source);
        let mut events = vec![DirectorEvent::TrackChanged(info)];
        if self.engaged {
            events.extend(self.play_channel(AudioChannelKind::Music, PlayOrigin::Automatic));
        }
        events
    }

    /// Current track position within `category`'s playlist
    pub fn track_index(&self, category: PlaylistCategory) -> usize {
        self.track_indices.get(&category).copied().unwrap_or(0)
    }

    pub fn active_category(&self) -> Option<PlaylistCategory> {
        self.category
    }

    /// Replace the voice-over for a new segment
    pub fn set_voiceover(&mut self, voiceover: Option<&Voiceover>) -> Vec<DirectorEvent> {
        if self.released {
            return Vec::new();
        }
        self.voiceover.unload();
        let mut events = Vec::new();
        if let Some(vo) = voiceover {
            let duration_ms = vo.duration_ms();
            self.voiceover
                .load(MediaSource::new(vo.url.clone(), (duration_ms > 0).then_some(duration_ms)));
            if self.engaged {
                events.extend(self.play_channel(AudioChannelKind::Voiceover, PlayOrigin::Automatic));
            }
        }
        events.extend(self.update_ducking());
        events
    }

    fn channel_mut(&mut self, kind: AudioChannelKind) -> &mut AudioChannel {
        match kind {
            AudioChannelKind::Music => &mut self.music,
            AudioChannelKind::Voiceover => &mut self.voiceover,
        }
    }

    fn play_channel(&mut self, kind: AudioChannelKind, origin: PlayOrigin) -> Option<DirectorEvent> {
        match self.channel_mut(kind).play(origin) {
            Err(MediaError::AutoplayBlocked) => Some(DirectorEvent::AutoplayBlocked(kind)),
            _ => None,
        }
    }

    /// Start (or keep) both channels playing
    ///
    /// Idempotent: channels already playing are left alone, channels still
    /// loading start on their ready signal. `UserGesture` is the host's
    /// manual "enable audio" affordance.
    pub fn play(&mut self, origin: PlayOrigin) -> Vec<DirectorEvent> {
        if self.released {
            return Vec::new();
        }
        self.engaged = true;
        let mut events = Vec::new();
        for kind in [AudioChannelKind::Music, AudioChannelKind::Voiceover] {
            if self.channel_mut(kind).has_source() {
                events.extend(self.play_channel(kind, origin));
            }
        }
        events.extend(self.update_ducking());
        events
    }

    /// Pause both channels (engine paused)
    pub fn pause(&mut self) {
        self.engaged = false;
        self.music.pause();
        self.voiceover.pause();
    }

    /// Duck or restore music to match voice-over activity
    fn update_ducking(&mut self) -> Vec<DirectorEvent> {
        let want_ducked = self.voiceover.is_active();
        if want_ducked == self.ducked {
            return Vec::new();
        }
        self.ducked = want_ducked;
        let target = if want_ducked {
            self.settings.ducked_volume
        } else {
            self.settings.music_volume
        };
        debug!(
            "{} music to {:.2} over {}ms",
            if want_ducked { "Ducking" } else { "Restoring" },
            target,
            self.settings.fade_ms
        );
        self.music
            .fade_to(target, self.settings.fade_ms, self.settings.curve);
        vec![DirectorEvent::DuckingChanged {
            ducked: want_ducked,
            target_volume: target,
        }]
    }

    /// Advance volume ramps; returns true while any ramp is running
    pub fn step_fades(&mut self, elapsed_ms: u64) -> bool {
        let music = self.music.step_fade(elapsed_ms);
        let voiceover = self.voiceover.step_fade(elapsed_ms);
        music || voiceover
    }

    pub fn is_fading(&self) -> bool {
        self.music.is_fading() || self.voiceover.is_fading()
    }

    pub fn is_ducked(&self) -> bool {
        self.ducked
    }

    /// Poll both backends and react to their signals
    pub fn poll(&mut self, elapsed_ms: u64) -> Vec<DirectorEvent> {
        if self.released {
            return Vec::new();
        }
        let mut events = Vec::new();

        for event in self.music.poll(elapsed_ms) {
            match event {
                ChannelEvent::Ended => events.extend(self.advance_track()),
                ChannelEvent::Failed(e) => {
                    warn!("Music track failed ({}); advancing playlist", e);
                    events.extend(self.advance_track());
                }
                ChannelEvent::Blocked => {
                    events.push(DirectorEvent::AutoplayBlocked(AudioChannelKind::Music))
                }
            }
        }

        for event in self.voiceover.poll(elapsed_ms) {
            match event {
                ChannelEvent::Ended => debug!("Voice-over ended"),
                ChannelEvent::Failed(e) => warn!("Voice-over failed: {}", e),
                ChannelEvent::Blocked => {
                    events.push(DirectorEvent::AutoplayBlocked(AudioChannelKind::Voiceover))
                }
            }
        }

        events.extend(self.update_ducking());
        events
    }

    /// Move to the next track of the current playlist, wrapping around
    fn advance_track(&mut self) -> Vec<DirectorEvent> {
        let Some(category) = self.category else {
            return Vec::new();
        };
        let Some(next) = self
            .current_playlist()
            .map(|p| p.next_index(self.track_index(category)))
        else {
            return Vec::new();
        };
        self.track_indices.insert(category, next);
        self.load_current_track()
    }

    /// Unload both channels and cancel ramps (teardown)
    ///
    /// Returns false when already released.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        self.engaged = false;
        self.music.unload();
        self.voiceover.unload();
        info!("Audio channels released");
        true
    }

    pub fn snapshot(&self) -> AudioSnapshot {
        let playlist = self.current_playlist();
        AudioSnapshot {
            music: self.music.status(),
            voiceover: self.voiceover.status(),
            category: self.category,
            playlist_id: playlist.map(|p| p.id.clone()),
            track_index: playlist.and(self.category.map(|c| self.track_index(c))),
            ducked: self.ducked,
            needs_user_gesture: self.music.is_blocked() || self.voiceover.is_blocked(),
        }
    }
}
