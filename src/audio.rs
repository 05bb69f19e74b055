//! Music cues
//!
//! The simulation only names the track that should be playing; loading
//! and playing the files belongs to the presentation layer.

use serde::{Deserialize, Serialize};

/// Named music tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioCue {
    /// Jingle before the first life of a game
    RoundIntro,
    /// Chase theme
    MainTheme,
    /// Alternate chase theme on challenging levels
    ChallengingTheme,
    /// Played once the fuel runs low
    FuelLow,
    /// Level cleared
    RoundComplete,
}

/// What the audio collaborator should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MusicCommand {
    Play(AudioCue),
    Stop,
}

/// Tracks the current cue and picks the next one when a track ends
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jukebox {
    current: Option<AudioCue>,
}

impl Jukebox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<AudioCue> {
        self.current
    }

    /// Switch to `cue` immediately
    pub fn play(&mut self, cue: AudioCue) -> MusicCommand {
        self.current = Some(cue);
        MusicCommand::Play(cue)
    }

    pub fn stop(&mut self) -> MusicCommand {
        self.current = None;
        MusicCommand::Stop
    }

    /// The current track finished; decide what follows
    ///
    /// Once fuel is low the fuel theme takes over, and music stops when it
    /// ends. Challenging levels alternate the two chase themes; everything
    /// else loops.
    pub fn track_ended(&mut self, challenging: bool, fuel_low: bool) -> MusicCommand {
        let current = self.current;
        let next = match current {
            None => return MusicCommand::Stop,
            Some(AudioCue::FuelLow) if fuel_low => return self.stop(),
            Some(AudioCue::RoundIntro) => AudioCue::MainTheme,
            Some(_) if fuel_low => AudioCue::FuelLow,
            Some(AudioCue::MainTheme) if challenging => AudioCue::ChallengingTheme,
            Some(AudioCue::ChallengingTheme) if challenging => AudioCue::MainTheme,
            Some(cue) => cue,
        };
        self.play(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_level_loops_theme() {
        let mut jukebox = Jukebox::new();
        jukebox.play(AudioCue::MainTheme);
        assert_eq!(jukebox.track_ended(false, false), MusicCommand::Play(AudioCue::MainTheme));
    }

    #[test]
    fn test_challenging_level_alternates() {
        let mut jukebox = Jukebox::new();
        jukebox.play(AudioCue::MainTheme);
        assert_eq!(
            jukebox.track_ended(true, false),
            MusicCommand::Play(AudioCue::ChallengingTheme)
        );
        assert_eq!(jukebox.track_ended(true, false), MusicCommand::Play(AudioCue::MainTheme));
    }

    #[test]
    fn test_fuel_theme_plays_once() {
        let mut jukebox = Jukebox::new();
        jukebox.play(AudioCue::ChallengingTheme);
        assert_eq!(jukebox.track_ended(true, true), MusicCommand::Play(AudioCue::FuelLow));
        assert_eq!(jukebox.track_ended(true, true), MusicCommand::Stop);
        assert_eq!(jukebox.current(), None);
        assert_eq!(jukebox.track_ended(true, true), MusicCommand::Stop);
    }

    #[test]
    fn test_intro_leads_into_main_theme() {
        let mut jukebox = Jukebox::new();
        jukebox.play(AudioCue::RoundIntro);
        assert_eq!(jukebox.track_ended(false, false), MusicCommand::Play(AudioCue::MainTheme));
    }
}
