// Audio feedback - fire-and-forget cues synthesized as short tone sequences
use bevy::audio::{AddAudioSource, Decodable, Source};
use bevy::prelude::*;
use rand::Rng;
use std::f32::consts::TAU;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use crate::constants::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioCue {
    /// Soft high chime when the pointer enters an instance
    Chime,
    /// Rising arpeggio when an instance is clicked
    Arpeggio,
}

/// Receiver of audio cues. Triggers never report failure back to the caller.
pub trait AudioSink: Send + Sync {
    fn trigger(&self, cue: AudioCue);
}

/// Sink that drops every cue.
pub struct SilentSink;

impl AudioSink for SilentSink {
    fn trigger(&self, _cue: AudioCue) {}
}

/// Forwards cues to the Bevy world, where `play_audio_cues` turns them into sounds.
pub struct ChannelSink {
    sender: Sender<AudioCue>,
}

impl AudioSink for ChannelSink {
    fn trigger(&self, cue: AudioCue) {
        // A closed channel means the scene is going away; nothing to play
        let _ = self.sender.send(cue);
    }
}

#[derive(Resource)]
pub struct AudioCueReceiver(Mutex<Receiver<AudioCue>>);

/// Sink handle shared by every interactive group of the scene.
#[derive(Resource, Clone)]
pub struct SceneAudio(pub Arc<dyn AudioSink>);

impl SceneAudio {
    pub fn silent() -> Self {
        Self(Arc::new(SilentSink))
    }
}

pub fn audio_channel() -> (SceneAudio, AudioCueReceiver) {
    let (sender, receiver) = channel();
    (
        SceneAudio(Arc::new(ChannelSink { sender })),
        AudioCueReceiver(Mutex::new(receiver)),
    )
}

pub struct ToneAudioPlugin;

impl Plugin for ToneAudioPlugin {
    fn build(&self, app: &mut App) {
        let (sink, receiver) = audio_channel();
        app.add_audio_source::<ToneSequence>()
            .insert_resource(sink)
            .insert_resource(receiver)
            .add_systems(Update, play_audio_cues);
    }
}

/// System: Drain queued cues and spawn one-shot players
pub fn play_audio_cues(
    mut commands: Commands,
    receiver: Res<AudioCueReceiver>,
    mut tones: ResMut<Assets<ToneSequence>>,
) {
    let Ok(receiver) = receiver.0.lock() else { return };
    let mut rng = rand::thread_rng();

    while let Ok(cue) = receiver.try_recv() {
        let sequence = match cue {
            AudioCue::Chime => ToneSequence::chime(&mut rng),
            AudioCue::Arpeggio => ToneSequence::arpeggio(),
        };
        commands.spawn((AudioPlayer(tones.add(sequence)), PlaybackSettings::DESPAWN));
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Waveform {
    Sine,
    Triangle,
}

impl Waveform {
    /// Sample at `cycles` periods into the wave, in [-1, 1].
    fn sample(self, cycles: f32) -> f32 {
        let frac = cycles.fract();
        match self {
            Waveform::Sine => (frac * TAU).sin(),
            Waveform::Triangle => 1.0 - 4.0 * (frac - 0.5).abs(),
        }
    }
}

/// One note: linear attack to `peak`, then exponential decay to `floor` at `duration`.
#[derive(Clone, Copy, Debug)]
pub struct Note {
    pub start: f32,
    pub frequency: f32,
    pub waveform: Waveform,
    pub attack: f32,
    pub duration: f32,
    pub peak: f32,
    pub floor: f32,
}

impl Note {
    pub fn gain_at(&self, t: f32) -> f32 {
        let local = t - self.start;
        if local < 0.0 || local >= self.duration {
            return 0.0;
        }
        if local < self.attack {
            return self.peak * local / self.attack;
        }
        let decay = (self.duration - self.attack).max(f32::EPSILON);
        let progress = (local - self.attack) / decay;
        self.peak * (self.floor / self.peak).powf(progress)
    }

    pub fn end(&self) -> f32 {
        self.start + self.duration
    }
}

#[derive(Asset, TypePath, Clone, Debug)]
pub struct ToneSequence {
    pub notes: Vec<Note>,
}

impl ToneSequence {
    pub fn chime<R: Rng>(rng: &mut R) -> Self {
        Self {
            notes: vec![Note {
                start: 0.0,
                frequency: CHIME_MIN_HZ + rng.gen::<f32>() * CHIME_SPREAD_HZ,
                waveform: Waveform::Sine,
                attack: 0.0,
                duration: CHIME_DURATION,
                peak: CHIME_GAIN,
                floor: AUDIO_SILENCE_FLOOR,
            }],
        }
    }

    pub fn arpeggio() -> Self {
        let notes = ARPEGGIO_NOTES
            .iter()
            .enumerate()
            .map(|(i, &frequency)| Note {
                start: i as f32 * ARPEGGIO_STEP,
                frequency,
                waveform: Waveform::Triangle,
                attack: ARPEGGIO_ATTACK,
                duration: ARPEGGIO_NOTE_DURATION,
                peak: ARPEGGIO_GAIN,
                floor: 0.001,
            })
            .collect();
        Self { notes }
    }

    pub fn duration(&self) -> f32 {
        self.notes.iter().map(Note::end).fold(0.0, f32::max)
    }

    pub fn sample_at(&self, t: f32) -> f32 {
        self.notes
            .iter()
            .map(|note| note.gain_at(t) * note.waveform.sample((t - note.start) * note.frequency))
            .sum()
    }
}

pub struct ToneDecoder {
    sequence: ToneSequence,
    sample_rate: u32,
    position: u64,
    total: u64,
}

impl Iterator for ToneDecoder {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.position >= self.total {
            return None;
        }
        let t = self.position as f32 / self.sample_rate as f32;
        self.position += 1;
        Some(self.sequence.sample_at(t))
    }
}

impl Source for ToneDecoder {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f32(self.total as f32 / self.sample_rate as f32))
    }
}

impl Decodable for ToneSequence {
    type DecoderItem = <ToneDecoder as Iterator>::Item;
    type Decoder = ToneDecoder;

    fn decoder(&self) -> Self::Decoder {
        let total = (self.duration() * AUDIO_SAMPLE_RATE as f32).ceil() as u64;
        ToneDecoder {
            sequence: self.clone(),
            sample_rate: AUDIO_SAMPLE_RATE,
            position: 0,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn chime_decays_from_soft_peak() {
        let chime = ToneSequence::chime(&mut StdRng::seed_from_u64(1));
        let note = chime.notes[0];
        assert!(note.frequency >= CHIME_MIN_HZ && note.frequency <= CHIME_MIN_HZ + CHIME_SPREAD_HZ);
        assert!((note.gain_at(0.0) - CHIME_GAIN).abs() < 1e-6);
        assert!(note.gain_at(0.25) < note.gain_at(0.1));
        assert_eq!(note.gain_at(CHIME_DURATION), 0.0);
    }

    #[test]
    fn arpeggio_notes_are_staggered() {
        let arpeggio = ToneSequence::arpeggio();
        assert_eq!(arpeggio.notes.len(), ARPEGGIO_NOTES.len());
        for pair in arpeggio.notes.windows(2) {
            assert!((pair[1].start - pair[0].start - ARPEGGIO_STEP).abs() < 1e-6);
        }
        let last = arpeggio.notes.last().unwrap();
        assert!((arpeggio.duration() - last.end()).abs() < 1e-6);
    }

    #[test]
    fn attack_ramps_linearly_to_peak() {
        let note = ToneSequence::arpeggio().notes[0];
        assert_eq!(note.gain_at(0.0), 0.0);
        assert!((note.gain_at(ARPEGGIO_ATTACK / 2.0) - ARPEGGIO_GAIN / 2.0).abs() < 1e-5);
        assert!((note.gain_at(ARPEGGIO_ATTACK) - ARPEGGIO_GAIN).abs() < 1e-5);
    }

    #[test]
    fn decoder_yields_bounded_samples_for_the_full_duration() {
        let sequence = ToneSequence::arpeggio();
        let decoder = sequence.decoder();
        assert_eq!(decoder.channels(), 1);
        let samples: Vec<f32> = decoder.collect();
        let expected = (sequence.duration() * AUDIO_SAMPLE_RATE as f32).ceil() as usize;
        assert_eq!(samples.len(), expected);
        // Six overlapping notes never exceed the sum of their peaks
        let bound = ARPEGGIO_GAIN * ARPEGGIO_NOTES.len() as f32;
        assert!(samples.iter().all(|s| s.abs() <= bound + 1e-6));
    }

    #[test]
    fn channel_sink_survives_a_dropped_receiver() {
        let (sink, receiver) = audio_channel();
        drop(receiver);
        sink.0.trigger(AudioCue::Chime);
    }

    #[test]
    fn channel_sink_delivers_cues_in_order() {
        let (sink, receiver) = audio_channel();
        sink.0.trigger(AudioCue::Chime);
        sink.0.trigger(AudioCue::Arpeggio);
        let rx = receiver.0.lock().unwrap();
        assert_eq!(rx.try_recv().ok(), Some(AudioCue::Chime));
        assert_eq!(rx.try_recv().ok(), Some(AudioCue::Arpeggio));
        assert!(rx.try_recv().is_err());
    }
}
