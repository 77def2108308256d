//! VGM playback engine
//!
//! [`VgmPlayer`] interprets the command stream: chip register writes and
//! data blocks are routed to the emulated chips through the
//! [`StreamMixer`](crate::mixer::StreamMixer), wait commands meter out
//! output frames, and the end command either loops or finishes the song.
//! Commands addressed to chips this player does not model are consumed with
//! their documented operand widths so the stream stays in sync.

use crate::chips::{ga20, rf5c68, Ga20, Rf5c68};
use crate::compression::decompress_if_needed;
use crate::mixer::{master_volume, ChipId, StreamMixer};
use crate::resampler::RateAdapter;
use crate::vgm::{Gd3Tag, VgmHeader};
use crate::{Result, VgmError};

/// Wait commands count samples at this rate, independent of the output rate.
const VGM_SAMPLE_RATE: u32 = 44_100;

/// Default output sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

// Command opcodes this player acts on.
const CMD_WAIT: u8 = 0x61;
const CMD_WAIT_60HZ: u8 = 0x62;
const CMD_WAIT_50HZ: u8 = 0x63;
const CMD_END: u8 = 0x66;
const CMD_DATA_BLOCK: u8 = 0x67;
const CMD_PCM_RAM_WRITE: u8 = 0x68;
const CMD_RF5C68_REG: u8 = 0xB0;
const CMD_GA20_REG: u8 = 0xBF;

// Data block types.
const BLOCK_RF5C68_RAM: u8 = 0xC0;
const BLOCK_GA20_ROM: u8 = 0x93;

// Bit 31 of a chip clock flags a second chip instance, not part of the rate.
const CLOCK_MASK: u32 = 0x7FFF_FFFF;

// Both chips share the original mix balance.
const RF5C68_GAIN: f32 = 1.0;
const GA20_GAIN: f32 = 1.0;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Not playing; position at the start of the song.
    Stopped,
    /// Actively producing frames.
    Playing,
    /// Holding position; renders silence.
    Paused,
}

/// Common control interface for song playback.
pub trait PlaybackController {
    /// Starts or resumes playback.
    fn play(&mut self) -> Result<()>;
    /// Pauses playback, keeping the position.
    fn pause(&mut self) -> Result<()>;
    /// Stops playback and rewinds to the start.
    fn stop(&mut self) -> Result<()>;
    /// Current playback state.
    fn state(&self) -> PlaybackState;
}

/// What a successful load found in the file.
#[derive(Debug, Clone)]
pub struct LoadSummary {
    /// Format revision, e.g. "1.71".
    pub version: String,
    /// Song length in 44100 Hz wait samples.
    pub total_samples: u32,
    /// Whether the song has a loop point.
    pub has_loop: bool,
    /// Names of the chips instantiated for this song.
    pub chips: Vec<&'static str>,
}

/// VGM command-stream player.
///
/// Feed it a whole decompressed (or still gzipped) file with
/// [`load_data`](Self::load_data), then pull interleaved stereo f32 frames
/// with [`render`](Self::render) or [`generate_samples`](Self::generate_samples).
pub struct VgmPlayer {
    data: Vec<u8>,
    pos: usize,
    samples_left: u32,
    done: bool,
    state: PlaybackState,
    mixer: StreamMixer,
    rf5c68: Option<ChipId>,
    ga20: Option<ChipId>,
    header: Option<VgmHeader>,
    gd3: Option<Gd3Tag>,
    loop_start: Option<usize>,
    loop_enabled: bool,
    loops_taken: u32,
    /// `(samples_rendered, wait_carry)` at the previous loop jump; a pass
    /// through the loop that advanced neither will never produce a frame.
    loop_progress: (u64, u32),
    samples_rendered: u64,
    output_rate: u32,
    /// Sub-frame remainder carried between scaled wait commands.
    wait_carry: u32,
}

impl VgmPlayer {
    /// Creates an empty player at the default output rate.
    pub fn new() -> Self {
        Self::with_sample_rate(DEFAULT_SAMPLE_RATE)
    }

    /// Creates an empty player producing frames at `output_rate` Hz.
    pub fn with_sample_rate(output_rate: u32) -> Self {
        Self {
            data: Vec::new(),
            pos: 0,
            samples_left: 0,
            done: false,
            state: PlaybackState::Stopped,
            mixer: StreamMixer::new(master_volume(0)),
            rf5c68: None,
            ga20: None,
            header: None,
            gd3: None,
            loop_start: None,
            loop_enabled: true,
            loops_taken: 0,
            loop_progress: (0, 0),
            samples_rendered: 0,
            output_rate,
            wait_carry: 0,
        }
    }

    /// Loads a VGM image, instantiating a chip lane for every non-zero
    /// chip clock in the header.
    pub fn load_data(&mut self, raw: &[u8]) -> Result<LoadSummary> {
        let data = decompress_if_needed(raw)?;
        let header = VgmHeader::parse(&data)?;

        let mut mixer = StreamMixer::new(master_volume(header.volume_mod));
        let mut chips = Vec::new();
        let mut rf5c68 = None;
        let mut ga20 = None;
        if header.rf5c68_clock != 0 {
            let clock = header.rf5c68_clock & CLOCK_MASK;
            let adapter = RateAdapter::new(clock, rf5c68::CLOCK_DIVIDER, self.output_rate)?;
            rf5c68 = Some(mixer.add_chip(Box::new(Rf5c68::new()), adapter, RF5C68_GAIN));
            chips.push("RF5C68");
        }
        if header.ga20_clock != 0 {
            let clock = header.ga20_clock & CLOCK_MASK;
            let adapter = RateAdapter::new(clock, ga20::CLOCK_DIVIDER, self.output_rate)?;
            ga20 = Some(mixer.add_chip(Box::new(Ga20::new()), adapter, GA20_GAIN));
            chips.push("GA20");
        }

        // A malformed GD3 tag loses the metadata, never the song.
        let gd3 = header
            .gd3_start()
            .filter(|&off| off < data.len())
            .and_then(|off| Gd3Tag::parse(&data[off..]).ok());
        let loop_start = header.loop_start().filter(|&off| off < data.len());

        let summary = LoadSummary {
            version: header.version_string(),
            total_samples: header.total_samples,
            has_loop: loop_start.is_some(),
            chips,
        };

        self.pos = header.data_start();
        self.samples_left = 0;
        self.done = false;
        self.state = PlaybackState::Stopped;
        self.mixer = mixer;
        self.rf5c68 = rf5c68;
        self.ga20 = ga20;
        self.loop_start = loop_start;
        self.loops_taken = 0;
        self.loop_progress = (0, 0);
        self.samples_rendered = 0;
        self.wait_carry = 0;
        self.header = Some(header);
        self.gd3 = gd3;
        self.data = data;
        Ok(summary)
    }

    /// Enables or disables taking the loop at the end command.
    pub fn set_loop_enabled(&mut self, enabled: bool) {
        self.loop_enabled = enabled;
    }

    /// How many times playback has taken the loop.
    pub fn loop_count(&self) -> u32 {
        self.loops_taken
    }

    /// True once the end command has been reached with looping off.
    pub fn finished(&self) -> bool {
        self.done
    }

    /// Parsed header of the loaded song.
    pub fn header(&self) -> Option<&VgmHeader> {
        self.header.as_ref()
    }

    /// GD3 metadata of the loaded song, if the file carried a valid tag.
    pub fn metadata(&self) -> Option<&Gd3Tag> {
        self.gd3.as_ref()
    }

    /// Output frames produced since the last stop.
    pub fn samples_rendered(&self) -> u64 {
        self.samples_rendered
    }

    /// Song length in seconds, not counting loops.
    pub fn duration_seconds(&self) -> f64 {
        match &self.header {
            Some(h) => h.total_samples as f64 / VGM_SAMPLE_RATE as f64,
            None => 0.0,
        }
    }

    /// Current position in seconds since the last stop.
    pub fn position_seconds(&self) -> f64 {
        self.samples_rendered as f64 / self.output_rate as f64
    }

    /// One-line description of the loaded song for display.
    pub fn format_info(&self) -> String {
        let chips: Vec<&str> = [self.rf5c68.map(|_| "RF5C68"), self.ga20.map(|_| "GA20")]
            .into_iter()
            .flatten()
            .collect();
        let title = self
            .gd3
            .as_ref()
            .map(|g| {
                if g.track_name.is_empty() {
                    g.track_name_jp.clone()
                } else {
                    g.track_name.clone()
                }
            })
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "<untitled>".into());
        match &self.header {
            Some(h) => format!(
                "{} | VGM {} | {:.1}s | chips: {}",
                title,
                h.version_string(),
                self.duration_seconds(),
                if chips.is_empty() {
                    "none".into()
                } else {
                    chips.join(", ")
                }
            ),
            None => "no song loaded".into(),
        }
    }

    /// Fills `buffer` with interleaved stereo frames.
    ///
    /// Renders silence when not playing; switches to `Stopped` and pads
    /// with silence when the song ends.
    pub fn render(&mut self, buffer: &mut [f32]) {
        debug_assert!(buffer.len() % 2 == 0, "stereo buffer must be even-sized");
        if self.state != PlaybackState::Playing {
            buffer.fill(0.0);
            return;
        }
        let mut offset = 0usize;
        let mut remaining = buffer.len() / 2;
        while remaining > 0 {
            while !self.done && self.samples_left == 0 {
                self.step_command();
            }
            if self.done {
                buffer[offset..].fill(0.0);
                self.state = PlaybackState::Stopped;
                return;
            }
            let chunk = remaining.min(self.samples_left as usize);
            for _ in 0..chunk {
                let (left, right) = self.mixer.next_frame();
                buffer[offset] = left;
                buffer[offset + 1] = right;
                offset += 2;
            }
            self.samples_left -= chunk as u32;
            self.samples_rendered += chunk as u64;
            remaining -= chunk;
        }
    }

    /// Renders `frames` stereo frames into a fresh buffer.
    pub fn generate_samples(&mut self, frames: usize) -> Vec<f32> {
        let mut buffer = vec![0.0f32; frames * 2];
        self.render(&mut buffer);
        buffer
    }

    fn next_byte(&mut self) -> u8 {
        match self.data.get(self.pos) {
            Some(&byte) => {
                self.pos += 1;
                byte
            }
            None => {
                // Ran off the end without an end command.
                self.done = true;
                0
            }
        }
    }

    fn next_u16(&mut self) -> u16 {
        let lo = self.next_byte() as u16;
        lo | (self.next_byte() as u16) << 8
    }

    fn next_u32(&mut self) -> u32 {
        let lo = self.next_u16() as u32;
        lo | (self.next_u16() as u32) << 16
    }

    fn skip(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.data.len());
    }

    /// Converts a 44100 Hz wait count into output frames, carrying the
    /// sub-frame remainder into the next wait so short waits never drift.
    fn scale_wait(&mut self, samples: u32) -> u32 {
        if self.output_rate == VGM_SAMPLE_RATE {
            return samples;
        }
        let scaled = samples as u64 * self.output_rate as u64 + self.wait_carry as u64;
        self.wait_carry = (scaled % VGM_SAMPLE_RATE as u64) as u32;
        (scaled / VGM_SAMPLE_RATE as u64) as u32
    }

    fn step_command(&mut self) {
        let cmd = self.next_byte();
        if self.done {
            return;
        }
        match cmd {
            CMD_RF5C68_REG => {
                let addr = self.next_byte();
                let data = self.next_byte();
                if let Some(id) = self.rf5c68 {
                    self.mixer.write_register(id, addr, data);
                }
            }
            CMD_GA20_REG => {
                let addr = self.next_byte();
                let data = self.next_byte();
                if let Some(id) = self.ga20 {
                    self.mixer.write_register(id, addr, data);
                }
            }
            CMD_DATA_BLOCK => self.data_block(),
            CMD_WAIT => {
                let n = self.next_u16() as u32;
                self.samples_left = self.scale_wait(n);
            }
            CMD_WAIT_60HZ => self.samples_left = self.scale_wait(VGM_SAMPLE_RATE / 60),
            CMD_WAIT_50HZ => self.samples_left = self.scale_wait(VGM_SAMPLE_RATE / 50),
            0x70..=0x7F => self.samples_left = self.scale_wait((cmd & 0x0F) as u32 + 1),
            // YM2612 DAC byte + wait: the DAC is not modeled, the wait is.
            0x80..=0x8F => self.samples_left = self.scale_wait((cmd & 0x0F) as u32),
            CMD_END => match self.loop_start {
                Some(loop_pos) if self.loop_enabled => {
                    // A loop pass that produced no frames (not even a partial
                    // one) never will; jumping again would spin forever on a
                    // malformed loop point.
                    let progress = (self.samples_rendered, self.wait_carry);
                    if self.loops_taken > 0 && progress == self.loop_progress {
                        self.done = true;
                    } else {
                        self.loop_progress = progress;
                        self.pos = loop_pos;
                        self.loops_taken += 1;
                    }
                }
                _ => self.done = true,
            },
            CMD_PCM_RAM_WRITE => self.skip(11),
            // Unmodeled chips: consume the documented operand widths so the
            // stream stays aligned.
            0x30..=0x3F | 0x4F | 0x50 => self.skip(1),
            0x40..=0x4E | 0x51..=0x5F | 0xA0 | 0xB1..=0xBE => self.skip(2),
            0xC0..=0xDF => self.skip(3),
            0xE0..=0xFF => self.skip(4),
            // DAC stream control commands.
            0x90 | 0x91 | 0x95 => self.skip(4),
            0x92 => self.skip(5),
            0x93 => self.skip(10),
            0x94 => self.skip(1),
            _ => {
                // Unknown opcode: operand width unknowable, stop here.
                self.done = true;
            }
        }
    }

    fn data_block(&mut self) {
        self.next_byte(); // compatibility 0x66
        let block_type = self.next_byte();
        // Bit 31 of the length marks a second-chip block; same payload shape.
        let len = (self.next_u32() & 0x7FFF_FFFF) as usize;
        if self.done {
            return;
        }
        match block_type {
            BLOCK_RF5C68_RAM if len >= 2 => {
                let addr = self.next_u16() as u32;
                let start = self.pos;
                let end = (start + (len - 2)).min(self.data.len());
                if let Some(id) = self.rf5c68 {
                    self.mixer.load_memory(id, addr, &self.data[start..end]);
                }
                self.pos = end;
            }
            BLOCK_GA20_ROM if len >= 8 => {
                let _rom_size = self.next_u32();
                let start_addr = self.next_u32();
                let start = self.pos;
                let end = (start + (len - 8)).min(self.data.len());
                if let Some(id) = self.ga20 {
                    self.mixer.load_memory(id, start_addr, &self.data[start..end]);
                }
                self.pos = end;
            }
            _ => self.skip(len),
        }
    }
}

impl Default for VgmPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackController for VgmPlayer {
    fn play(&mut self) -> Result<()> {
        if self.header.is_none() {
            return Err(VgmError::ConfigError("no song loaded".into()));
        }
        self.state = PlaybackState::Playing;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(header) = &self.header {
            self.pos = header.data_start();
        }
        self.samples_left = 0;
        self.done = false;
        self.loops_taken = 0;
        self.loop_progress = (0, 0);
        self.samples_rendered = 0;
        self.wait_carry = 0;
        self.mixer.reset();
        self.state = PlaybackState::Stopped;
        Ok(())
    }

    fn state(&self) -> PlaybackState {
        self.state
    }
}

/// Loads a song and returns the player ready to play.
pub fn load_song(data: &[u8]) -> Result<(VgmPlayer, LoadSummary)> {
    let mut player = VgmPlayer::new();
    let summary = player.load_data(data)?;
    Ok((player, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const RF5C68_44K_CLOCK: u32 = 384 * 44100;
    const GA20_44K_CLOCK: u32 = 64 * 44100;

    struct ImageBuilder {
        rf5c68_clock: u32,
        ga20_clock: u32,
        loop_to_data: bool,
        loop_at: Option<usize>,
        volume_mod: u8,
        total_samples: u32,
        commands: Vec<u8>,
        gd3: Vec<u8>,
    }

    impl ImageBuilder {
        fn new() -> Self {
            Self {
                rf5c68_clock: 0,
                ga20_clock: 0,
                loop_to_data: false,
                loop_at: None,
                volume_mod: 0,
                total_samples: 44100,
                commands: Vec::new(),
                gd3: Vec::new(),
            }
        }

        fn commands(mut self, commands: &[u8]) -> Self {
            self.commands = commands.to_vec();
            self
        }

        fn build(self) -> Vec<u8> {
            let mut buf = vec![0u8; 0x100];
            let put = |buf: &mut Vec<u8>, off: usize, v: u32| {
                buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
            };
            buf[0..4].copy_from_slice(b"Vgm ");
            put(&mut buf, 0x08, 0x171);
            put(&mut buf, 0x18, self.total_samples);
            if self.loop_to_data {
                put(&mut buf, 0x1C, (0x100 - 0x1C) as u32);
            }
            if let Some(abs) = self.loop_at {
                put(&mut buf, 0x1C, (abs - 0x1C) as u32);
            }
            put(&mut buf, 0x34, (0x100 - 0x34) as u32);
            put(&mut buf, 0x40, self.rf5c68_clock);
            buf[0x7C] = self.volume_mod;
            put(&mut buf, 0xE0, self.ga20_clock);
            buf.extend_from_slice(&self.commands);
            if !self.gd3.is_empty() {
                let off = (buf.len() - 0x14) as u32;
                put(&mut buf, 0x14, off);
                buf.extend_from_slice(&self.gd3);
            }
            buf
        }
    }

    const MASTER: f32 = 0.00005; // master_volume(0)

    #[test]
    fn test_load_instantiates_chips_from_header() {
        let image = ImageBuilder {
            rf5c68_clock: RF5C68_44K_CLOCK,
            ga20_clock: GA20_44K_CLOCK,
            ..ImageBuilder::new()
        }
        .commands(&[0x66])
        .build();
        let (_, summary) = load_song(&image).unwrap();
        assert_eq!(summary.chips, vec!["RF5C68", "GA20"]);
        assert_eq!(summary.version, "1.71");
        assert!(!summary.has_loop);
    }

    #[test]
    fn test_play_requires_loaded_song() {
        let mut player = VgmPlayer::new();
        assert!(player.play().is_err());
    }

    #[test]
    fn test_wait_meters_out_frames_then_stops() {
        let image = ImageBuilder::new().commands(&[0x61, 10, 0, 0x66]).build();
        let (mut player, _) = load_song(&image).unwrap();
        player.play().unwrap();
        let frames = player.generate_samples(32);
        assert_eq!(frames.len(), 64);
        assert!(frames.iter().all(|&s| s == 0.0));
        assert_eq!(player.samples_rendered(), 10);
        assert_eq!(player.state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_fixed_waits() {
        let image = ImageBuilder::new()
            .commands(&[0x62, 0x63, 0x73, 0x84, 0x66])
            .build();
        let (mut player, _) = load_song(&image).unwrap();
        player.play().unwrap();
        player.generate_samples(4096);
        // 735 + 882 + 4 + 4
        assert_eq!(player.samples_rendered(), 735 + 882 + 4 + 4);
    }

    #[test]
    fn test_loop_restarts_stream() {
        let image = ImageBuilder {
            loop_to_data: true,
            ..ImageBuilder::new()
        }
        .commands(&[0x61, 5, 0, 0x66])
        .build();
        let (mut player, summary) = load_song(&image).unwrap();
        assert!(summary.has_loop);
        player.play().unwrap();
        player.generate_samples(23);
        assert_eq!(player.state(), PlaybackState::Playing);
        assert!(player.loop_count() >= 4);
    }

    #[test]
    fn test_loop_point_on_end_command_terminates() {
        // Malformed loop offset resolving to the end command itself: the
        // second jump would render nothing, so playback must finish instead
        // of spinning between the end command and the loop point.
        let image = ImageBuilder {
            loop_at: Some(0x103),
            ..ImageBuilder::new()
        }
        .commands(&[0x61, 2, 0, 0x66])
        .build();
        let (mut player, summary) = load_song(&image).unwrap();
        assert!(summary.has_loop);
        player.play().unwrap();
        player.generate_samples(16);
        assert_eq!(player.samples_rendered(), 2);
        assert_eq!(player.loop_count(), 1);
        assert_eq!(player.state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_register_only_loop_terminates() {
        // A loop region with writes but no waits produces no frames either.
        let image = ImageBuilder {
            rf5c68_clock: RF5C68_44K_CLOCK,
            loop_to_data: true,
            ..ImageBuilder::new()
        }
        .commands(&[0xB0, 0x00, 0xFF, 0x66])
        .build();
        let (mut player, _) = load_song(&image).unwrap();
        player.play().unwrap();
        player.generate_samples(8);
        assert_eq!(player.samples_rendered(), 0);
        assert_eq!(player.state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_loop_can_be_disabled() {
        let image = ImageBuilder {
            loop_to_data: true,
            ..ImageBuilder::new()
        }
        .commands(&[0x61, 5, 0, 0x66])
        .build();
        let (mut player, _) = load_song(&image).unwrap();
        player.set_loop_enabled(false);
        player.play().unwrap();
        player.generate_samples(23);
        assert_eq!(player.state(), PlaybackState::Stopped);
        assert_eq!(player.samples_rendered(), 5);
    }

    #[test]
    fn test_rf5c68_script_produces_expected_frames() {
        let image = ImageBuilder {
            rf5c68_clock: RF5C68_44K_CLOCK,
            ..ImageBuilder::new()
        }
        .commands(&[
            // 4-byte RAM block: start address 0x0000, data 0x81 0x90
            0x67, 0x66, 0xC0, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x81, 0x90,
            // program voice 0: sounding, full envelope/pan, unit step
            0xB0, 0x07, 0xC0,
            0xB0, 0x00, 0xFF,
            0xB0, 0x01, 0xFF,
            0xB0, 0x02, 0x00,
            0xB0, 0x03, 0x08,
            0xB0, 0x06, 0x00,
            0xB0, 0x08, 0xFE,
            0x61, 0x02, 0x00,
            0x66,
        ])
        .build();
        let (mut player, _) = load_song(&image).unwrap();
        player.play().unwrap();
        let frames = player.generate_samples(4);
        // 0x81: positive magnitude 1 -> (1 * 15 * 255) >> 5 = 119
        assert_relative_eq!(frames[0], 119.0 * MASTER);
        assert_relative_eq!(frames[1], 119.0 * MASTER);
        // 0x90: positive magnitude 16 -> 1912
        assert_relative_eq!(frames[2], 1912.0 * MASTER);
        // song over, padded with silence
        assert_eq!(&frames[4..], &[0.0, 0.0, 0.0, 0.0]);
        assert_eq!(player.state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_ga20_rom_block_and_trigger() {
        let image = ImageBuilder {
            ga20_clock: GA20_44K_CLOCK,
            ..ImageBuilder::new()
        }
        .commands(&[
            // 10-byte ROM block: rom_size 0x200, start 0x100, data 0xC0 0x00
            0x67, 0x66, 0x93, 0x0A, 0x00, 0x00, 0x00,
            0x00, 0x02, 0x00, 0x00,
            0x00, 0x01, 0x00, 0x00,
            0xC0, 0x00,
            // voice 0: start 0x0010 -> byte 0x100, unit rate, max volume, trigger
            0xBF, 0x00, 0x10,
            0xBF, 0x01, 0x00,
            0xBF, 0x04, 0xF0,
            0xBF, 0x05, 0xFF,
            0xBF, 0x06, 0x00,
            0x61, 0x02, 0x00,
            0x66,
        ])
        .build();
        let (mut player, _) = load_song(&image).unwrap();
        player.play().unwrap();
        let frames = player.generate_samples(2);
        // (0xC0 - 0x80) * 246 / 4 = 3936 on both sides
        assert_relative_eq!(frames[0], 3936.0 * MASTER);
        assert_relative_eq!(frames[1], 3936.0 * MASTER);
        // second byte is the end marker: silence
        assert_relative_eq!(frames[2], 0.0);
    }

    #[test]
    fn test_unmodeled_commands_keep_stream_aligned() {
        let image = ImageBuilder::new()
            .commands(&[
                0x52, 0x28, 0xF0, // YM2612 write
                0x55, 0x2B, 0x80, // YM2203 write
                0xA0, 0x07, 0x38, // AY8910 write
                0xC0, 0x00, 0x10, 0x7F, // SegaPCM write
                0xE0, 0x00, 0x00, 0x00, 0x00, // PCM seek
                0x61, 0x03, 0x00,
                0x66,
            ])
            .build();
        let (mut player, _) = load_song(&image).unwrap();
        player.play().unwrap();
        player.generate_samples(16);
        assert_eq!(player.samples_rendered(), 3);
        assert_eq!(player.state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_unknown_command_stops_playback() {
        let image = ImageBuilder::new().commands(&[0x65, 0x61, 0x10, 0x00]).build();
        let (mut player, _) = load_song(&image).unwrap();
        player.play().unwrap();
        player.generate_samples(8);
        assert_eq!(player.samples_rendered(), 0);
        assert_eq!(player.state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_missing_end_command_terminates() {
        let image = ImageBuilder::new().commands(&[0x61, 0x02, 0x00]).build();
        let (mut player, _) = load_song(&image).unwrap();
        player.play().unwrap();
        player.generate_samples(8);
        assert_eq!(player.samples_rendered(), 2);
        assert_eq!(player.state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_pause_renders_silence_and_holds_position() {
        let image = ImageBuilder::new().commands(&[0x61, 100, 0, 0x66]).build();
        let (mut player, _) = load_song(&image).unwrap();
        player.play().unwrap();
        player.generate_samples(10);
        assert_eq!(player.samples_rendered(), 10);
        player.pause().unwrap();
        player.generate_samples(10);
        assert_eq!(player.samples_rendered(), 10);
        assert_eq!(player.state(), PlaybackState::Paused);
        player.play().unwrap();
        player.generate_samples(10);
        assert_eq!(player.samples_rendered(), 20);
    }

    #[test]
    fn test_stop_rewinds_playback() {
        let image = ImageBuilder::new().commands(&[0x61, 100, 0, 0x66]).build();
        let (mut player, _) = load_song(&image).unwrap();
        player.play().unwrap();
        player.generate_samples(50);
        player.stop().unwrap();
        assert_eq!(player.samples_rendered(), 0);
        player.play().unwrap();
        player.generate_samples(200);
        assert_eq!(player.samples_rendered(), 100);
    }

    #[test]
    fn test_wait_scaling_at_other_output_rates() {
        let image = ImageBuilder::new().commands(&[0x61, 0x44, 0xAC, 0x66]).build(); // 44100
        let mut player = VgmPlayer::with_sample_rate(22050);
        player.load_data(&image).unwrap();
        player.play().unwrap();
        player.generate_samples(30000);
        assert_eq!(player.samples_rendered(), 22050);
    }

    #[test]
    fn test_short_waits_accumulate_without_drift() {
        // Ten single-sample waits at half rate: each scales to half a frame,
        // so the total must land on exactly five, not ten truncated zeros.
        let mut commands = vec![0x70u8; 10];
        commands.push(0x66);
        let image = ImageBuilder::new().commands(&commands).build();
        let mut player = VgmPlayer::with_sample_rate(22050);
        player.load_data(&image).unwrap();
        player.play().unwrap();
        player.generate_samples(64);
        assert_eq!(player.samples_rendered(), 5);
        assert_eq!(player.state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_metadata_surfaces_gd3() {
        let mut gd3 = Vec::new();
        gd3.extend_from_slice(b"Gd3 ");
        gd3.extend_from_slice(&0x100u32.to_le_bytes());
        let mut payload = Vec::new();
        for field in ["Title", "", "", "", "", "", "Composer", "", "", "", ""] {
            for unit in field.encode_utf16() {
                payload.extend_from_slice(&unit.to_le_bytes());
            }
            payload.extend_from_slice(&[0, 0]);
        }
        gd3.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        gd3.extend_from_slice(&payload);

        let image = ImageBuilder {
            gd3,
            ..ImageBuilder::new()
        }
        .commands(&[0x66])
        .build();
        let (player, _) = load_song(&image).unwrap();
        let tag = player.metadata().unwrap();
        assert_eq!(tag.track_name, "Title");
        assert_eq!(tag.author, "Composer");
        assert!(player.format_info().contains("Title"));
    }
}
