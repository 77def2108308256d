//! End-to-end playback tests against in-memory VGM images.

use approx::assert_relative_eq;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use vgmplay::player::{load_song, PlaybackController, PlaybackState};
use vgmplay::{decompress_if_needed, master_volume};

const RF5C68_44K_CLOCK: u32 = 384 * 44100;
const GA20_44K_CLOCK: u32 = 64 * 44100;

fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn build_image(rf_clock: u32, ga_clock: u32, volume_mod: u8, commands: &[u8]) -> Vec<u8> {
    let mut buf = vec![0u8; 0x100];
    buf[0..4].copy_from_slice(b"Vgm ");
    put_u32(&mut buf, 0x08, 0x171);
    put_u32(&mut buf, 0x18, 44100);
    put_u32(&mut buf, 0x34, 0x100 - 0x34);
    put_u32(&mut buf, 0x40, rf_clock);
    buf[0x7C] = volume_mod;
    put_u32(&mut buf, 0xE0, ga_clock);
    buf.extend_from_slice(commands);
    buf
}

/// RF5C68 script: load two wave bytes, key one voice at unit rate, full
/// envelope and pan, wait two frames, end.
fn rf5c68_commands() -> Vec<u8> {
    vec![
        0x67, 0x66, 0xC0, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x81, 0x90, // RAM block
        0xB0, 0x07, 0xC0, // sounding, channel bank 0
        0xB0, 0x00, 0xFF, // envelope
        0xB0, 0x01, 0xFF, // pan
        0xB0, 0x02, 0x00, // step lo
        0xB0, 0x03, 0x08, // step hi (unit)
        0xB0, 0x06, 0x00, // start page
        0xB0, 0x08, 0xFE, // key voice 0 on
        0x61, 0x02, 0x00, // wait 2
        0x66,
    ]
}

#[test]
fn rf5c68_frames_are_sample_exact() {
    let image = build_image(RF5C68_44K_CLOCK, 0, 0, &rf5c68_commands());
    let (mut player, summary) = load_song(&image).unwrap();
    assert_eq!(summary.chips, vec!["RF5C68"]);
    player.play().unwrap();

    let master = master_volume(0);
    let frames = player.generate_samples(4);
    // 0x81 decodes to (1 * 15 * 255) >> 5 = 119 on both sides.
    assert_relative_eq!(frames[0], 119.0 * master);
    assert_relative_eq!(frames[1], 119.0 * master);
    // 0x90 decodes to (16 * 15 * 255) >> 5 = 1912.
    assert_relative_eq!(frames[2], 1912.0 * master);
    assert_relative_eq!(frames[3], 1912.0 * master);
    // Silence after the end command.
    assert_eq!(&frames[4..], &[0.0; 4]);
    assert_eq!(player.state(), PlaybackState::Stopped);
}

#[test]
fn gzipped_image_plays_identically() {
    let image = build_image(RF5C68_44K_CLOCK, 0, 0, &rf5c68_commands());
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&image).unwrap();
    let compressed = encoder.finish().unwrap();
    assert_eq!(decompress_if_needed(&compressed).unwrap(), image);

    let (mut plain, _) = load_song(&image).unwrap();
    let (mut packed, _) = load_song(&compressed).unwrap();
    plain.play().unwrap();
    packed.play().unwrap();
    assert_eq!(plain.generate_samples(8), packed.generate_samples(8));
}

#[test]
fn both_chips_mix_into_one_stream() {
    let mut commands = vec![
        // GA20 ROM block: two bytes at 0x100.
        0x67, 0x66, 0x93, 0x0A, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x01, 0x00,
        0x00, 0xC0, 0x00, // voice 0 of the GA20: start 0x0010, unit rate, max volume
        0xBF, 0x00, 0x10, 0xBF, 0x01, 0x00, 0xBF, 0x04, 0xF0, 0xBF, 0x05, 0xFF, 0xBF, 0x06,
        0x00,
    ];
    commands.extend_from_slice(&rf5c68_commands());
    let image = build_image(RF5C68_44K_CLOCK, GA20_44K_CLOCK, 0, &commands);

    let (mut player, summary) = load_song(&image).unwrap();
    assert_eq!(summary.chips, vec!["RF5C68", "GA20"]);
    player.play().unwrap();

    let master = master_volume(0);
    let frames = player.generate_samples(2);
    // RF5C68 contributes 119, the GA20 voice (0xC0 - 0x80) * 246 / 4 = 3936.
    assert_relative_eq!(frames[0], (119.0 + 3936.0) * master);
    assert_relative_eq!(frames[1], (119.0 + 3936.0) * master);
    // Frame 2: RF5C68 plays 0x90, the GA20 voice hits its end marker.
    assert_relative_eq!(frames[2], 1912.0 * master);
}

#[test]
fn volume_modifier_scales_output() {
    let image = build_image(RF5C68_44K_CLOCK, 0, 0x40, &rf5c68_commands());
    let (mut player, _) = load_song(&image).unwrap();
    player.play().unwrap();
    let frames = player.generate_samples(1);
    // 0x40 doubles the baseline gain.
    assert_relative_eq!(frames[0], 119.0 * master_volume(0x40));
    assert_relative_eq!(frames[0] / (119.0 * master_volume(0)), 2.0);
}

#[test]
fn looped_song_plays_past_its_end() {
    let mut image = build_image(RF5C68_44K_CLOCK, 0, 0, &rf5c68_commands());
    // Loop back to the start of the command stream.
    put_u32(&mut image, 0x1C, 0x100 - 0x1C);
    let (mut player, summary) = load_song(&image).unwrap();
    assert!(summary.has_loop);
    player.play().unwrap();

    let master = master_volume(0);
    let frames = player.generate_samples(6);
    assert_eq!(player.state(), PlaybackState::Playing);
    assert!(player.loop_count() >= 2);
    // Every odd frame replays the first wave byte.
    assert_relative_eq!(frames[0], 119.0 * master);
    assert_relative_eq!(frames[4], 119.0 * master);
    assert_relative_eq!(frames[8], 119.0 * master);
}

#[test]
fn half_rate_chip_holds_frames() {
    // RF5C68 clocked at half the output rate: each native frame is held
    // for two output frames, with silence in the very first frame.
    let mut commands = rf5c68_commands();
    let wait_lo = commands.len() - 3;
    commands[wait_lo] = 0x04; // stretch the wait to cover four output frames
    let image = build_image(RF5C68_44K_CLOCK / 2, 0, 0, &commands);
    let (mut player, _) = load_song(&image).unwrap();
    player.play().unwrap();

    let master = master_volume(0);
    let frames = player.generate_samples(4);
    assert_relative_eq!(frames[0], 0.0);
    assert_relative_eq!(frames[2], 119.0 * master);
    assert_relative_eq!(frames[4], 119.0 * master);
    assert_relative_eq!(frames[6], 1912.0 * master);
}
