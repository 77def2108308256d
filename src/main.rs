#[cfg(not(feature = "streaming"))]
fn main() {
    eprintln!(
        "The vgmplay CLI requires the \"streaming\" feature. Rebuild with `--features streaming` to enable playback."
    );
}

#[cfg(feature = "streaming")]
mod cli {
    use std::env;
    use std::io::{self, Read, Write};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    use vgmplay::player::{load_song, PlaybackController, PlaybackState};
    use vgmplay::streaming::{
        AudioDevice, RealtimeStream, StreamConfig, BUFFER_BACKOFF_MICROS, DEFAULT_SAMPLE_RATE,
    };
    use vgmplay::VgmFileLoader;

    /// Progress line refresh interval in milliseconds.
    const STATUS_UPDATE_MS: u64 = 50;

    #[cfg(unix)]
    fn restore_terminal_mode() {
        let _ = std::process::Command::new("stty")
            .arg("echo")
            .arg("-raw")
            .status();
    }

    #[cfg(not(unix))]
    fn restore_terminal_mode() {}

    fn print_usage() {
        eprintln!(
            "Usage:\n  vgmplay [--no-loop] [--stable] <file.vgm|file.vgz>\n\nFlags:\n  --no-loop        Play the song once, ignoring its loop point\n  --stable         Use a larger audio buffer (more latency, fewer dropouts)\n  -h, --help       Show this help\n\nKeys during playback:\n  [space]          Pause / resume\n  [q]              Quit\n"
        );
    }

    pub fn run() -> vgmplay::Result<()> {
        println!("VGM Player - RF5C68 / GA20 PCM Playback");
        println!("========================================\n");

        let mut loop_enabled = true;
        let mut stable_buffer = false;
        let mut file_arg: Option<String> = None;
        let mut show_help = false;

        for arg in env::args().skip(1) {
            match arg.as_str() {
                "--no-loop" => loop_enabled = false,
                "--stable" => stable_buffer = true,
                "--help" | "-h" => show_help = true,
                _ if arg.starts_with('-') => {
                    eprintln!("Unknown flag: {}", arg);
                    show_help = true;
                }
                _ => file_arg = Some(arg),
            }
        }

        let file_path = match file_arg {
            Some(path) if !show_help => path,
            _ => {
                print_usage();
                return Ok(());
            }
        };

        println!("Loading file: {}\n", file_path);
        let file_data = VgmFileLoader::load(&file_path)?;
        let (mut vgm_player, summary) = load_song(&file_data)?;
        vgm_player.set_loop_enabled(loop_enabled);

        println!("File Information:");
        println!("  {}", vgm_player.format_info());
        println!("  Format version: {}", summary.version);
        if summary.chips.is_empty() {
            println!("  Chips: none modeled (timing only)");
        } else {
            println!("  Chips: {}", summary.chips.join(", "));
        }
        if summary.has_loop {
            println!(
                "  Loop: yes{}",
                if loop_enabled { "" } else { " (disabled)" }
            );
        } else {
            println!("  Loop: no");
        }
        if let Some(tag) = vgm_player.metadata() {
            if !tag.game_name.is_empty() {
                println!("  Game: {}", tag.game_name);
            }
            if !tag.author.is_empty() {
                println!("  Author: {}", tag.author);
            }
        }
        println!();

        let config = if stable_buffer {
            StreamConfig::stable(DEFAULT_SAMPLE_RATE)
        } else {
            StreamConfig::low_latency(DEFAULT_SAMPLE_RATE)
        };
        println!("Streaming Configuration:");
        println!("  Sample rate: {} Hz", config.sample_rate);
        println!(
            "  Buffer size: {} samples ({:.1}ms latency)",
            config.ring_buffer_size,
            config.latency_ms()
        );
        println!();

        let duration = vgm_player.duration_seconds();
        let player = Arc::new(parking_lot::Mutex::new(vgm_player));

        let streamer = Arc::new(RealtimeStream::new(config)?);
        let audio_device = AudioDevice::new(&config, streamer.buffer())?;
        println!("Audio device initialized - playing to speakers\n");

        let running = Arc::new(AtomicBool::new(true));
        let running_producer = Arc::clone(&running);
        let player_producer = Arc::clone(&player);
        let streamer_producer = Arc::clone(&streamer);

        let producer_thread = std::thread::spawn(move || {
            let mut frame_buffer = vec![0.0f32; 4096];
            {
                let mut guard = player_producer.lock();
                if let Err(e) = guard.play() {
                    eprintln!("Failed to start playback: {}", e);
                    running_producer.store(false, Ordering::Relaxed);
                    return;
                }
            }

            while running_producer.load(Ordering::Relaxed) {
                let (produced, end_of_song) = {
                    let mut guard = player_producer.lock();
                    if guard.state() == PlaybackState::Paused {
                        // Keep the device fed with silence while paused.
                        frame_buffer.fill(0.0);
                        (frame_buffer.len(), false)
                    } else {
                        let before = guard.samples_rendered();
                        guard.render(&mut frame_buffer);
                        let produced = (guard.samples_rendered() - before) as usize * 2;
                        (produced, guard.state() == PlaybackState::Stopped)
                    }
                };
                if produced > 0 {
                    streamer_producer.write_blocking(&frame_buffer[..produced]);
                } else if !end_of_song {
                    std::thread::sleep(std::time::Duration::from_micros(BUFFER_BACKOFF_MICROS));
                }
                if end_of_song {
                    break;
                }
            }
            running_producer.store(false, Ordering::Relaxed);
        });

        println!("Playback running — keys: [space]=pause/resume, [q]=quit\n");
        let playback_start = Instant::now();

        let (tx, rx) = std::sync::mpsc::channel::<u8>();
        let input_running = Arc::new(AtomicBool::new(true));
        let input_running_thread = Arc::clone(&input_running);
        std::thread::spawn(move || {
            #[cfg(unix)]
            let _ = std::process::Command::new("stty")
                .arg("-echo")
                .arg("raw")
                .status();
            let mut stdin = io::stdin();
            let mut buf = [0u8; 1];
            while input_running_thread.load(Ordering::Relaxed) {
                if stdin.read_exact(&mut buf).is_ok() {
                    let _ = tx.send(buf[0]);
                    if buf[0] == b'\x03' {
                        break;
                    }
                }
            }
            #[cfg(unix)]
            let _ = std::process::Command::new("stty")
                .arg("echo")
                .arg("-raw")
                .status();
        });

        loop {
            std::thread::sleep(std::time::Duration::from_millis(STATUS_UPDATE_MS));

            while let Ok(key) = rx.try_recv() {
                match key {
                    b' ' => {
                        let mut guard = player.lock();
                        match guard.state() {
                            PlaybackState::Playing => {
                                let _ = guard.pause();
                            }
                            PlaybackState::Paused => {
                                let _ = guard.play();
                            }
                            PlaybackState::Stopped => {}
                        }
                    }
                    b'q' | b'Q' | b'\x03' => {
                        running.store(false, Ordering::Relaxed);
                    }
                    _ => {}
                }
            }

            let (position, loops, state) = {
                let guard = player.lock();
                (guard.position_seconds(), guard.loop_count(), guard.state())
            };
            let progress = if duration > 0.0 {
                (position / duration * 100.0).min(100.0)
            } else {
                0.0
            };
            print!(
                "\x1B[2K\r[{:>6.1}s] {:>5.1}% | loops: {} | buffer: {:>5.1}% | overruns: {} {}",
                position,
                progress,
                loops,
                streamer.fill_percentage() * 100.0,
                streamer.stats().overrun_count,
                if state == PlaybackState::Paused {
                    "(paused)"
                } else {
                    ""
                },
            );
            io::stdout().flush().ok();

            if !running.load(Ordering::Relaxed) {
                break;
            }
        }

        restore_terminal_mode();
        println!();

        running.store(false, Ordering::Relaxed);
        input_running.store(false, Ordering::Relaxed);
        producer_thread
            .join()
            .expect("Producer thread panicked during shutdown");
        audio_device.finish();

        let total_time = playback_start.elapsed();
        let final_stats = streamer.stats();
        let final_position = player.lock().position_seconds();

        println!("\n=== Playback Statistics ===");
        println!("Wall time:         {:.2} seconds", total_time.as_secs_f32());
        println!("Song position:     {:.2} seconds", final_position);
        println!("Samples streamed:  {}", final_stats.samples_written);
        println!("Overrun events:    {}", final_stats.overrun_count);
        println!("Underrun events:   {}", final_stats.underrun_count);
        println!("Buffer latency:    {:.1} ms", config.latency_ms());
        println!(
            "Memory used:       {} bytes (ring buffer)",
            config.ring_buffer_size * std::mem::size_of::<f32>()
        );
        println!("\nPlayback complete!");

        Ok(())
    }
}

#[cfg(feature = "streaming")]
fn main() -> vgmplay::Result<()> {
    cli::run()
}
