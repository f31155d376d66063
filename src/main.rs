//! HMICB CLI - Decode and play HMICB animations in the terminal.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use hmicb::{
    animation::{AnimationHeader, AnimationWriter, PlaybackController, WriterConfig},
    render::Canvas,
    schema::PlayerConfig,
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <file.hmicb> [config.json] [ticks]", args[0]);
        eprintln!();
        eprintln!("Play an HMICB animation as ASCII frames.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  file.hmicb   Animation to play");
        eprintln!("  config.json  Player configuration (see --example)");
        eprintln!("  ticks        Ticks to run (default: one pass over the frames)");
        eprintln!();
        eprintln!("Other commands:");
        eprintln!("  --example           Print the default player configuration");
        eprintln!("  --demo <out.hmicb>  Write a small demo animation");
        std::process::exit(1);
    }

    match args[1].as_str() {
        "--example" => {
            print_example_config();
            return;
        }
        "--demo" => {
            let Some(out) = args.get(2) else {
                eprintln!("--demo needs an output path");
                std::process::exit(1);
            };
            write_demo(&PathBuf::from(out));
            return;
        }
        _ => {}
    }

    let anim_path = PathBuf::from(&args[1]);

    // Optional config path, then optional tick count
    let mut rest = args[2..].iter();
    let mut config = PlayerConfig::default();
    let mut ticks: Option<u64> = None;
    if let Some(arg) = rest.next() {
        match arg.parse::<u64>() {
            Ok(n) => ticks = Some(n),
            Err(_) => {
                config = load_config(&PathBuf::from(arg));
                ticks = rest.next().and_then(|s| s.parse().ok());
            }
        }
    }

    if let Err(e) = config.validate() {
        eprintln!("Invalid config: {}", e);
        std::process::exit(1);
    }

    let bytes = fs::read(&anim_path).unwrap_or_else(|e| {
        eprintln!("Error reading animation file: {}", e);
        std::process::exit(1);
    });

    let (width, height) = AnimationHeader::from_bytes(&bytes)
        .map(|h| (h.width, h.height))
        .unwrap_or((0, 0));

    let mut player = PlaybackController::with_config(Canvas::new(width, height), config);
    let handle = player.load(&bytes).unwrap_or_else(|e| {
        eprintln!("Error decoding animation: {}", e);
        std::process::exit(1);
    });

    println!("HMICB Animation");
    println!("===============");
    println!("File: {}", anim_path.display());
    println!("Version: {}", handle.header.version);
    println!("Size: {}x{}", handle.header.width, handle.header.height);
    println!("Frames: {}", handle.frame_count);
    println!(
        "Frame rate: {} fps declared, {:?}/frame",
        handle.header.frame_rate, handle.interval
    );
    println!("Loop: {}", handle.looping);
    println!();
    print!("{}", player.renderer().to_ascii());
    println!();

    let max_ticks = ticks.unwrap_or(handle.frame_count as u64);

    player.play();
    let start = Instant::now();
    let mut last = start;
    let mut ticks_run = 0u64;

    while player.is_playing() && ticks_run < max_ticks {
        std::thread::sleep(handle.interval);
        let now = Instant::now();
        let ran = player.advance(now - last);
        last = now;

        if ran > 0 {
            ticks_run += ran as u64;
            println!("-- tick {} (next frame {}) --", ticks_run, player.cursor());
            print!("{}", player.renderer().to_ascii());
        }
    }
    player.pause();

    let elapsed = start.elapsed();
    println!();
    println!(
        "Played {} ticks in {:.2}s ({:.1} ticks/s)",
        ticks_run,
        elapsed.as_secs_f32(),
        ticks_run as f32 / elapsed.as_secs_f32().max(f32::EPSILON)
    );
}

fn load_config(path: &Path) -> PlayerConfig {
    let config_str = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    })
}

fn print_example_config() {
    let config = PlayerConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}

/// A dot bouncing across a dim floor.
fn write_demo(path: &Path) {
    const W: u16 = 16;
    const H: u16 = 8;
    const FRAMES: usize = 16;

    let mut writer = AnimationWriter::new(W, H, 12, true, WriterConfig::default());

    for i in 0..FRAMES {
        let mut pixels = vec![0u8; W as usize * H as usize * 4];
        for x in 0..W as usize {
            let at = ((H as usize - 1) * W as usize + x) * 4;
            pixels[at..at + 4].copy_from_slice(&[60, 60, 60, 255]);
        }

        let x = i % W as usize;
        let bounce = [0, 2, 4, 5, 6, 5, 4, 2][i % 8];
        let y = H as usize - 2 - bounce;
        let at = (y * W as usize + x) * 4;
        pixels[at..at + 4].copy_from_slice(&[255, 255, 255, 255]);

        if let Err(e) = writer.push_frame(&pixels) {
            eprintln!("Error encoding frame {}: {}", i, e);
            std::process::exit(1);
        }
    }

    match writer.save(path) {
        Ok(stats) => println!("Wrote {}: {}", path.display(), stats),
        Err(e) => {
            eprintln!("Error writing {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}
