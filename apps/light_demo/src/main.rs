//! Light demo application
//!
//! Runs a headless frame loop over a small scene: a sun, a sweeping spot
//! light and two point lights casting onto a handful of boxes. A background
//! timer flickers the point lights, which exercises the frame-dirty protocol.
//!
//! Usage: light_demo [config.toml|config.ron] [--frames N]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use umbra_engine::foundation::logging;
use umbra_engine::prelude::*;

const DEFAULT_FRAMES: u64 = 120;

struct Args {
    config: Option<String>,
    frames: u64,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        config: None,
        frames: DEFAULT_FRAMES,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--frames" {
            let value = iter.next().ok_or("--frames needs a value")?;
            args.frames = value.parse().map_err(|_| format!("invalid frame count '{}'", value))?;
        } else {
            args.config = Some(arg);
        }
    }
    Ok(args)
}

fn build_scene(
    config: &ApplicationConfig,
    device: &mut HeadlessDevice,
) -> Result<(LightingSystem, LightKey, Vec<LightKey>), LightError> {
    let shadows = config.lighting.shadows;
    let mut lighting = LightingSystem::new(&config.lighting);

    let sun = LightDesc::directional(Vec3::new(0.4, -1.0, 0.3), Vec3::new(1.0, 0.95, 0.85))
        .with_name("Sun")
        .with_position(Vec3::new(-12.0, 30.0, -9.0))
        .with_falloff(1.0, 60.0)
        .with_shadow_settings(shadows);
    lighting.add_light(Light::new(sun, device)?);

    let spot = LightDesc::spot(
        Vec3::new(0.0, 8.0, 6.0),
        Vec3::new(0.0, -1.0, -0.6),
        Vec3::new(2.0, 1.8, 1.5),
        0.5,
        25.0,
    )
    .with_name("Stage Spot")
    .with_shadow_settings(shadows);
    let spot = lighting.add_light(Light::new(spot, device)?);

    let mut bulbs = Vec::new();
    for (i, position) in [Vec3::new(-4.0, 2.0, 0.0), Vec3::new(4.0, 2.0, 0.0)].into_iter().enumerate() {
        let bulb = LightDesc::point(position, Vec3::new(0.9, 0.4, 0.2), 0.5, 8.0).with_name(format!("Bulb {}", i));
        bulbs.push(lighting.add_light(Light::new(bulb, device)?));
    }

    Ok((lighting, spot, bulbs))
}

fn scene_casters() -> Vec<ShadowCaster> {
    vec![
        ShadowCaster::new(AABB::new(Vec3::new(-20.0, -0.5, -20.0), Vec3::new(20.0, 0.0, 20.0))),
        ShadowCaster::new(AABB::from_center_extents(Vec3::new(0.0, 1.0, 0.0), Vec3::repeat(1.0))).with_instances(4),
        ShadowCaster::new(AABB::from_center_extents(Vec3::new(6.0, 0.5, -3.0), Vec3::repeat(0.5))),
        ShadowCaster::new(AABB::from_center_extents(Vec3::new(0.0, 1.0, 80.0), Vec3::repeat(1.0))),
    ]
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => ApplicationConfig::load_from_file(path)?,
        None => ApplicationConfig::default(),
    };
    config.validate()?;
    logging::init_with_level(&config.engine.log_level);
    log::info!("Starting light demo for {} frames", args.frames);

    let mut device = HeadlessDevice::new();
    let mut encoder = RecordingEncoder::new();
    let (mut lighting, spot, bulbs) = build_scene(&config, &mut device)?;
    let casters = scene_casters();
    let mut frames: FrameResources<LightingFrame> = FrameResources::default();

    // Flicker pulses arrive from a timer thread; the frame loop applies them
    let pulses = Arc::new(AtomicU32::new(0));
    let mut timer = Timer::new();
    let flicker = {
        let pulses = Arc::clone(&pulses);
        timer.schedule_repeating(move || { pulses.fetch_add(1, Ordering::Relaxed); }, Duration::from_millis(40))?
    };
    let warmup = timer.schedule_once(|| log::info!("Warm-up finished"), Duration::from_millis(100))?;

    let frame_time = config.engine.target_fps.map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps.max(1))));
    let mut clock = FrameClock::new();
    let stopwatch = Stopwatch::start_new();
    let mut seen_pulses = 0;
    let (mut written, mut skipped, mut draws) = (0, 0, 0);

    for frame in 0..args.frames {
        clock.tick();

        let pulse = pulses.load(Ordering::Relaxed);
        if pulse != seen_pulses {
            seen_pulses = pulse;
            let level = if pulse % 2 == 0 { 0.9 } else { 0.6 };
            for key in &bulbs {
                if let Some(bulb) = lighting.light_mut(*key) {
                    bulb.set_strength(Vec3::new(level, level * 0.45, level * 0.2));
                }
            }
        }

        if frame % 30 == 0 {
            if let Some(light) = lighting.light_mut(spot) {
                let angle = frame as f32 * 0.05;
                light.set_direction(Vec3::new(angle.sin() * 0.5, -1.0, -angle.cos() * 0.6))?;
            }
        }

        let stats = lighting.update_frame(&mut frames);
        draws += lighting.render_shadows(&mut encoder, &casters)?;
        written += stats.written;
        skipped += stats.skipped;
        if config.engine.debug_mode {
            log::debug!(
                "Frame {} slot {}: {} written, {} skipped, {} shadow passes",
                frame,
                frames.current_index(),
                stats.written,
                stats.skipped,
                encoder.shadow_pass_count()
            );
        }
        encoder.clear();
        frames.advance();

        if let Some(frame_time) = frame_time {
            std::thread::sleep(frame_time);
        }
    }

    timer.cancel();
    let flicker_count = flicker.join()?;
    warmup.join()?;
    lighting.release(&mut device);

    log::info!(
        "Rendered {} frames in {:.1} ms ({:.0} fps average)",
        clock.frame_count(),
        stopwatch.elapsed_millis(),
        clock.average_fps()
    );
    log::info!(
        "Light slots: {} written, {} skipped; {} shadow caster draws; {} flicker pulses",
        written,
        skipped,
        draws,
        flicker_count
    );
    if device.live_resources() != 0 {
        log::warn!("{} shadow resources leaked", device.live_resources());
    }
    Ok(())
}

fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!("Usage: light_demo [config.toml|config.ron] [--frames N]");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&args) {
        log::error!("Light demo failed: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
