//! Entry point for the room-canvas viewer.

use anyhow::{Context, Result};
use clap::Parser;
use room_canvas::{
    app::App,
    config::{Cli, RendererConfig},
    events::RendererEvent,
    labels::candidates::CandidateSet,
    sensors::timeseries::{Lookup, SensorFeed},
};
use std::{fs, path::Path, sync::Arc};
use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

fn load_config(cli: &Cli) -> Result<RendererConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config '{}'", path.display()))?;
            RendererConfig::from_json(&text)
                .with_context(|| format!("invalid config '{}'", path.display()))?
        }
        None => RendererConfig::default(),
    };
    if cli.asset_root.is_some() {
        config.asset_content_root = cli.asset_root.clone();
    }
    config.multi_frame_number = cli.multi_frame_number;
    Ok(config)
}

/// Fills sensor values, asset values and labels from a time-series file.
fn apply_sensor_feed(config: &mut RendererConfig, cli: &Cli, path: &Path) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read sensor feed '{}'", path.display()))?;
    let feed = SensorFeed::from_json(&text)
        .with_context(|| format!("invalid sensor feed '{}'", path.display()))?;

    let Some(at) = cli.at.or_else(|| feed.latest_timestamp()) else {
        log::warn!("sensor feed '{}' has no samples", path.display());
        return Ok(());
    };
    let lookup = if cli.derivative {
        Lookup::FirstDerivative
    } else if cli.interpolate {
        Lookup::Interpolate
    } else {
        Lookup::Nearest
    };

    let snapshot = feed.snapshot(at, lookup);
    log::info!(
        "sensor feed at {}: {} sensors, {} assets",
        at,
        snapshot.sensor_values.len(),
        snapshot.asset_values.len()
    );
    config.sensor_values = snapshot.sensor_values;
    config.asset_values = snapshot.asset_values;
    config.sensor_value_labels = snapshot.labels;
    Ok(())
}

fn load_candidates(path: Option<&Path>) -> CandidateSet {
    let Some(path) = path else {
        return CandidateSet::bundled();
    };
    let loaded = fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|text| Ok(CandidateSet::from_json(&text)?));
    match loaded {
        Ok(candidates) => {
            log::info!("{} sensors with labelling positions", candidates.len());
            candidates
        }
        Err(e) => {
            log::error!("labelling positions '{}': {:#}", path.display(), e);
            CandidateSet::bundled()
        }
    }
}

fn log_event(event: &RendererEvent) {
    match event {
        RendererEvent::CameraChanged { eye, center, up } => {
            log::debug!("camera eye={:?} center={:?} up={:?}", eye, center, up)
        }
        RendererEvent::Hover(Some(hover)) => {
            log::debug!("hover '{}' at [{}, {}]", hover.label, hover.x, hover.y)
        }
        RendererEvent::Hover(None) => log::debug!("hover cleared"),
        RendererEvent::LoadingFinished => log::info!("all scene assets resolved"),
    }
}

fn main() -> Result<()> {
    // Initialize logging; default to "info" if RUST_LOG is unset.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = load_config(&cli)?;
    if let Some(path) = &cli.sensors {
        if let Err(err) = apply_sensor_feed(&mut config, &cli, path) {
            log::error!("{:#}", err);
        }
    }
    let candidates = load_candidates(cli.labelling_positions.as_deref());

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Room Canvas")
            .with_inner_size(winit::dpi::LogicalSize::new(cli.width, cli.height))
            .build(&event_loop)?,
    );

    let mut app = pollster::block_on(App::new(window.clone(), config, candidates))?;
    app.renderer.load_scene(cli.scene.clone());
    if let Some(hierarchy) = &cli.hierarchy {
        app.renderer.load_hierarchy(hierarchy.clone());
    }
    let events = app.renderer.subscribe();

    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => {
                if !app.handle_event(&window, &event) {
                    match event {
                        WindowEvent::CloseRequested => elwt.exit(),
                        WindowEvent::KeyboardInput { event, .. } => {
                            if event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                                elwt.exit();
                            }
                        }
                        WindowEvent::RedrawRequested => match app.render(&window) {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost) => {
                                app.resize(app.renderer.gfx.size);
                            }
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                log::error!("WGPU out of memory – exiting.");
                                elwt.exit();
                            }
                            Err(e) => log::error!("Render error: {:?}", e),
                        },
                        _ => {}
                    }
                }
            }
            Event::AboutToWait => {
                for event in events.try_iter() {
                    log_event(&event);
                }
                window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
