//! Pi Time-lapse - command line front end.
//!
//! Serves the web interface (optionally with the button menu) or runs a
//! single headless time-lapse.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use futures_util::StreamExt;
use pi_timelapse::buttons::{spawn_button_loop, DefaultButtonPad, BUTTON_POLL_INTERVAL};
use pi_timelapse::{
    start_web_server, CameraSettings, ControllerOptions, RpiCamera, RunState, SimulatedCamera,
    TimelapseConfig, TimelapseController, WebConfig, DEFAULT_STATUS_PUSH_MS, DEFAULT_TICK_MS,
    DEFAULT_WEB_PORT,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Capture latency of the simulated camera.
const SIMULATED_LATENCY: Duration = Duration::from_millis(200);

#[derive(Parser)]
#[command(name = "pi_timelapse")]
#[command(about = "Raspberry Pi time-lapse camera controller")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "Takes a fixed number of photos at a fixed interval, controlled from buttons or a web page")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory that run directories are created in
    #[arg(short, long, default_value = ".", global = true)]
    output_dir: PathBuf,

    /// Use a simulated camera instead of rpicam-still
    #[arg(long, global = true)]
    simulate: bool,

    /// Still capture program (e.g. libcamera-still)
    #[arg(long, global = true)]
    still_program: Option<String>,

    /// TOML file with camera settings
    #[arg(long, global = true)]
    camera_config: Option<PathBuf>,

    /// Cancellation tick in milliseconds
    #[arg(long, default_value_t = DEFAULT_TICK_MS, global = true)]
    tick_ms: u64,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server (default)
    Serve(ServeArgs),

    /// Run one time-lapse and exit; Ctrl-C stops it
    Run(RunArgs),

    /// Show camera settings and controller options
    Info(InfoArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Web server bind address
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Web server port
    #[arg(short, long, default_value_t = DEFAULT_WEB_PORT)]
    port: u16,

    /// Disable CORS headers
    #[arg(long)]
    no_cors: bool,

    /// Maximum WebSocket connections
    #[arg(long, default_value_t = 100)]
    max_connections: usize,

    /// WebSocket status push interval in milliseconds
    #[arg(long, default_value_t = DEFAULT_STATUS_PUSH_MS)]
    push_ms: u64,

    /// Drive the controller from the GPIO button menu as well
    #[arg(long)]
    buttons: bool,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_WEB_PORT,
            no_cors: false,
            max_connections: 100,
            push_ms: DEFAULT_STATUS_PUSH_MS,
            buttons: false,
        }
    }
}

#[derive(Args)]
struct RunArgs {
    /// Seconds between the starts of consecutive captures
    #[arg(short, long, default_value_t = 10.0)]
    interval: f64,

    /// Number of images to take
    #[arg(short = 'n', long, default_value_t = 4)]
    count: u32,

    /// Run directory name (defaults to the start time)
    #[arg(long)]
    name: Option<String>,
}

#[derive(Args)]
struct InfoArgs {
    /// Output format: json or pretty
    #[arg(short, long, default_value = "pretty")]
    format: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    match &cli.command {
        Some(Commands::Serve(args)) => serve_command(&cli, args).await?,
        Some(Commands::Run(args)) => run_command(&cli, args).await?,
        Some(Commands::Info(args)) => info_command(&cli, args)?,
        None => serve_command(&cli, &ServeArgs::default()).await?,
    }

    Ok(())
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn controller_options(cli: &Cli) -> ControllerOptions {
    ControllerOptions::new(&cli.output_dir).with_tick_ms(cli.tick_ms)
}

fn load_camera_settings(cli: &Cli) -> anyhow::Result<CameraSettings> {
    let Some(path) = &cli.camera_config else {
        return Ok(CameraSettings::default());
    };
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("reading camera settings from {}", path.display()))?;
    let settings: CameraSettings = toml::from_str(&body)
        .with_context(|| format!("parsing camera settings in {}", path.display()))?;
    settings.validate()?;
    Ok(settings)
}

fn build_controller(cli: &Cli) -> anyhow::Result<TimelapseController> {
    let options = controller_options(cli);
    let settings = load_camera_settings(cli)?;

    let controller = if cli.simulate {
        info!("Using simulated camera");
        let camera = SimulatedCamera::new()
            .with_settings(settings)
            .with_latency(SIMULATED_LATENCY);
        TimelapseController::new(camera, options)?
    } else {
        let mut camera = RpiCamera::new(settings);
        if let Some(program) = &cli.still_program {
            camera = camera.with_program(program.clone());
        }
        TimelapseController::new(camera, options)?
    };

    Ok(controller)
}

async fn serve_command(cli: &Cli, args: &ServeArgs) -> anyhow::Result<()> {
    std::fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("creating output directory {}", cli.output_dir.display()))?;
    let controller = Arc::new(build_controller(cli)?);

    let web_config = WebConfig::new(&args.host, args.port)
        .with_cors(!args.no_cors)
        .with_max_websocket_connections(args.max_connections)
        .with_status_push_ms(args.push_ms)
        .with_captures_path(Some(cli.output_dir.clone()));

    let buttons = if args.buttons {
        let pad = DefaultButtonPad::new()?;
        if cfg!(not(feature = "gpio")) {
            warn!("GPIO support not compiled in, buttons will not respond");
        }
        Some(spawn_button_loop(
            pad,
            controller.clone(),
            BUTTON_POLL_INTERVAL,
        ))
    } else {
        None
    };

    info!("Web server configuration:");
    info!("  - Bind address: {}", web_config.bind_address());
    info!("  - CORS enabled: {}", web_config.enable_cors);
    info!("  - Max WebSocket connections: {}", args.max_connections);
    info!("  - Status push interval: {}ms", args.push_ms);
    info!("  - Output directory: {}", cli.output_dir.display());

    let result = start_web_server(web_config, controller.clone()).await;

    if let Some(task) = buttons {
        task.abort();
    }
    controller.stop();
    result?;

    Ok(())
}

async fn run_command(cli: &Cli, args: &RunArgs) -> anyhow::Result<()> {
    let controller = build_controller(cli)?;

    let mut config = TimelapseConfig::from_secs_f64(args.interval, args.count)?;
    if let Some(name) = &args.name {
        config = config.with_name(name.clone());
    }
    let planned = config.planned_duration();

    let handle = controller.start(config)?;
    let started = handle.status();
    println!(
        "Time-lapse {} started: {} images every {}s into {} (about {}s)",
        handle.run_id(),
        args.count,
        args.interval,
        started.destination_name.as_deref().unwrap_or("?"),
        planned.as_secs()
    );

    let mut updates = controller.status_stream();
    let mut last_taken = 0;
    loop {
        tokio::select! {
            update = updates.next() => {
                let Some(status) = update else { break };
                if status.images_taken != last_taken {
                    last_taken = status.images_taken;
                    println!("{}", status.summary());
                }
                if status.state.is_terminal() {
                    break;
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("waiting for Ctrl-C")?;
                println!("Stopping...");
                handle.stop();
            }
        }
    }

    let status = handle.join().await?;
    println!("{}", status);
    if status.state == RunState::Failed {
        bail!(
            "time-lapse failed: {}",
            status.last_error.unwrap_or_else(|| "unknown error".to_string())
        );
    }

    Ok(())
}

fn info_command(cli: &Cli, args: &InfoArgs) -> anyhow::Result<()> {
    let options = controller_options(cli);
    let settings = load_camera_settings(cli)?;

    match args.format.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&serde_json::json!({
                "options": options,
                "camera": settings,
            }))?;
            println!("{}", json);
        }
        "pretty" => print_pretty_info(&options, &settings),
        other => bail!("Unsupported format: {}. Use 'json' or 'pretty'", other),
    }

    Ok(())
}

fn print_pretty_info(options: &ControllerOptions, settings: &CameraSettings) {
    println!("Pi Time-lapse {}", env!("CARGO_PKG_VERSION"));
    println!("==========================");
    println!();

    println!("Controller:");
    println!("  Output root: {}", options.output_root.display());
    println!("  Tick: {}ms", options.tick_ms);
    println!("  Run name format: {}", options.name_format);
    println!("  Image extension: {}", options.image_extension);
    println!();

    println!("Camera:");
    println!("  Resolution: {}x{}", settings.width, settings.height);
    if settings.iso == 0 {
        println!("  ISO: auto");
    } else {
        println!("  ISO: {}", settings.iso);
    }
    if settings.shutter_speed_us == 0 {
        println!("  Shutter: auto");
    } else {
        println!("  Shutter: {}us", settings.shutter_speed_us);
    }
    println!("  Brightness: {}", settings.brightness);
    println!(
        "  Contrast/sharpness/saturation: {}/{}/{}",
        settings.contrast, settings.sharpness, settings.saturation
    );
    println!("  White balance: {}", settings.awb_mode);
    println!("  Exposure: {}", settings.exposure_mode);
    println!("  Quality: {}", settings.quality);
    println!();

    println!("Features compiled:");
    #[cfg(feature = "gpio")]
    println!("  - GPIO buttons: yes");
    #[cfg(not(feature = "gpio"))]
    println!("  - GPIO buttons: no");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let cli = Cli::try_parse_from(["pi_timelapse"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.output_dir, PathBuf::from("."));
        assert_eq!(cli.tick_ms, DEFAULT_TICK_MS);
        assert!(!cli.simulate);
    }

    #[test]
    fn test_serve_parsing() {
        let cli = Cli::try_parse_from([
            "pi_timelapse",
            "serve",
            "--port",
            "9090",
            "--buttons",
            "--simulate",
        ])
        .unwrap();
        assert!(cli.simulate);
        match cli.command {
            Some(Commands::Serve(args)) => {
                assert_eq!(args.port, 9090);
                assert!(args.buttons);
                assert_eq!(args.push_ms, DEFAULT_STATUS_PUSH_MS);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_run_parsing() {
        let cli = Cli::try_parse_from([
            "pi_timelapse",
            "run",
            "--interval",
            "15",
            "-n",
            "600",
            "--name",
            "sunset",
            "--output-dir",
            "/tmp/shots",
        ])
        .unwrap();
        assert_eq!(cli.output_dir, PathBuf::from("/tmp/shots"));
        match cli.command {
            Some(Commands::Run(args)) => {
                assert_eq!(args.interval, 15.0);
                assert_eq!(args.count, 600);
                assert_eq!(args.name.as_deref(), Some("sunset"));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_camera_settings_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("camera.toml");
        std::fs::write(&path, "iso = 200\nshutter_speed_us = 10000\n").unwrap();

        let cli = Cli::try_parse_from([
            "pi_timelapse",
            "info",
            "--camera-config",
            path.to_str().unwrap(),
        ])
        .unwrap();
        let settings = load_camera_settings(&cli).unwrap();
        assert_eq!(settings.iso, 200);
        assert_eq!(settings.width, 1920);
    }
}
