//! Liveness Check CLI
//!
//! Sends a face photo, from a file or the webcam, to the liveness API and
//! prints the result. `interactive` exposes the full session: flags, image
//! source, check and reset.

use clap::{ArgGroup, Args, Parser, Subcommand};
use liveness_check::{
    capture::{self, CaptureSession, LogPreview},
    config::AppConfig,
    console::{ConsoleCommand, ConsoleError, HELP},
    lifecycle::{LifecycleState, LivenessSession},
    metrics::MetricsRegistry,
    present::{render_flags, ResultView, SessionView},
    request::{Flag, HttpTransport},
};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "liveness-check", version, about = "Check whether a face photo shows a live person")]
struct Cli {
    /// TOML configuration file ([api] and [capture] sections).
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print Prometheus metrics for the session before exiting.
    #[arg(long, global = true)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one liveness check and print the result.
    Check(CheckArgs),
    /// Drive a session from the prompt.
    Interactive,
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("source").required(true).args(["image", "webcam"])))]
struct CheckArgs {
    /// Image file to check.
    #[arg(long, value_name = "PATH")]
    image: Option<PathBuf>,

    /// Take the photo with the webcam instead.
    #[arg(long)]
    webcam: bool,

    /// Do not compute image quality.
    #[arg(long)]
    no_quality: bool,

    /// Do not detect image attributes.
    #[arg(long)]
    no_attribute: bool,

    /// Skip quality validation.
    #[arg(long)]
    no_validate_quality: bool,

    /// Skip attribute validation.
    #[arg(long)]
    no_validate_attribute: bool,

    /// Skip the number-of-faces validation.
    #[arg(long)]
    no_validate_nface: bool,

    /// Print only the raw JSON response.
    #[arg(long)]
    raw: bool,
}

impl CheckArgs {
    fn disabled_flags(&self) -> impl Iterator<Item = Flag> {
        [
            (Flag::UseQuality, self.no_quality),
            (Flag::UseAttribute, self.no_attribute),
            (Flag::ValidateQuality, self.no_validate_quality),
            (Flag::ValidateAttribute, self.no_validate_attribute),
            (Flag::ValidateNFace, self.no_validate_nface),
        ]
        .into_iter()
        .filter_map(|(flag, off)| off.then_some(flag))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize logging; stdout is reserved for results
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Liveness Check v{}", liveness_check::VERSION);

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let transport = match HttpTransport::new(&config.api) {
        Ok(transport) => transport,
        Err(e) => {
            eprintln!("Failed to set up API client: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(endpoint = %transport.endpoint(), "Liveness API configured");

    let capture = CaptureSession::new(
        capture::default_camera(),
        Box::new(LogPreview::new()),
        config.capture.clone(),
    );
    let mut session = LivenessSession::new(Box::new(transport), capture);

    let code = match cli.command {
        Command::Check(args) => run_check(&mut session, &args).await,
        Command::Interactive => run_interactive(&mut session).await,
    };

    if cli.print_metrics {
        print_metrics(&session);
    }
    code
}

async fn run_check(session: &mut LivenessSession, args: &CheckArgs) -> ExitCode {
    for flag in args.disabled_flags() {
        session.set_flag(flag, false);
    }

    if let Some(path) = &args.image {
        if let Err(e) = session.select_file(path).await {
            eprintln!("Could not read image: {}", e);
            return ExitCode::FAILURE;
        }
    } else {
        if let Err(e) = session.activate_webcam() {
            eprintln!("Could not open webcam: {}", e);
            return ExitCode::FAILURE;
        }
        if let Err(e) = session.capture_webcam() {
            eprintln!("Could not capture photo: {}", e);
            return ExitCode::FAILURE;
        }
    }

    let state = match session.submit().await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Check not performed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match state {
        LifecycleState::Completed(outcome) if args.raw => {
            println!("{}", outcome.pretty_body());
            ExitCode::SUCCESS
        }
        LifecycleState::Completed(_) => {
            print!("{}", ResultView::from_lifecycle(state).render());
            ExitCode::SUCCESS
        }
        LifecycleState::Failed(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
        other => {
            warn!(state = other.name(), "Unexpected state after submit");
            ExitCode::FAILURE
        }
    }
}

async fn run_interactive(session: &mut LivenessSession) -> ExitCode {
    println!("Liveness Check v{}. Type `help` for commands.", liveness_check::VERSION);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        let _ = std::io::stdout().flush();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                eprintln!("Failed to read input: {}", e);
                return ExitCode::FAILURE;
            }
        };

        let command = match line.parse::<ConsoleCommand>() {
            Ok(command) => command,
            Err(ConsoleError::Empty) => continue,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        match command {
            ConsoleCommand::Help => println!("{}", HELP),
            ConsoleCommand::Flags => print!("{}", render_flags(session.config())),
            ConsoleCommand::Toggle(flag) => {
                let value = session.toggle_flag(flag);
                println!("{}: {}", flag, on_off(value));
            }
            ConsoleCommand::Set(flag, value) => {
                session.set_flag(flag, value);
                println!("{}: {}", flag, on_off(value));
            }
            ConsoleCommand::File(path) => match session.select_file(&path).await {
                Ok(()) => println!("Image ready: {}", path.display()),
                Err(e) => eprintln!("Could not read image: {}", e),
            },
            ConsoleCommand::Webcam => match session.activate_webcam() {
                Ok(()) => println!("Webcam live. Type `capture` to take the photo or `cancel`."),
                Err(e) => eprintln!("Could not open webcam: {}", e),
            },
            ConsoleCommand::Capture => match session.capture_webcam() {
                Ok(()) => println!("Photo captured."),
                Err(e) => eprintln!("Could not capture photo: {}", e),
            },
            ConsoleCommand::Cancel => {
                session.cancel_webcam();
                println!("Webcam closed.");
            }
            ConsoleCommand::Check => {
                println!("Loading...");
                match session.submit().await {
                    Ok(state) => print!("{}", ResultView::from_lifecycle(state).render()),
                    Err(e) => eprintln!("Check not performed: {}", e),
                }
            }
            ConsoleCommand::Show => print!("{}", SessionView::of(session).render()),
            ConsoleCommand::Reset => {
                session.reset();
                println!("Session reset.");
            }
            ConsoleCommand::Quit => break,
        }
    }

    ExitCode::SUCCESS
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

fn print_metrics(session: &LivenessSession) {
    let output = MetricsRegistry::new().and_then(|registry| {
        registry.update(session.stats());
        registry.encode()
    });
    match output {
        Ok(text) => print!("{}", text),
        Err(e) => eprintln!("Failed to encode metrics: {}", e),
    }
}
