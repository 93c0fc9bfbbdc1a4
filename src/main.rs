use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dialoguer::Input;
use tracing_subscriber::EnvFilter;

use route_narrator::providers::{self, NominatimGeocoder};
use route_narrator::{
    AudioClip, Config, Coordinate, DEFAULT_TRIGGER_THRESHOLD, Geocoder, Planner, RouteSession,
    SpeechSynthesizer, extract, trigger,
};

/// Narrator - points of interest along a driving route, spoken as you reach them
#[derive(Parser)]
#[command(name = "narrator", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Plan a narrated route and print its points of interest
    Plan {
        /// Start location
        #[arg(long)]
        from: String,
        /// End location
        #[arg(long)]
        to: String,
        /// Print the session as JSON
        #[arg(long)]
        json: bool,
        /// Also print the raw narrator answer
        #[arg(long)]
        narrative: bool,
        /// Synthesize every waypoint and write MP3 files here
        #[arg(long, env = "NARRATOR_AUDIO_DIR")]
        audio_dir: Option<PathBuf>,
    },
    /// Plan a route, then move along it interactively
    Navigate {
        /// Start location
        #[arg(long)]
        from: String,
        /// End location
        #[arg(long)]
        to: String,
        /// Don't synthesize speech for reached waypoints
        #[arg(long)]
        no_audio: bool,
        /// Write synthesized MP3 files here
        #[arg(long, env = "NARRATOR_AUDIO_DIR")]
        audio_dir: Option<PathBuf>,
    },
    /// Extract waypoints from narrator text (file or stdin)
    Extract {
        /// File to read; stdin when omitted
        file: Option<PathBuf>,
        /// Report which waypoints are reached from this "lat,lon" position
        #[arg(long, value_parser = parse_coordinate, allow_hyphen_values = true)]
        at: Option<Coordinate>,
        /// Trigger distance in degrees
        #[arg(long, default_value_t = DEFAULT_TRIGGER_THRESHOLD)]
        threshold: f64,
        /// Print waypoints as JSON
        #[arg(long)]
        json: bool,
    },
    /// Suggest places matching a partial name
    Suggest {
        /// Partial place name
        query: String,
        /// Maximum number of suggestions
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },
    /// Test TTS output
    Speak {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the route narrator voice.")]
        text: String,
        /// Where to write the MP3
        #[arg(short, long, default_value = "narrator-test.mp3")]
        output: PathBuf,
    },
    /// Interactive first-run setup
    Setup,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,route_narrator=info",
        1 => "info,route_narrator=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Plan {
            from,
            to,
            json,
            narrative,
            audio_dir,
        } => cmd_plan(&from, &to, json, narrative, audio_dir).await,
        Command::Navigate {
            from,
            to,
            no_audio,
            audio_dir,
        } => cmd_navigate(&from, &to, no_audio, audio_dir).await,
        Command::Extract {
            file,
            at,
            threshold,
            json,
        } => cmd_extract(file.as_deref(), at, threshold, json),
        Command::Suggest { query, limit } => cmd_suggest(&query, limit).await,
        Command::Speak { text, output } => cmd_speak(&text, &output).await,
        Command::Setup => route_narrator::setup::run_setup(),
    }
}

/// Plan a route and print it
async fn cmd_plan(
    from: &str,
    to: &str,
    json: bool,
    show_narrative: bool,
    audio_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let planner = Planner::from_config(&config)?;
    let session = planner.plan(from, to).await?;

    if let Some(dir) = audio_dir.or_else(|| config.navigation.audio_dir.clone()) {
        let speech = providers::speech_from_config(&config)?;
        for index in 0..session.waypoints().len() {
            match session.audio_for(index, &speech).await {
                Ok(clip) => {
                    let path = write_clip(&dir, index, clip)?;
                    tracing::info!(path = %path.display(), "audio written");
                }
                Err(e) => tracing::error!(waypoint = index, error = %e, "speech synthesis failed"),
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&session.summary())?);
        return Ok(());
    }

    print_session(&session);
    if show_narrative {
        println!("\n--- narrator ---\n{}", session.narrative());
    }

    Ok(())
}

/// Plan a route, then let the user move along it
#[allow(clippy::too_many_lines)]
async fn cmd_navigate(
    from: &str,
    to: &str,
    no_audio: bool,
    audio_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let planner = Planner::from_config(&config)?;
    let audio_dir = audio_dir.or_else(|| config.navigation.audio_dir.clone());

    let speech: Option<Arc<dyn SpeechSynthesizer>> = if no_audio {
        None
    } else {
        match providers::speech_from_config(&config) {
            Ok(tts) => Some(Arc::new(tts)),
            Err(e) => {
                tracing::warn!(error = %e, "speech disabled");
                None
            }
        }
    };

    let mut session = planner.plan(from, to).await?;
    print_session(&session);
    announce(&session, &session.reached_indices(), speech.as_deref(), audio_dir.as_deref()).await;

    println!("\nCommands: <index> jump, +N/-N step, Enter next, r <from> | <to> re-plan, s summary, q quit");

    loop {
        let last = session.cursor().last();
        let input: String = Input::new()
            .with_prompt(format!("position [{}/{last}]", session.cursor().index()))
            .allow_empty(true)
            .interact_text()?;

        let reached = match NavCommand::parse(&input) {
            Some(NavCommand::Quit) => break,
            Some(NavCommand::Summary) => {
                print_session(&session);
                continue;
            }
            Some(NavCommand::Jump(index)) => match session.move_to(index) {
                Ok(reached) => reached,
                Err(e) => {
                    println!("{e}");
                    continue;
                }
            },
            Some(NavCommand::Forward(step)) => session.step_forward(step),
            Some(NavCommand::Back(step)) => session.step_back(step),
            Some(NavCommand::Replan { from, to }) => {
                // Keep the current session unless the new plan succeeds
                match planner.plan(&from, &to).await {
                    Ok(new_session) => {
                        session = new_session;
                        print_session(&session);
                        session.reached_indices()
                    }
                    Err(e) => {
                        println!("could not plan route: {e}");
                        continue;
                    }
                }
            }
            None => {
                println!("unrecognized command: {input}");
                continue;
            }
        };

        println!("at {}", session.position());
        announce(&session, &reached, speech.as_deref(), audio_dir.as_deref()).await;
    }

    Ok(())
}

/// Print reached waypoints and fetch their audio
async fn announce(
    session: &RouteSession,
    reached: &[usize],
    speech: Option<&dyn SpeechSynthesizer>,
    audio_dir: Option<&Path>,
) {
    for &index in reached {
        let waypoint = &session.waypoints()[index];
        println!("\n>> #{} {}\n{}", index + 1, waypoint.coordinate(), waypoint.description());

        let Some(speech) = speech else {
            continue;
        };

        match session.audio_for(index, speech).await {
            Ok(clip) => match audio_dir {
                Some(dir) => match write_clip(dir, index, clip) {
                    Ok(path) => println!("   audio: {}", path.display()),
                    Err(e) => println!("   could not write audio: {e}"),
                },
                None => println!("   audio: {} bytes ready", clip.len()),
            },
            Err(e) => println!("   speech unavailable: {e}"),
        }
    }
}

/// Extract waypoints from narrator text
fn cmd_extract(
    file: Option<&Path>,
    at: Option<Coordinate>,
    threshold: f64,
    json: bool,
) -> anyhow::Result<()> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            text
        }
    };

    let extraction = extract(&text);
    let waypoints = match at {
        Some(position) => trigger(position, &extraction.waypoints, threshold),
        None => extraction.waypoints.iter().collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&waypoints)?);
        return Ok(());
    }

    for (i, waypoint) in waypoints.iter().enumerate() {
        println!("{}. {} {}", i + 1, waypoint.coordinate(), waypoint.description());
    }
    if extraction.skipped > 0 {
        println!("({} block(s) skipped for unusable coordinates)", extraction.skipped);
    }

    Ok(())
}

/// Suggest places for a partial name
async fn cmd_suggest(query: &str, limit: usize) -> anyhow::Result<()> {
    let config = Config::load()?;
    let geocoder = NominatimGeocoder::new(&config.geocoder, config.http)?;

    let places = geocoder.suggest(query, limit).await?;
    if places.is_empty() {
        println!("No matches for \"{query}\"");
    }
    for place in places {
        println!("{}  {}", place.coordinate, place.name);
    }

    Ok(())
}

/// Test TTS output
async fn cmd_speak(text: &str, output: &Path) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let config = Config::load()?;
    let speech = providers::speech_from_config(&config)?;

    println!("Synthesizing speech...");
    let clip = speech.synthesize(text).await?;
    println!("Got {} bytes of audio data", clip.len());

    std::fs::write(output, clip.bytes())?;
    println!("Wrote {}", output.display());

    Ok(())
}

fn print_session(session: &RouteSession) {
    println!(
        "Route {} → {}: {} points",
        session.start_label(),
        session.end_label(),
        session.route().len()
    );

    if session.waypoints().is_empty() {
        println!("No points of interest found along this route.");
    }
    for (i, waypoint) in session.waypoints().iter().enumerate() {
        println!("{:>2}. {} {}", i + 1, waypoint.coordinate(), waypoint.description());
    }
    if session.skipped() > 0 {
        println!("({} point(s) skipped for unusable coordinates)", session.skipped());
    }
}

/// Write a clip as `waypoint-NN.mp3`
fn write_clip(dir: &Path, index: usize, clip: &AudioClip) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("waypoint-{:02}.mp3", index + 1));
    std::fs::write(&path, clip.bytes())?;
    Ok(path)
}

/// Parse a `lat,lon` pair
fn parse_coordinate(s: &str) -> Result<Coordinate, String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lon\", got \"{s}\""))?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("bad latitude: {e}"))?;
    let lon: f64 = lon.trim().parse().map_err(|e| format!("bad longitude: {e}"))?;

    let coordinate = Coordinate::new(lat, lon);
    if !coordinate.is_valid() {
        return Err(format!("coordinate out of range: {s}"));
    }
    Ok(coordinate)
}

/// Input accepted at the navigation prompt
#[derive(Debug, PartialEq, Eq)]
enum NavCommand {
    Jump(usize),
    Forward(usize),
    Back(usize),
    Replan { from: String, to: String },
    Summary,
    Quit,
}

impl NavCommand {
    fn parse(input: &str) -> Option<Self> {
        let input = input.trim();

        match input {
            "" | "n" | "next" => return Some(Self::Forward(1)),
            "p" | "prev" => return Some(Self::Back(1)),
            "s" | "summary" => return Some(Self::Summary),
            "q" | "quit" | "exit" => return Some(Self::Quit),
            _ => {}
        }

        if let Some(rest) = input.strip_prefix("r ") {
            let (from, to) = rest.split_once('|')?;
            let (from, to) = (from.trim(), to.trim());
            if from.is_empty() || to.is_empty() {
                return None;
            }
            return Some(Self::Replan {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        if let Some(step) = input.strip_prefix('+') {
            return step.trim().parse().ok().map(Self::Forward);
        }
        if let Some(step) = input.strip_prefix('-') {
            return step.trim().parse().ok().map(Self::Back);
        }

        input.parse().ok().map(Self::Jump)
    }
}
