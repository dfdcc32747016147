use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use signlens_contracts::chat::{parse_intent, CHAT_HELP_COMMANDS};
use signlens_contracts::credentials::{mask_credential, CredentialStore};
use signlens_contracts::events::EventWriter;
use signlens_contracts::export::{read_result_file, write_export, AnalysisExport};
use signlens_contracts::media::MediaAsset;
use signlens_contracts::models::ModelVariant;
use signlens_contracts::timeline::{build_timeline, TimelineOrder};
use signlens_engine::{AnalysisEngine, AnalysisError, CredentialStrategy, Credentials, Session};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Debug, Parser)]
#[command(
    name = "signlens",
    version,
    about = "Sign language, speech and context analysis for video and audio files"
)]
struct Cli {
    /// Log request details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyze one media file and print the timeline
    Analyze(AnalyzeArgs),
    /// Interactive session: analyze, adjust, and ask follow-up questions
    Chat(ChatArgs),
    /// Re-derive a timeline from a saved result without calling the model
    Timeline(TimelineArgs),
    /// Manage the remembered API key
    Key(KeyArgs),
}

#[derive(Debug, Args)]
struct SessionArgs {
    #[arg(long, default_value = "fast")]
    variant: ModelVariant,
    #[arg(long)]
    api_key: Option<String>,
    /// Ignore user-supplied keys and use only GEMINI_API_KEY / GOOGLE_API_KEY
    #[arg(long)]
    env_only: bool,
    #[arg(long, default_value_t = 0.5)]
    threshold: f64,
    /// Order by parsed seconds instead of timestamp text
    #[arg(long)]
    numeric_order: bool,
    #[arg(long, default_value_t = 120.0)]
    request_timeout: f64,
    #[arg(long)]
    events: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct AnalyzeArgs {
    #[arg(long)]
    media: PathBuf,
    /// Declared MIME type; inferred from the extension when omitted
    #[arg(long)]
    mime: Option<String>,
    #[command(flatten)]
    session: SessionArgs,
    /// Save --api-key for later runs
    #[arg(long)]
    remember_key: bool,
    #[arg(long)]
    export: Option<PathBuf>,
    /// Print the result as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Parser)]
struct ChatArgs {
    #[arg(long)]
    media: Option<PathBuf>,
    #[arg(long)]
    mime: Option<String>,
    #[command(flatten)]
    session: SessionArgs,
}

#[derive(Debug, Parser)]
struct TimelineArgs {
    #[arg(long)]
    result: PathBuf,
    #[arg(long, default_value_t = 0.5)]
    threshold: f64,
    #[arg(long)]
    numeric_order: bool,
}

#[derive(Debug, Parser)]
struct KeyArgs {
    #[command(subcommand)]
    action: KeyAction,
}

#[derive(Debug, Subcommand)]
enum KeyAction {
    Set { value: String },
    Forget,
    Show,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("signlens error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Command::Analyze(args) => run_analyze(args),
        Command::Chat(args) => {
            run_chat(args)?;
            Ok(0)
        }
        Command::Timeline(args) => run_timeline(args),
        Command::Key(args) => run_key(args),
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn timeline_order(numeric: bool) -> TimelineOrder {
    if numeric {
        TimelineOrder::Numeric
    } else {
        TimelineOrder::Lexicographic
    }
}

fn build_session(args: &SessionArgs, store: &CredentialStore) -> Result<Session> {
    let strategy = if args.env_only {
        CredentialStrategy::EnvironmentOnly
    } else {
        CredentialStrategy::UserThenEnvironment
    };
    let remembered = store.load().unwrap_or_else(|err| {
        warn!(error = %err, "ignoring unreadable credential store");
        None
    });
    let credentials = Credentials::from_environment(strategy)
        .with_remembered(remembered)
        .with_override(args.api_key.clone());
    debug!(source = credentials.source_label(), "credential source");

    let engine = AnalysisEngine::gemini().with_request_timeout(args.request_timeout);
    let mut session =
        Session::new(engine, credentials).with_order(timeline_order(args.numeric_order));
    if let Some(path) = args.events.as_ref() {
        session = session.with_events(EventWriter::new(path, uuid::Uuid::new_v4().to_string()));
    }
    session.set_variant(args.variant);
    session.set_threshold(args.threshold)?;
    Ok(session)
}

fn load_media(path: &Path, mime: Option<&str>) -> Result<MediaAsset> {
    MediaAsset::from_path(path, mime).with_context(|| format!("cannot load {}", path.display()))
}

fn exit_code_for(err: &AnalysisError) -> i32 {
    if err.suggests_alternatives() {
        2
    } else {
        1
    }
}

fn run_analyze(args: AnalyzeArgs) -> Result<i32> {
    let store = CredentialStore::default_location();
    if args.remember_key {
        let Some(key) = args.session.api_key.as_deref() else {
            bail!("--remember-key requires --api-key");
        };
        store.remember(key)?;
        println!("API key remembered in {}", store.path().display());
    }

    let mut session = build_session(&args.session, &store)?;
    session.select_media(load_media(&args.media, args.mime.as_deref())?)?;
    if let Some(media) = session.media() {
        eprintln!(
            "Analyzing {} ({}, {}) with the {} model...",
            media.name(),
            media.mime_type(),
            media.size_label(),
            session.variant()
        );
    }

    if let Err(err) = session.analyze().map(|_| ()) {
        if let Some(banner) = session.banner() {
            eprintln!("{}", render::banner(banner));
        }
        return Ok(exit_code_for(&err));
    }

    let timeline = session.timeline();
    let Some(result) = session.result() else {
        bail!("analysis finished without a result");
    };
    let export = AnalysisExport {
        media: session.media().map(MediaAsset::name),
        model: session.last_model(),
        threshold: session.threshold(),
        result,
        timeline: &timeline,
    };
    if let Some(path) = args.export.as_ref() {
        write_export(path, &export)?;
        eprintln!("Exported to {}", path.display());
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&export)?);
    } else {
        println!("{}", render::timeline(&timeline, session.threshold()));
        println!();
        println!("{}", render::context(&result.context));
    }
    Ok(0)
}

fn run_timeline(args: TimelineArgs) -> Result<i32> {
    if args.threshold.is_nan() {
        bail!("confidence threshold must be a number between 0 and 1");
    }
    let result = read_result_file(&args.result)?;
    let threshold = args.threshold.clamp(0.0, 1.0);
    let items = build_timeline(Some(&result), threshold, timeline_order(args.numeric_order));
    println!("{}", render::timeline(&items, threshold));
    Ok(0)
}

fn run_key(args: KeyArgs) -> Result<i32> {
    let store = CredentialStore::default_location();
    match args.action {
        KeyAction::Set { value } => {
            if value.trim().is_empty() {
                bail!("API key must not be empty");
            }
            store.remember(&value)?;
            println!("API key remembered in {}", store.path().display());
        }
        KeyAction::Forget => {
            if store.forget()? {
                println!("Remembered API key removed.");
            } else {
                println!("No remembered API key.");
            }
        }
        KeyAction::Show => match store.load()? {
            Some(key) => println!("Remembered API key: {}", mask_credential(&key)),
            None => println!("No remembered API key."),
        },
    }
    Ok(0)
}

fn run_chat(args: ChatArgs) -> Result<()> {
    let store = CredentialStore::default_location();
    let mut session = build_session(&args.session, &store)?;
    if let Some(path) = args.media.as_ref() {
        session.select_media(load_media(path, args.mime.as_deref())?)?;
        println!("Media: {path}", path = path.display());
    }

    let stdin = io::stdin();
    let mut line = String::new();

    println!("Signlens chat started. Type /help for commands.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        let read = match stdin.read_line(&mut line) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if read == 0 {
            break;
        }

        let input = line.trim_end_matches(['\n', '\r']);
        let intent = parse_intent(input);

        match intent.action.as_str() {
            "noop" => continue,
            "quit" => break,
            "help" => {
                println!("Commands: {}", CHAT_HELP_COMMANDS.join("  "));
                println!("Anything else is sent as a question about the media.");
            }
            "set_media" => {
                let Some(path) = intent.arg_str("path") else {
                    println!("/media requires a path");
                    continue;
                };
                match load_media(Path::new(path), args.mime.as_deref())
                    .and_then(|media| session.select_media(media))
                {
                    Ok(()) => println!("Media set to {path}; previous analysis and chat cleared."),
                    Err(err) => println!("Media not changed: {err:#}"),
                }
            }
            "analyze" => {
                println!("Analyzing with the {} model...", session.variant());
                match session.analyze().map(|_| ()) {
                    Ok(()) => {
                        println!("{}", render::timeline(&session.timeline(), session.threshold()))
                    }
                    Err(_) => {
                        if let Some(banner) = session.banner() {
                            println!("{}", render::banner(banner));
                        }
                    }
                }
            }
            "timeline" => {
                if session.result().is_none() {
                    println!("No analysis yet. Use /analyze.");
                } else {
                    println!("{}", render::timeline(&session.timeline(), session.threshold()));
                }
            }
            "context" => match session.result() {
                Some(result) => println!("{}", render::context(&result.context)),
                None => println!("No analysis yet. Use /analyze."),
            },
            "set_threshold" => {
                let parsed = intent
                    .arg_str("value")
                    .and_then(|value| value.parse::<f64>().ok());
                match parsed.map(|value| session.set_threshold(value)) {
                    Some(Ok(threshold)) => {
                        println!("Confidence threshold: {threshold:.2}");
                        if session.result().is_some() {
                            println!(
                                "{}",
                                render::timeline(&session.timeline(), session.threshold())
                            );
                        }
                    }
                    _ => println!("/threshold requires a number between 0 and 1"),
                }
            }
            "set_variant" => match intent.arg_str("value").map(str::parse::<ModelVariant>) {
                Some(Ok(variant)) => {
                    session.set_variant(variant);
                    println!("Model variant: {variant}");
                }
                Some(Err(message)) => println!("{message}"),
                None => println!("/variant requires fast or deep"),
            },
            "set_key" => {
                let Some(value) = intent.arg_str("value") else {
                    println!("/key requires a value");
                    continue;
                };
                if !session.credentials().accepts_user_keys() {
                    println!(
                        "Key ignored: --env-only uses GEMINI_API_KEY / GOOGLE_API_KEY only."
                    );
                    continue;
                }
                session.set_credential_override(Some(value.to_string()));
                if let Err(err) = store.remember(value) {
                    println!("Key set for this session but not remembered: {err:#}");
                } else {
                    println!("API key set and remembered.");
                }
            }
            "forget_key" => {
                session.forget_credential();
                match store.forget() {
                    Ok(true) => println!("Remembered API key removed."),
                    Ok(false) => println!("No remembered API key."),
                    Err(err) => println!("Could not update credential store: {err:#}"),
                }
            }
            "export" => {
                let Some(path) = intent.arg_str("path") else {
                    println!("/export requires a path");
                    continue;
                };
                let timeline = session.timeline();
                let Some(result) = session.result() else {
                    println!("No analysis to export. Use /analyze.");
                    continue;
                };
                let export = AnalysisExport {
                    media: session.media().map(MediaAsset::name),
                    model: session.last_model(),
                    threshold: session.threshold(),
                    result,
                    timeline: &timeline,
                };
                match write_export(Path::new(path), &export) {
                    Ok(()) => println!("Exported to {path}"),
                    Err(err) => println!("Export failed: {err:#}"),
                }
            }
            "ask" => {
                let Some(question) = intent.question.as_deref() else {
                    continue;
                };
                if let Some(reply) = session.ask(question) {
                    println!("{}", render::chat_message(reply));
                }
            }
            _ => {
                println!(
                    "Unknown command /{}. Type /help for commands.",
                    intent.arg_str("command").unwrap_or_default()
                );
            }
        }
    }

    Ok(())
}
