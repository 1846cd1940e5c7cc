//! studydeck CLI - summaries, study questions and quizzes from a PDF
//!
//! Usage: studydeck [OPTIONS] <COMMAND>
//!
//! Supports JSON output for scripting.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io::Write;
use std::path::{Path, PathBuf};
use studydeck_lib::{
    document,
    error::PipelineError,
    pipeline::{RunOptions, Session},
    settings::{self, Provider, Settings},
};
use tracing_subscriber::EnvFilter;

#[path = "cli/render.rs"]
mod render;

#[path = "cli/quiz_session.rs"]
mod quiz_session;

// ============================================================================
// Main CLI Structure
// ============================================================================

#[derive(Parser)]
#[command(name = "studydeck")]
#[command(version, about = "Summaries, study questions and quizzes from a PDF", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Settings file (default: <data dir>/studydeck/settings.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output as JSON for scripting
    #[arg(long, global = true)]
    json: bool,

    /// Suppress progress output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Detailed logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a PDF and generate a quiz from it
    Run {
        /// PDF file to process
        file: PathBuf,
        /// API key (default: provider environment variable)
        #[arg(long)]
        api_key: Option<String>,
        /// LLM provider: gemini, anthropic, openai
        #[arg(long)]
        provider: Option<Provider>,
        /// Model override
        #[arg(long)]
        model: Option<String>,
        /// Take the quiz on the terminal afterwards
        #[arg(long, short)]
        interactive: bool,
        /// Only generate the summary
        #[arg(long)]
        skip_quiz: bool,
    },
    /// Print the text extracted from a PDF
    Extract {
        /// PDF file to read
        file: PathBuf,
    },
    /// Configuration settings
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List all settings
    List,
    /// Get a setting value
    Get {
        /// Setting key
        key: String,
    },
    /// Set a setting value
    Set {
        /// Setting key
        key: String,
        /// Setting value ("none" clears optional keys)
        value: String,
    },
    /// Print the settings file location
    Path,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn init_logging(verbose: bool, quiet: bool) {
    let default_directives = if verbose {
        "studydeck=debug,studydeck_lib=debug"
    } else if quiet {
        "warn"
    } else {
        "studydeck=info,studydeck_lib=info,warn"
    };

    let filter = EnvFilter::try_from_env("STUDYDECK_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(e) = run_cli(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run_cli(cli: Cli) -> Result<(), String> {
    // Completions need no settings
    if let Commands::Completions { shell } = &cli.command {
        generate(*shell, &mut Cli::command(), "studydeck", &mut std::io::stdout());
        return Ok(());
    }

    let settings_path = cli.config.clone().unwrap_or_else(Settings::default_path);
    tracing::debug!(path = %settings_path.display(), "Using settings file");

    match cli.command {
        Commands::Run {
            file,
            api_key,
            provider,
            model,
            interactive,
            skip_quiz,
        } => {
            let mut settings = Settings::load(&settings_path);
            if let Some(provider) = provider {
                // a provider switch drops the stored model unless one is given
                if provider != settings.provider {
                    settings.model = None;
                }
                settings.provider = provider;
            }
            if let Some(model) = model {
                settings.model = Some(model);
            }
            let args = RunArgs {
                file: &file,
                api_key: api_key.as_deref(),
                interactive,
                skip_quiz,
            };
            handle_run(args, &settings, cli.json).await
        }
        Commands::Extract { file } => handle_extract(&file, cli.json),
        Commands::Config { cmd } => handle_config(cmd, &settings_path, cli.json),
        Commands::Completions { .. } => Ok(()),
    }
}

// ============================================================================
// Handlers
// ============================================================================

struct RunArgs<'a> {
    file: &'a Path,
    api_key: Option<&'a str>,
    interactive: bool,
    skip_quiz: bool,
}

async fn handle_run(args: RunArgs<'_>, settings: &Settings, json: bool) -> Result<(), String> {
    if args.interactive && json {
        return Err("--interactive cannot be combined with --json".to_string());
    }

    // Both checks happen before any extraction or LLM call
    if !args.file.is_file() {
        return Err(format!("PDF file not found: {}", args.file.display()));
    }
    let session = Session::new(settings.provider, args.api_key, settings).map_err(|e| e.to_string())?;

    let bytes = std::fs::read(args.file).map_err(|e| format!("Failed to read {}: {}", args.file.display(), e))?;
    let source = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.file.display().to_string());

    let options = RunOptions { quiz: !args.skip_quiz };
    let insights = session
        .process_pdf(&source, &bytes, options)
        .await
        .map_err(|e| e.to_string())?;

    if json {
        let out = serde_json::to_string_pretty(&insights).map_err(|e| e.to_string())?;
        println!("{}", out);
        return Ok(());
    }

    println!("{}", render::render_summary(&insights.summary));
    if !args.skip_quiz {
        println!("{}", render::render_quiz(&insights.quiz));
    }

    if args.interactive {
        match insights.quiz.quiz().filter(|q| !q.is_empty()) {
            Some(quiz) => {
                println!("== Take the quiz ==");
                let stdin = std::io::stdin();
                let mut input = stdin.lock();
                let mut stdout = std::io::stdout();
                let score = quiz_session::run_quiz(quiz, &mut input, &mut stdout).map_err(|e| e.to_string())?;
                stdout.flush().ok();
                tracing::info!(correct = score.correct, total = score.total, "Quiz finished");
            }
            None => eprintln!("No quiz available to take."),
        }
    }

    Ok(())
}

fn handle_extract(file: &Path, json: bool) -> Result<(), String> {
    let bytes = std::fs::read(file).map_err(|e| format!("Failed to read {}: {}", file.display(), e))?;
    if bytes.is_empty() {
        return Err(PipelineError::EmptyUpload.to_string());
    }

    let extracted = document::extract_text_from_pdf(&bytes);
    if extracted.is_empty() {
        return Err(PipelineError::NoExtractableText.to_string());
    }

    if json {
        let value = serde_json::json!({
            "source": file.display().to_string(),
            "characters": extracted.char_count(),
            "text": extracted.text(),
        });
        println!("{}", value);
    } else {
        println!("{}", extracted.text());
    }
    Ok(())
}

fn handle_config(cmd: ConfigCommands, path: &Path, json: bool) -> Result<(), String> {
    match cmd {
        ConfigCommands::List => {
            let settings = Settings::load(path);
            let mut values = serde_json::Map::new();
            for key in settings::KEYS {
                let value = settings.get(key).map_err(|e| e.to_string())?;
                values.insert(key.to_string(), serde_json::Value::String(value));
            }
            let provider = settings.provider;
            let key_status = settings::resolve_api_key(provider, None)
                .map(|k| settings::mask_key(&k))
                .unwrap_or_else(|| "not set".to_string());

            if json {
                values.insert("api-key".to_string(), serde_json::Value::String(key_status));
                println!("{}", serde_json::Value::Object(values));
            } else {
                for (key, value) in &values {
                    println!("{:<24} {}", format!("{}:", key), value);
                }
                println!("{:<24} {} ({})", "api-key:", key_status, provider.env_vars().join(" or "));
            }
        }
        ConfigCommands::Get { key } => {
            let value = Settings::load(path).get(&key).map_err(|e| e.to_string())?;
            if json {
                println!("{}", serde_json::json!({ key: value }));
            } else {
                println!("{}", value);
            }
        }
        ConfigCommands::Set { key, value } => {
            let mut settings = Settings::load(path);
            settings.set(&key, &value).map_err(|e| e.to_string())?;
            settings.save(path).map_err(|e| e.to_string())?;
            let stored = settings.get(&key).map_err(|e| e.to_string())?;
            if json {
                println!("{}", serde_json::json!({ key: stored }));
            } else {
                println!("{} = {}", key, stored);
            }
        }
        ConfigCommands::Path => {
            if json {
                println!("{}", serde_json::json!({ "path": path.display().to_string() }));
            } else {
                println!("{}", path.display());
            }
        }
    }
    Ok(())
}
