#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use yansi::Paint;

use crate::application::ui::help_text;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Event;
use crate::domain::models::HistoryStats;
use crate::domain::models::InstagramResult;
use crate::domain::models::NaveenaError;
use crate::domain::models::StoreName;
use crate::domain::models::TextResult;
use crate::domain::services::Orchestrator;
use crate::domain::services::Submission;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

fn percent(ratio: f64) -> String {
    return format!("{:.1}%", ratio * 100.0);
}

/// Input mistakes are reported as plain messages rather than as app failures.
pub fn validation_message(err: &anyhow::Error) -> Option<String> {
    if let Some(NaveenaError::Validation(msg)) = err.downcast_ref::<NaveenaError>() {
        return Some(msg.to_string());
    }

    return None;
}

pub fn format_text_result(res: &TextResult) -> String {
    return [
        format!(
            "Sentiment: {} (compound {:.2})",
            res.label(),
            res.scores.compound
        ),
        format!("Positive:  {}", percent(res.scores.positive)),
        format!("Neutral:   {}", percent(res.scores.neutral)),
        format!("Negative:  {}", percent(res.scores.negative)),
        "".to_string(),
        res.explanation.to_string(),
    ]
    .join("\n");
}

pub fn format_instagram_result(res: &InstagramResult) -> String {
    let mut lines = vec![
        format!(
            "Sentiment: {} (average {:.2})",
            res.label(),
            res.average_sentiment_score
        ),
        format!("Emotions:  {}", res.emotional_category.join(", ")),
    ];

    if let Some(caption) = &res.caption {
        lines.push(format!("Caption:   {caption}"));
    }
    if let Some(summary) = &res.inferred_content_summary {
        lines.push(format!("Summary:   {summary}"));
    }

    lines.push("".to_string());
    lines.push(res.explanation.to_string());

    if let Some(comments) = &res.sample_comments {
        if !comments.is_empty() {
            lines.push("".to_string());
            lines.push("Sample comments:".to_string());
            for comment in comments {
                lines.push(format!("- {comment}"));
            }
        }
    }

    return lines.join("\n");
}

pub fn format_stats(stats: &HistoryStats) -> String {
    let mut res = format!(
        "{} analyses ({} text, {} Instagram)",
        stats.total, stats.text_count, stats.instagram_count
    );

    if let Some(mean) = stats.mean_text_compound {
        res = format!("{res}, mean text compound {mean:.2}");
    }
    if let Some(mean) = stats.mean_instagram_score {
        res = format!("{res}, mean Instagram score {mean:.2}");
    }

    return res;
}

fn one_shot() -> Result<(Orchestrator, mpsc::UnboundedReceiver<Event>)> {
    let (tx, rx) = mpsc::unbounded_channel::<Event>();
    let orchestrator = Orchestrator::from_config(tx)?;

    return Ok((orchestrator, rx));
}

fn warn_if_memory_only(orchestrator: &Orchestrator) {
    if !orchestrator.is_persistence_available() {
        eprintln!(
            "{}",
            Paint::yellow("Storage is unavailable. Changes are kept in memory only and will be lost.")
        );
    }
}

/// Feeds completions back into the orchestrator until every flow settles,
/// echoing loading messages to stderr as they change.
async fn wait_for_idle(
    orchestrator: &mut Orchestrator,
    rx: &mut mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let mut last_message = "".to_string();

    while orchestrator.loading().is_loading {
        let message = orchestrator.loading().message;
        if message != last_message {
            eprintln!("{}", Paint::new(&message).dimmed());
            last_message = message;
        }

        match rx.recv().await {
            Some(event) => orchestrator.handle_event(event),
            None => bail!("Analysis stopped before it completed"),
        }
    }

    return Ok(());
}

async fn analyze_text(text: &str) -> Result<()> {
    let (mut orchestrator, mut rx) = one_shot()?;

    if orchestrator.submit_text_manual(text) == Submission::Ignored {
        return Err(
            NaveenaError::Validation("Nothing to analyze. Provide some text.".to_string()).into(),
        );
    }
    wait_for_idle(&mut orchestrator, &mut rx).await?;

    if let Some(err) = orchestrator.error() {
        bail!(err.to_string());
    }
    if let Some(res) = orchestrator.text_result() {
        println!("{}", format_text_result(res));
    }

    warn_if_memory_only(&orchestrator);
    return Ok(());
}

async fn analyze_instagram(reference: &str) -> Result<()> {
    let (mut orchestrator, mut rx) = one_shot()?;

    if orchestrator.submit_instagram(reference)? == Submission::LoginRequired {
        return Err(NaveenaError::Validation(
            "You need to log in first. Run `naveena login --username <USERNAME> --token <SESSION_ID>`."
                .to_string(),
        )
        .into());
    }
    wait_for_idle(&mut orchestrator, &mut rx).await?;

    if let Some(err) = orchestrator.error() {
        bail!(err.to_string());
    }
    if let Some(res) = orchestrator.instagram_result() {
        println!("{}", format_instagram_result(res));
    }

    warn_if_memory_only(&orchestrator);
    return Ok(());
}

fn print_history() -> Result<()> {
    let (orchestrator, _rx) = one_shot()?;
    let history = orchestrator.history();

    if history.is_empty() {
        println!("There are no analyses yet. Run one from the dashboard or with `naveena analyze`.");
        return Ok(());
    }

    let lines = history
        .items()
        .iter()
        .map(|e| return e.summary())
        .collect::<Vec<String>>();

    println!("{}\n\n{}", lines.join("\n"), format_stats(&history.stats()));
    return Ok(());
}

fn clear_history() -> Result<()> {
    let (mut orchestrator, _rx) = one_shot()?;
    let count = orchestrator.history().len();
    orchestrator.clear_history();

    println!("Cleared {count} analyses from history");
    warn_if_memory_only(&orchestrator);
    return Ok(());
}

fn login(matches: &ArgMatches) -> Result<()> {
    let (mut orchestrator, _rx) = one_shot()?;
    let username = matches
        .get_one::<String>("username")
        .map(|e| return e.as_str())
        .unwrap_or_default();
    let token = matches
        .get_one::<String>("token")
        .map(|e| return e.as_str())
        .unwrap_or_default();

    orchestrator.login(username, token)?;
    if let Some(session) = orchestrator.session() {
        println!("Logged in as @{}", session.username);
    }

    warn_if_memory_only(&orchestrator);
    return Ok(());
}

fn logout() -> Result<()> {
    let (mut orchestrator, _rx) = one_shot()?;
    orchestrator.logout();

    println!("Logged out");
    return Ok(());
}

fn print_session() -> Result<()> {
    let (orchestrator, _rx) = one_shot()?;

    match orchestrator.session() {
        Some(session) => {
            println!("Logged in as @{}", session.username);
            if let Some(avatar_url) = &session.avatar_url {
                println!("Avatar: {avatar_url}");
            }
        }
        None => println!("Not logged in"),
    }

    return Ok(());
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(config_file_path.clone()).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

fn subcommand_analyze() -> Command {
    return Command::new("analyze")
        .about("Run a single analysis, record it in history, and print the result.")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("text")
                .about("Analyze the sentiment of free text.")
                .arg(Arg::new("text").help("Text to analyze").required(true)),
        )
        .subcommand(
            Command::new("instagram")
                .about("Analyze the caption and comments of an Instagram post. Requires a login.")
                .arg(Arg::new("url").help("Post URL").required(true)),
        );
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_history() -> Command {
    return Command::new("history")
        .about("Manage the history of past analyses.")
        .arg_required_else_help(true)
        .subcommand(Command::new("list").about("List all past analyses, newest first."))
        .subcommand(Command::new("clear").about("Delete every past analysis."));
}

fn subcommand_login() -> Command {
    return Command::new("login")
        .about("Store the Instagram session used to analyze posts.")
        .arg(
            Arg::new("username")
                .short('u')
                .long("username")
                .env("NAVEENA_USERNAME")
                .num_args(1)
                .help("Instagram username")
                .required(true),
        )
        .arg(
            Arg::new("token")
                .short('t')
                .long("token")
                .env("NAVEENA_SESSION_ID")
                .hide_env_values(true)
                .num_args(1)
                .help("Instagram session ID cookie")
                .required(true),
        );
}

pub fn build() -> Command {
    let keys_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("HOTKEYS:") || line.starts_with("LOGIN PROMPT:") {
                return Paint::new(format!("DASHBOARD {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}\nBuilt: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_BUILD_TIMESTAMP")
    );

    return Command::new("naveena")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(keys_text)
        .arg_required_else_help(false)
        .subcommand(Command::new("dashboard").about("Open the terminal dashboard. This is the default."))
        .subcommand(subcommand_analyze())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_history())
        .subcommand(subcommand_login())
        .subcommand(Command::new("logout").about("Forget the stored Instagram session."))
        .subcommand(Command::new("session").about("Show who is logged in."))
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("NAVEENA_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(
            Arg::new(ConfigKey::AuthDelayMs.to_string())
                .long(ConfigKey::AuthDelayMs.to_string())
                .env("NAVEENA_AUTH_DELAY_MS")
                .num_args(1)
                .help(format!("Minimum time in milliseconds the Instagram flow shows its authentication step. [default: {}]", Config::default(ConfigKey::AuthDelayMs)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::DebounceMs.to_string())
                .long(ConfigKey::DebounceMs.to_string())
                .env("NAVEENA_DEBOUNCE_MS")
                .num_args(1)
                .help(format!("Quiet period in milliseconds after the last keystroke before real-time analysis runs. [default: {}]", Config::default(ConfigKey::DebounceMs)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::GatewayTimeout.to_string())
                .long(ConfigKey::GatewayTimeout.to_string())
                .env("NAVEENA_GATEWAY_TIMEOUT")
                .num_args(1)
                .help(format!("Time to wait in milliseconds before timing out when doing a healthcheck for the analysis server. [default: {}]", Config::default(ConfigKey::GatewayTimeout)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::GatewayURL.to_string())
                .long(ConfigKey::GatewayURL.to_string())
                .env("NAVEENA_GATEWAY_URL")
                .num_args(1)
                .help(format!("Analysis server URL. [default: {}]", Config::default(ConfigKey::GatewayURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::RealtimeMinChars.to_string())
                .long(ConfigKey::RealtimeMinChars.to_string())
                .env("NAVEENA_REALTIME_MIN_CHARS")
                .num_args(1)
                .help(format!("Real-time analysis only runs once the trimmed input is longer than this many characters. [default: {}]", Config::default(ConfigKey::RealtimeMinChars)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::StateDir.to_string())
                .long(ConfigKey::StateDir.to_string())
                .env("NAVEENA_STATE_DIR")
                .num_args(1)
                .help(format!("Directory where the session and history are stored. [default: {}]", Config::default(ConfigKey::StateDir)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Storage.to_string())
                .long(ConfigKey::Storage.to_string())
                .env("NAVEENA_STORAGE")
                .num_args(1)
                .help(format!("Where the session and history are kept. [default: {}]", Config::default(ConfigKey::Storage)))
                .value_parser(PossibleValuesParser::new(StoreName::VARIANTS))
                .global(true),
        );
}

/// Handles one-shot subcommands. Returns true when the dashboard should start.
pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("dashboard", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
        }
        Some(("analyze", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            match subcmd_matches.subcommand() {
                Some(("text", text_matches)) => {
                    let text = text_matches
                        .get_one::<String>("text")
                        .map(|e| return e.as_str())
                        .unwrap_or_default();
                    analyze_text(text).await?;
                }
                Some(("instagram", instagram_matches)) => {
                    let url = instagram_matches
                        .get_one::<String>("url")
                        .map(|e| return e.as_str())
                        .unwrap_or_default();
                    analyze_instagram(url).await?;
                }
                _ => {
                    subcommand_analyze().print_long_help()?;
                }
            }

            return Ok(false);
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        Some(("history", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            match subcmd_matches.subcommand() {
                Some(("list", _)) => print_history()?,
                Some(("clear", _)) => clear_history()?,
                _ => subcommand_history().print_long_help()?,
            }

            return Ok(false);
        }
        Some(("login", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            login(subcmd_matches)?;
            return Ok(false);
        }
        Some(("logout", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            logout()?;
            return Ok(false);
        }
        Some(("session", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            print_session()?;
            return Ok(false);
        }
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(true);
}
