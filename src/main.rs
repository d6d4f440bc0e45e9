#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::process;

use anyhow::Error;
use tokio::sync::mpsc;
use yansi::Paint;

use crate::application::cli;
use crate::application::ui;
use crate::domain::models::Event;
use crate::domain::services::Orchestrator;

fn handle_error(err: Error) {
    eprintln!(
        "{}",
        Paint::red(format!(
            "Naveena has failed with the following app version and error.\n\nVersion: {}\nBuilt: {}\nError: {:#}",
            env!("CARGO_PKG_VERSION"),
            env!("VERGEN_BUILD_TIMESTAMP"),
            err
        ))
    );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
        eprintln!("\nDebug logs are written to {} when RUST_LOG=naveena is set.", log_dir());
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

fn log_dir() -> String {
    return env::var("NAVEENA_LOG_DIR").unwrap_or_else(|_| {
        return dirs::cache_dir()
            .unwrap_or_else(env::temp_dir)
            .join("naveena")
            .to_string_lossy()
            .to_string();
    });
}

async fn start_dashboard() -> anyhow::Result<()> {
    let (tx, rx) = mpsc::unbounded_channel::<Event>();
    let orchestrator = Orchestrator::from_config(tx)?;

    return ui::start(orchestrator, rx).await;
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        ui::destruct_terminal_for_panic();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let file_appender = tracing_appender::rolling::never(log_dir(), "debug.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("naveena")
    {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .init();
    }

    match cli::parse().await {
        Ok(true) => (),
        Ok(false) => process::exit(0),
        Err(err) => {
            if let Some(msg) = cli::validation_message(&err) {
                eprintln!("{}", Paint::red(msg));
                process::exit(1);
            }
            handle_error(err);
            return;
        }
    }

    if let Err(err) = start_dashboard().await {
        ui::destruct_terminal_for_panic();
        handle_error(err);
    }

    process::exit(0);
}
