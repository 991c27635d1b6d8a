mod bootstrap;
mod shell;

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use catpoint_core::repository::SecurityRepository;
use catpoint_core::service::SecurityService;
use catpoint_core::settings::{config_dir, default_store_path, Settings};
use catpoint_image::StandInClassifier;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use shell::{Command, ConsoleListener, Reply};

type Engine = SecurityService<Box<dyn SecurityRepository>, StandInClassifier>;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();

    let location = settings.store_location();
    bootstrap::ensure_store_directory(&location, &default_store_path(), &config_dir())?;
    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("Catpoint v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Classifier: {}, stride: {}",
        settings.classifier,
        settings.sample_stride
    );

    let store = bootstrap::open_store(&location)?;
    let classifier = bootstrap::build_classifier(&settings)?;
    let engine: Engine = SecurityService::new(store, classifier);
    engine.add_status_listener(Arc::new(ConsoleListener))?;

    let (input, interactive): (Box<dyn AsyncRead + Unpin + Send>, bool) = match &settings.script {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening script {}", path.display()))?;
            (Box::new(file), false)
        }
        None => (Box::new(tokio::io::stdin()), true),
    };

    if interactive {
        println!("{}", shell::HELP);
    }
    run_console(&engine, input, interactive).await?;

    tracing::info!("Catpoint stopped");
    Ok(())
}

/// Execute commands line by line until `quit`, end of input or Ctrl+C.
async fn run_console(
    engine: &Engine,
    input: Box<dyn AsyncRead + Unpin + Send>,
    interactive: bool,
) -> Result<()> {
    let mut lines = BufReader::new(input).lines();

    loop {
        if interactive {
            print!("> ");
            std::io::stdout().flush()?;
        }

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if !interactive {
                    println!("> {line}");
                }

                match line.parse::<Command>().and_then(|command| shell::execute(engine, command)) {
                    Ok(Reply::Text(text)) => println!("{text}"),
                    Ok(Reply::Quit) => break,
                    Err(err) => {
                        tracing::warn!(command = line, "command failed: {err:#}");
                        eprintln!("error: {err:#}");
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received; ending session");
                break;
            }
        }
    }

    Ok(())
}
