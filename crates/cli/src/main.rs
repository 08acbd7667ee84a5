mod commands;
mod shell;

use anyhow::Context;
use clap::Parser;
use commands::{parse_line, COMMANDS};
use convodeck_data::{
    default_assets_dir, default_state_dir, load_store_config_with_env, JsonFileStorage,
};
use shell::{print_help, Flow, Shell};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "convodeck")]
#[command(about = "Build a 52-card conversation deck from the terminal")]
struct Args {
    /// Directory holding the saved deck session
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Directory with store.json and card_backs.json
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if args.verbose { "debug" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let assets = args.assets.unwrap_or_else(default_assets_dir);
    let store = load_store_config_with_env(&assets)?;
    let state_dir = args
        .state_dir
        .or_else(default_state_dir)
        .context("no state directory; pass --state-dir or set CONVODECK_STATE_DIR")?;
    info!(state_dir = %state_dir.display(), "deck session");

    let mut shell = Shell::new(JsonFileStorage::new(&state_dir), store);
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    print_help(&mut stdout)?;
    shell.execute(commands::Command::Show, &mut stdout)?;
    let mut line = String::new();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                writeln!(stdout, "{err}")?;
                if matches!(err, commands::ParseError::Unknown(_)) {
                    writeln!(stdout, "commands: {}", COMMANDS.join(", "))?;
                }
                continue;
            }
        };
        if shell.execute(command, &mut stdout)? == Flow::Quit {
            break;
        }
    }
    Ok(())
}
