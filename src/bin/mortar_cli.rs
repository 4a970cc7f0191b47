use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::debug;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use serde::Serialize;

use mortar_calculator::input::{InterruptibleInput, LineSource, ReaderInput};
use mortar_calculator::{compute, render, CalculationOutcome, Database, FireRequest, Session, SessionError};

#[derive(Parser)]
#[command(name = "mortar-cli")]
#[command(version = "0.1.0")]
#[command(about = "Mortar fire-solution calculator using tabulated range data", long_about = None)]
struct Cli {
    /// Range data file (JSON) to use instead of the built-in tables
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive calculator (default)
    Interactive,

    /// Compute one firing solution and exit
    Solve {
        /// Mortar name, e.g. M252
        #[arg(short = 'w', long)]
        weapon: String,

        /// Ammunition name, e.g. "M821 HE"
        #[arg(short = 'a', long)]
        ammo: String,

        /// Distance to target (meters)
        #[arg(short = 'd', long)]
        distance: u32,

        /// Mortar altitude (meters)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        firer_alt: i32,

        /// Target altitude (meters)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        target_alt: i32,

        /// Azimuth correction, echoed as entered
        #[arg(long, default_value = "0")]
        azimuth: String,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,
    },

    /// List mortars, ammunition and charge ranges
    Info,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Serialize)]
struct SolveReport<'a> {
    weapon: &'a str,
    ammunition: &'a str,
    request: &'a FireRequest,
    outcome: &'a CalculationOutcome,
}

/// Terminal input with line editing; Ctrl-C is reported, not fatal.
struct TerminalInput {
    editor: DefaultEditor,
}

impl TerminalInput {
    fn new() -> Result<Self, SessionError> {
        let editor = DefaultEditor::new()
            .map_err(|e| SessionError::Internal(format!("failed to initialise terminal input: {e}")))?;
        Ok(Self { editor })
    }
}

impl LineSource for TerminalInput {
    fn read_line(&mut self, prompt: &str) -> Result<String, SessionError> {
        // Leading blank lines are printed separately; the editor expects a
        // single-line prompt.
        let prompt_line = prompt.trim_start_matches('\n');
        let mut stdout = io::stdout();
        for _ in 0..(prompt.len() - prompt_line.len()) {
            writeln!(stdout)?;
        }
        stdout.flush()?;

        match self.editor.readline(prompt_line) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(e) = self.editor.add_history_entry(line.as_str()) {
                        debug!("line not added to editor history: {e}");
                    }
                }
                Ok(line)
            }
            Err(ReadlineError::Interrupted) => Err(SessionError::Interrupted),
            Err(ReadlineError::Eof) => Err(SessionError::EndOfInput),
            Err(ReadlineError::Io(e)) => Err(SessionError::Io(e)),
            Err(e) => Err(SessionError::Internal(e.to_string())),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let loaded;
    let database: &Database = match &cli.data {
        Some(path) => {
            loaded = Database::from_file(path)
                .with_context(|| format!("failed to load range data from {}", path.display()))?;
            &loaded
        }
        None => Database::builtin().context("built-in range data is invalid")?,
    };
    debug!("loaded {} weapons", database.weapons.len());

    match cli.command.unwrap_or(Commands::Interactive) {
        Commands::Interactive => run_interactive(database)?,

        Commands::Solve {
            weapon,
            ammo,
            distance,
            firer_alt,
            target_alt,
            azimuth,
            output,
        } => {
            let (weapon, ammunition) = database.resolve(&weapon, &ammo)?;
            let request = FireRequest::new(distance, firer_alt, target_alt).with_azimuth(azimuth);
            let outcome = compute(ammunition, &request);
            display_solution(
                &SolveReport {
                    weapon: &weapon.name,
                    ammunition: &ammunition.name,
                    request: &request,
                    outcome: &outcome,
                },
                database,
                output,
            )?;
        }

        Commands::Info => {
            render::catalogue(&mut io::stdout(), database)?;
        }
    }

    Ok(())
}

fn run_interactive(database: &Database) -> Result<()> {
    let (mut input, interrupter) = if io::stdin().is_terminal() {
        InterruptibleInput::spawn(TerminalInput::new)
    } else {
        InterruptibleInput::spawn(|| Ok(ReaderInput::new(io::stdin().lock(), io::stdout())))
    };
    // Ctrl-C, SIGTERM and SIGHUP all end the session through the same path
    ctrlc::set_handler(move || interrupter.interrupt()).context("failed to install signal handler")?;

    let mut session = Session::new(database);
    session.run(&mut input, &mut io::stdout())?;
    Ok(())
}

fn display_solution(report: &SolveReport<'_>, database: &Database, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            let weapon = database.find_weapon(report.weapon)?;
            render::results(
                &mut io::stdout(),
                weapon,
                report.ammunition,
                report.request,
                report.outcome,
            )?;
        }

        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }

        OutputFormat::Csv => {
            println!("charge,elevation_mils,time_s,dispersion_m,altitude_comp_mils");
            for r in &report.outcome.results {
                println!(
                    "{},{:.1},{:.2},{},{:.2}",
                    r.charge, r.elevation_mils, r.time_s, r.dispersion_m, r.altitude_comp_mils
                );
            }
            for message in report.outcome.failure_messages() {
                eprintln!("{message}");
            }
        }
    }

    Ok(())
}
