use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;

use bayundb_exec::query::ast::Statement;
use bayundb_exec::{EngineConfig, ExecutionEngine, Response, Session};

const HISTORY_FILE: &str = ".bnql_history";

#[derive(Parser)]
#[command(author, version, about = "bnql-exec - run JSON statement trees against an in-memory engine")]
struct Cli {
    /// Always use full table scans
    #[arg(long)]
    no_index_scan: bool,

    /// Decimals kept when rendering floats
    #[arg(long)]
    float_precision: Option<usize>,

    /// Command to execute
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive shell, one JSON statement per line
    Shell,

    /// Execute a file holding a JSON array of statements
    Run {
        /// Script path
        file: PathBuf,
    },
}

impl Cli {
    fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::default();
        if self.no_index_scan {
            config = config.without_index_scan();
        }
        if let Some(precision) = self.float_precision {
            config = config.with_float_precision(precision);
        }
        config
    }
}

fn print_response(response: &Response) {
    print!("{}", response.text);
    if let Some(err) = &response.error {
        eprintln!("Error: {}", err);
    }
}

fn run_script(engine: &ExecutionEngine, file: &PathBuf) -> Result<()> {
    let script = fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let statements: Vec<Statement> =
        serde_json::from_str(&script).with_context(|| format!("Failed to parse {}", file.display()))?;

    let mut session = Session::new();
    for statement in &statements {
        print_response(&engine.execute(&mut session, statement));
    }
    Ok(())
}

fn run_shell(engine: &ExecutionEngine) -> Result<()> {
    println!("Welcome to bnql-exec. Enter one JSON statement per line, or 'exit' to quit.");

    let mut rl = Editor::<(), DefaultHistory>::new()?;
    if let Err(err) = rl.load_history(HISTORY_FILE) {
        if !err.to_string().contains("No such file or directory") {
            println!("Error loading history: {}", err);
        }
    }

    let mut session = Session::new();
    loop {
        match rl.readline("bnql> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);

                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if matches!(line, "exit" | "quit") {
                    println!("Goodbye!");
                    break;
                }

                match serde_json::from_str::<Statement>(line) {
                    Ok(statement) => print_response(&engine.execute(&mut session, &statement)),
                    Err(err) => println!("Error: invalid statement: {}", err),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {}", err);
                break;
            }
        }
    }

    if let Err(err) = rl.save_history(HISTORY_FILE) {
        println!("Error saving history: {}", err);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let engine = ExecutionEngine::with_config(cli.engine_config());

    match &cli.command {
        Some(Commands::Run { file }) => run_script(&engine, file),
        Some(Commands::Shell) | None => run_shell(&engine),
    }
}
