//=====================================================
// File: main.rs
//=====================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: QuillScript CLI entry point
// Objective: Run .quill scripts with the default host functions, or print
//            their token stream, with logging controlled through QUILL_LOG
//=====================================================

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use quillscript::config::{RunConfig, parse_variable_override};
use quillscript::runtime::strip_comments;
use quillscript::tokenizer::Tokenizer;
use quillscript::{OutputSink, Runtime, ScriptError, StdlibRegistry};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "quill", about = "QuillScript CLI")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute a script.
    Run(RunArgs),
    /// Print the token stream of a script, one token per line.
    Tokens(TokensArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Path to the script to execute.
    pub script: PathBuf,

    /// TOML file with call-depth limit and initial bindings.
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Initial variable as name=value; may be repeated.
    #[arg(long = "var", value_name = "NAME=VALUE")]
    pub vars: Vec<String>,

    /// Print the top-level memory as JSON after execution.
    #[arg(long = "dump")]
    pub dump: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct TokensArgs {
    /// Path to the script to tokenize.
    pub script: PathBuf,
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    let outcome = match args.command {
        Command::Run(cmd) => run_entry(cmd),
        Command::Tokens(cmd) => tokens_entry(cmd),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Script failures already carry their error[E00x] prefix.
            match err.downcast_ref::<ScriptError>() {
                Some(script_error) => eprintln!("{}", script_error),
                None => eprintln!("error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("QUILL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_script(path: &PathBuf) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading script {}", path.display()))
}

fn run_entry(args: RunArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };

    let mut runtime = Runtime::with_options(config.runtime_options());
    StdlibRegistry::with_defaults(OutputSink::Stdout).install(&mut runtime)?;
    config.apply(&mut runtime)?;
    for raw in &args.vars {
        let (name, value) = parse_variable_override(raw)?;
        runtime
            .register_variable(&name, value)
            .with_context(|| format!("applying --var {}", raw))?;
    }

    let source = read_script(&args.script)?;
    if let Some(value) = runtime.exec(&source)? {
        println!("{}", value);
    }

    if args.dump {
        let dump = serde_json::to_string_pretty(&runtime.memory_dump())?;
        println!("{}", dump);
    }
    Ok(())
}

fn tokens_entry(args: TokensArgs) -> Result<()> {
    let source = read_script(&args.script)?;
    let stripped = strip_comments(&source);
    let tokens = Tokenizer::new(&stripped)
        .tokenize()
        .map_err(ScriptError::from)?;
    for token in tokens {
        println!("{:?}", token);
    }
    Ok(())
}

//=====================================================
// End of file
//=====================================================
