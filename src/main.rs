use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use mathscript::ast_printer::AstPrinter;
use mathscript::interpreter::{Interpreter, DEFAULT_MAX_DEPTH};
use mathscript::parser::parse_source;
use mathscript::scanner::tokenize;
use mathscript::stmt::Stmt;
use mathscript::{repl, Builtins, MathScriptError, Value};

#[derive(ClapParser, Debug)]
#[command(version, about = "MathScript language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to mathscript.log
    #[arg(long, global = true)]
    log: bool,

    /// Maximum nesting depth of blocks and function calls
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes a file, printing each token
    Tokenize { filename: PathBuf },

    /// Parses a file and prints each statement's AST
    Parse { filename: PathBuf },

    /// Runs a file and prints the resulting variables
    Run {
        filename: PathBuf,

        /// Print the variables as JSON
        #[arg(long)]
        json: bool,
    },

    /// Starts an interactive session
    Repl,
}

/// Reads the contents of a file into a String.
fn read_file(filename: &PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut source = String::new();

    let bytes = reader
        .read_to_string(&mut source)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(source)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("mathscript.log").context("Failed to create mathscript.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'mathscript::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("mathscript::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to mathscript.log");
    Ok(())
}

/// Reports a pipeline failure and exits: 65 for static errors, 70 at runtime.
fn fail(e: MathScriptError) -> ! {
    debug!("Pipeline error: {:?}", e);
    eprintln!("Error: {}", e);

    std::process::exit(if e.is_static() { 65 } else { 70 });
}

fn print_variables(variables: &BTreeMap<String, Value>, json: bool) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(variables).context("Failed to encode variables")?;
        println!("{}", text);
        return Ok(());
    }

    println!("Variables:");
    for (name, value) in variables {
        println!("  {} = {}", name, value);
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    let mut interpreter = Interpreter::with_builtins(Builtins::standard(), Box::new(std::io::stdout()))
        .with_max_depth(args.max_depth);

    match args.commands {
        Commands::Tokenize { filename } => {
            let source = read_file(&filename)?;
            let tokens = tokenize(&source).unwrap_or_else(|e| fail(e));

            for token in &tokens {
                println!("{}", token);
            }

            info!("Tokenization completed successfully");
        }

        Commands::Parse { filename } => {
            let source = read_file(&filename)?;
            let statements: Vec<Stmt> = parse_source(&source).unwrap_or_else(|e| fail(e));

            for stmt in &statements {
                println!("{}", AstPrinter::print_stmt(stmt));
            }

            info!("Parse subcommand completed");
        }

        Commands::Run { filename, json } => {
            let source = read_file(&filename)?;
            let statements: Vec<Stmt> = parse_source(&source).unwrap_or_else(|e| fail(e));

            info!("Parsed {} statements", statements.len());

            if let Err(e) = interpreter.interpret(&statements) {
                fail(e);
            }

            info!("Program executed successfully");

            print_variables(&interpreter.snapshot(), json)?;
        }

        Commands::Repl => {
            repl::start(&mut interpreter).context("REPL I/O failure")?;
        }
    }

    Ok(())
}
