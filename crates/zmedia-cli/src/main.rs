use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use zmedia::Document;

#[derive(Debug, Parser)]
#[command(
    name = "zmedia",
    version,
    about = "Read, edit and format XML state documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the value at a node path such as `Player/@Position`
    Get {
        #[arg(value_name = "PATH")]
        path: String,
        /// Input file (defaults to stdin)
        #[arg(value_name = "INPUT")]
        input: Option<PathBuf>,
    },
    /// Write a value at a node path, creating missing elements
    Set {
        #[arg(value_name = "PATH")]
        path: String,
        #[arg(value_name = "VALUE")]
        value: String,
        /// Input file (defaults to stdin)
        #[arg(value_name = "INPUT")]
        input: Option<PathBuf>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Re-serialize a document
    Fmt {
        /// Input file (defaults to stdin)
        #[arg(value_name = "INPUT")]
        input: Option<PathBuf>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Emit an empty document with the given root element
    New {
        #[arg(value_name = "ROOT")]
        root: String,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Debug, Args)]
struct OutputArgs {
    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,
    /// Write everything on one line instead of tab-indented
    #[arg(long)]
    compact: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    if let Err(e) = run(Cli::parse()) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Get { path, input } => {
            let doc = load(&input)?;
            match doc.node_path_value(&path) {
                Some(value) => {
                    let mut stdout = io::stdout();
                    writeln!(stdout, "{value}").context("failed to write stdout")?;
                    Ok(())
                }
                None => bail!("no value at node path {path:?}"),
            }
        }
        Command::Set {
            path,
            value,
            input,
            output,
        } => {
            let mut doc = load(&input)?;
            doc.set_node_path_value(&path, value)
                .with_context(|| format!("failed to set node path {path:?}"))?;
            emit(&doc, &output)
        }
        Command::Fmt { input, output } => emit(&load(&input)?, &output),
        Command::New { root, output } => match Document::new(&root) {
            Some(doc) => emit(&doc, &output),
            None => bail!("invalid root element name {root:?}"),
        },
    }
}

fn load(path: &Option<PathBuf>) -> Result<Document> {
    let input = read_input(path)?;
    let doc = Document::parse(&input).context("failed to parse XML input")?;
    debug!(nodes = doc.node_count(), "loaded document");
    Ok(doc)
}

fn emit(doc: &Document, args: &OutputArgs) -> Result<()> {
    let mut xml = doc.to_xml(!args.compact);
    xml.push('\n');
    write_output(&args.output, xml.as_bytes())
}

fn read_input(path: &Option<PathBuf>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            if buffer.trim().is_empty() {
                bail!("no input provided on stdin");
            }
            Ok(buffer)
        }
    }
}

fn write_output(path: &Option<PathBuf>, data: &[u8]) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, data)
            .with_context(|| format!("failed to write output file {}", path.display())),
        None => {
            let mut stdout = io::stdout();
            stdout.write_all(data).context("failed to write stdout")?;
            Ok(())
        }
    }
}
