use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use snippet_collector::export;

const LOG_ENV: &str = "SNIPPET_COLLECTOR_LOG";

#[derive(Parser, Debug)]
#[command(
    name = "snippet-collector",
    version,
    about = "Collect annotated code snippets from your editor and export them as markdown",
    long_about = "Collect annotated code snippets from your editor and export them as markdown.\n\n\
        The editor talks to the collector over the Language Server Protocol; select code,\n\
        run the \"Add snippet\" code action, and export the collection when done.\n\n\
        Examples:\n  \
        snippet-collector lsp\n  \
        snippet-collector render snippets.json --output notes/snippets.md\n  \
        snippet-collector render snippets.json --output notes/snippets.md --append"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the Language Server Protocol server (stdio)
    Lsp,

    /// Render a saved snippet list to markdown
    #[command(long_about = "Render a saved snippet list to markdown.\n\n\
        The input is the JSON payload of a `snippets/changed` notification\n\
        or a bare array of snippets. Without --output the markdown is printed.")]
    Render {
        /// JSON file containing the snippets
        input: PathBuf,

        #[arg(long, short, help = "Write to this file instead of stdout")]
        output: Option<PathBuf>,

        #[arg(long, short, requires = "output", help = "Append to the output file")]
        append: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // stdout carries the LSP stream; logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Command::Lsp => {
            snippet_collector::lsp::serve_stdio().await;
            Ok(ExitCode::SUCCESS)
        }

        Command::Render {
            input,
            output,
            append,
        } => {
            let append_to = if append { output.as_deref() } else { None };
            let (markdown, count) = snippet_collector::render_file(&input, append_to).await?;
            match output {
                Some(path) => {
                    export::write_file(&path, &markdown).await?;
                    eprintln!("Wrote {count} snippet(s) to {}", path.display());
                }
                None => print!("{markdown}"),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
