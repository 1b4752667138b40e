//! brochure is a CLI tool that turns a company website into a short brochure
//! written by an LLM.
//!
//! The tool has two commands:
//! 1. `generate` - Builds a brochure for one company and saves it to a file
//! 2. `serve` - Runs the web front end with a form and a download link

use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Builder;
use log::{LevelFilter, info, warn};

use brochure::{
    FailurePolicy, ModelSettings, Pipeline,
    constants::{DEFAULT_MODEL, DEFAULT_OUTPUT_FILE, MODEL_ENV_NAME},
    render::print_markdown,
    web,
};

/// A CLI tool to generate a company brochure from its website
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The command to execute (generate or serve)
    #[command(subcommand)]
    command: Command,

    /// Model to use as backend://model, e.g. openai://gpt-4o-mini
    #[arg(long, short, env = MODEL_ENV_NAME, default_value = DEFAULT_MODEL, global = true)]
    model: String,

    #[arg(long, short, action = clap::ArgAction::Count, help = "Output v(v...)erbosity: error (0), warn (1), info (2), debug (3), trace (4)", global = true, default_value_t = 2)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a brochure, save it to a file and print it
    Generate {
        /// Company name
        #[arg(long)]
        company: String,
        /// Company website URL
        #[arg(long)]
        url: String,
        /// Language to write the brochure in
        #[arg(long, short)]
        language: Option<String>,
        /// Path to the output file
        #[arg(long, short, default_value = DEFAULT_OUTPUT_FILE)]
        output: String,
        /// Skip selected pages that fail to load instead of aborting
        #[arg(long)]
        skip_failed: bool,
        /// Print the brochure as the model writes it
        #[arg(long)]
        stream: bool,
    },
    /// Run the web front end
    Serve {
        /// Address to listen on
        #[arg(long, short, default_value = "0.0.0.0:5000")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    Builder::new()
        .filter_level(match cli.verbose {
            0 => LevelFilter::Error,
            1 => LevelFilter::Warn,
            2 => LevelFilter::Info,
            3 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .init();

    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(err) => info!("No .env file loaded: {err}"),
    }

    let settings = ModelSettings::from_env(&cli.model)?;
    settings.check_api_key();

    match cli.command {
        Command::Generate {
            company,
            url,
            language,
            output,
            skip_failed,
            stream,
        } => {
            let policy = if skip_failed {
                FailurePolicy::SkipFailed
            } else {
                FailurePolicy::FailFast
            };
            let pipeline = Pipeline::from_settings(&settings)?.with_policy(policy);
            handle_generate_command(&pipeline, &company, &url, language.as_deref(), &output, stream)
                .await
        }
        Command::Serve { bind } => {
            let pipeline =
                Pipeline::from_settings(&settings)?.with_policy(FailurePolicy::SkipFailed);
            web::serve(pipeline, &bind)
                .await
                .context(format!("Web server on {bind} failed"))
        }
    }
}

async fn handle_generate_command(
    pipeline: &Pipeline,
    company: &str,
    url: &str,
    language: Option<&str>,
    output: &str,
    stream: bool,
) -> Result<()> {
    let brochure = if stream {
        let mut stdout = io::stdout();
        let mut printed = 0;
        let brochure = pipeline
            .stream_brochure(company, url, language, |partial| {
                if let Some(delta) = partial.get(printed..) {
                    write!(stdout, "{delta}").and_then(|()| stdout.flush()).ok();
                    printed = partial.len();
                }
            })
            .await?;
        println!();
        brochure
    } else {
        let brochure = pipeline.create_brochure(company, url, language).await?;
        print_markdown(&brochure.markdown).context("Failed to render brochure")?;
        brochure
    };

    for page in &brochure.details.omitted {
        warn!("Left out {} ({}): {}", page.label, page.url, page.reason);
    }

    fs::write(output, &brochure.markdown)
        .context(format!("Failed to write brochure file: {output}"))?;
    println!("Brochure saved to {output}");

    Ok(())
}
