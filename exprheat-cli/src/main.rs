use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod error;

use commands::ViewArgs;
use config::Config;
use error::CliError;

#[derive(Parser)]
#[command(name = "exprheat")]
#[command(about = "ExprHeat - gene-expression heatmap renderer")]
#[command(version)]
#[command(long_about = "
ExprHeat renders gene-expression matrices as annotated heatmaps with a diverging
color scale, categorical annotation bars and legends.

Examples:
  exprheat render --data expr.json --setting setting.json --out heatmap.svg
  exprheat render --data expr.json --out heatmap.png --hide Sex:Male --max 2.5
  exprheat hover --data expr.json --setting setting.json --x 140 --y 32
  exprheat config --example > exprheat.toml
  exprheat --config custom.toml config --write merged.toml
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Expression data (JSON with samples, genes and metadata)
    #[arg(long, required = true)]
    pub data: PathBuf,

    /// Display setting (JSON, camelCase keys)
    #[arg(long)]
    pub setting: Option<PathBuf>,

    /// Container width in pixels
    #[arg(long)]
    pub width: Option<f64>,

    /// Viewport height in pixels
    #[arg(long)]
    pub height: Option<f64>,

    /// Hide one annotation category, as <Annotation>:<value> (repeatable)
    #[arg(long, value_name = "KEY")]
    pub hide: Vec<String>,
}

impl InputArgs {
    fn into_view_args(self, min: Option<f64>, max: Option<f64>) -> ViewArgs {
        ViewArgs {
            data: self.data,
            setting: self.setting,
            width: self.width,
            height: self.height,
            hide: self.hide,
            min,
            max,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export the heatmap with annotation bars and legends to SVG/PNG
    Render {
        #[command(flatten)]
        input: InputArgs,

        /// Output file (format follows the extension: .svg or .png)
        #[arg(short, long, required = true)]
        out: PathBuf,

        /// Lower color-scale boundary (clamped to [-bound, 0])
        #[arg(long, allow_hyphen_values = true)]
        min: Option<f64>,

        /// Upper color-scale boundary (clamped to [0, bound])
        #[arg(long, allow_hyphen_values = true)]
        max: Option<f64>,

        /// Chart title
        #[arg(long)]
        title: Option<String>,

        /// Omit the footer (makes SVG output byte-reproducible)
        #[arg(long)]
        no_footer: bool,

        /// Fail instead of writing a placeholder when nothing is left to draw
        #[arg(long)]
        strict: bool,
    },

    /// Print the tooltip for a canvas-relative pointer position
    Hover {
        #[command(flatten)]
        input: InputArgs,

        /// Pointer x relative to the cell canvas
        #[arg(long, allow_hyphen_values = true)]
        x: f64,

        /// Pointer y relative to the cell canvas
        #[arg(long, allow_hyphen_values = true)]
        y: f64,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration helpers
    Config {
        /// Print an example exprheat.toml
        #[arg(long)]
        example: bool,

        /// Write the effective configuration to a file
        #[arg(long, value_name = "PATH")]
        write: Option<PathBuf>,
    },
}

fn setup_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Config { example: true, .. } = cli.command {
        print!("{}", Config::example_toml()?);
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Render {
            input,
            out,
            min,
            max,
            title,
            no_footer,
            strict,
        } => {
            let args = input.into_view_args(min, max);
            commands::render::execute(&config, &args, &out, title, !no_footer, strict)?;
        }

        Commands::Hover { input, x, y, json } => {
            let args = input.into_view_args(None, None);
            commands::hover::execute(&config, &args, x, y, json)?;
        }

        Commands::Config { write: Some(path), .. } => {
            config.save_to_file(&path)?;
            log::info!("Wrote configuration to {}", path.display());
        }

        Commands::Config { .. } => {
            return Err(CliError::config("Nothing to do: pass --example or --write <PATH>").into());
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    if let Err(err) = run(cli) {
        match err.downcast_ref::<CliError>() {
            Some(cli_err) => error::print_error_and_exit(cli_err),
            None => {
                eprintln!("Error: {:#}", err);
                std::process::exit(1);
            }
        }
    }
}
