use clap::{Parser, Subcommand};
use colored::Colorize;
use notejam_core::{DeployContext, Environment};
use notejam_stacks::Assembler;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "notejam")]
#[command(about = "Assemble the NoteJam multi-tier cloud deployment topology", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize the deployment graph
    Synth {
        /// Target environment type (dev)
        #[arg(long, env = "NOTEJAM_ENVIRONMENT_TYPE")]
        environment_type: Option<String>,
        /// Ephemeral feature environment id (e.g. pr123)
        #[arg(long, env = "NOTEJAM_FEATURE_ID")]
        feature_id: Option<String>,
        /// Credential profile handed to the provisioning engine
        #[arg(long, env = "NOTEJAM_PROFILE")]
        profile: Option<String>,
        /// Write the graph to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print version
    Version,
}

fn main() -> anyhow::Result<()> {
    // stdout carries the synthesized graph; logs go to stderr
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Version => {
            println!("notejam {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Synth {
            environment_type,
            feature_id,
            profile,
            output,
        } => synth(environment_type, feature_id, profile, output),
    }
}

fn synth(
    environment_type: Option<String>,
    feature_id: Option<String>,
    profile: Option<String>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let context = DeployContext {
        environment_type,
        feature_id,
        profile,
    };
    let environment = Environment::resolve(&context)?;

    let graph = Assembler::new(&environment).assemble()?;
    let json = serde_json::to_string_pretty(&graph)?;

    match output {
        Some(path) => {
            std::fs::write(&path, json)?;
            eprintln!(
                "{} wrote deployment graph to {}",
                "✓".green(),
                path.display().to_string().cyan()
            );
        }
        None => println!("{json}"),
    }

    Ok(())
}
