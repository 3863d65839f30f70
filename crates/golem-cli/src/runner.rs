use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::job::run_job;

#[derive(Parser)]
#[command(version, name = "golem")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a job on local workers and print the final job details
    Run(RunArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// The JSON task file, e.g. `[{"count": 3, "args": ["echo", "hi"]}]`
    pub tasks: PathBuf,
    /// The number of local workers
    #[arg(long, default_value_t = 1)]
    pub workers: usize,
    /// The number of work units each worker runs at the same time
    #[arg(long, default_value_t = 1)]
    pub capacity: usize,
    /// The directory for the job log files (overrides the configuration)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
    #[arg(long)]
    pub owner: Option<String>,
    #[arg(long)]
    pub label: Option<String>,
    #[arg(long = "type")]
    pub job_type: Option<String>,
}

pub fn main(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse_from(args);

    match cli.command {
        Command::Run(args) => run_job(args)?,
    }
    Ok(())
}
