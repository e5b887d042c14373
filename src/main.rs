use clap::Parser;
use std::process;

use taskctl::cli::commands::{Cli, Commands};
use taskctl::cli;
use taskctl::config::Config;
use taskctl::logging;

fn main() {
    let cli_args = Cli::parse();
    let json_output = cli_args.json;
    let project_flag = cli_args.project.clone();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(e.code().exit_code());
        }
    };
    logging::init(&config.log_level);

    let exit_code = match cli_args.command {
        Commands::Project(cmd) => cli::project::run(cmd, json_output),
        Commands::Plan(cmd) => cli::plan::run(cmd, project_flag.as_deref(), json_output),
        Commands::Task(cmd) => cli::task::run(cmd, project_flag.as_deref(), json_output),
        Commands::Schedule(cmd) => cli::schedule::run(cmd, project_flag.as_deref(), json_output),
        Commands::Pr(cmd) => cli::pr::run(cmd, project_flag.as_deref(), json_output),
        Commands::Status { plan } => cli::status::run(&plan, project_flag.as_deref(), json_output),
        Commands::McpServe => cli::mcp::run(),
    };

    process::exit(exit_code);
}
