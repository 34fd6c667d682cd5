// src/cli/mod.rs — CLI definition (clap derive)

pub mod migrate;
pub mod run;
pub mod serve;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "promptspec",
    about = "Turn prompts into JSON specs, score them, and refine them",
    version
)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// SQLite database path (overrides config)
    #[arg(long, global = true)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Extract a spec from a prompt and store it as a new report
    Generate {
        #[arg(required = true, trailing_var_arg = true)]
        prompt: Vec<String>,
    },
    /// Score a stored report or a JSON spec file ("-" for stdin)
    Evaluate {
        /// Report ID to evaluate (the score is recorded on the report)
        #[arg(long, conflicts_with = "file")]
        report: Option<String>,
        /// JSON file containing the spec
        file: Option<String>,
    },
    /// Run the improvement loop and store the trail
    Iterate {
        #[arg(required = true, trailing_var_arg = true)]
        prompt: Vec<String>,
        /// Number of rounds (1-10, defaults to config)
        #[arg(short = 'n', long)]
        max_iters: Option<u32>,
        /// Print only the JSON result
        #[arg(long)]
        json: bool,
    },
    /// Print a stored report with its history
    Report {
        id: String,
    },
    /// Show migration status, apply pending migrations, or roll back
    Migrate {
        #[arg(long)]
        status: bool,
        #[arg(long, conflicts_with = "status")]
        rollback: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iterate() {
        let cli = Cli::parse_from(["promptspec", "iterate", "-n", "3", "design", "a", "robot"]);
        match cli.command {
            Commands::Iterate {
                prompt, max_iters, ..
            } => {
                assert_eq!(prompt.join(" "), "design a robot");
                assert_eq!(max_iters, Some(3));
            }
            _ => panic!("expected iterate"),
        }
    }

    #[test]
    fn test_parse_global_db_after_subcommand() {
        let cli = Cli::parse_from(["promptspec", "report", "abc", "--db", "/tmp/x.db"]);
        assert_eq!(cli.db.as_deref(), Some("/tmp/x.db"));
        assert!(matches!(cli.command, Commands::Report { ref id } if id == "abc"));
    }

    #[test]
    fn test_evaluate_report_conflicts_with_file() {
        let res = Cli::try_parse_from(["promptspec", "evaluate", "--report", "r1", "spec.json"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
