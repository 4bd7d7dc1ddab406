//! CLI 명령 파싱 모듈.

use clap::{Parser, Subcommand};

use crate::application::usecases::respond_comment::ReplyOptions;
use crate::domain::review::RunOptions;

#[derive(Debug, Parser)]
#[command(name = "reviewpilot")]
#[command(about = "Incremental AI review bot for GitHub PRs")]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// PR URL
    url: Option<String>,

    /// Print results to stdout, do not post
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show effective merged config
    Config,
    /// Reply to a review thread comment
    Reply {
        /// PR URL
        url: String,
        /// Review comment id to respond to
        #[arg(long)]
        comment_id: u64,
    },
}

pub enum CliAction {
    InspectConfig,
    Review(RunOptions),
    Reply(ReplyOptions),
}

impl Cli {
    pub fn parse_action() -> Result<CliAction, String> {
        let cli = Cli::parse();

        match cli.command {
            Some(Commands::Config) => Ok(CliAction::InspectConfig),
            Some(Commands::Reply { url, comment_id }) => {
                Ok(CliAction::Reply(ReplyOptions { url, comment_id }))
            }
            None => {
                let Some(url) = cli.url else {
                    return Err("a PR URL is required. Usage: reviewpilot <pr-url>".to_string());
                };

                Ok(CliAction::Review(RunOptions {
                    url,
                    dry_run: cli.dry_run,
                }))
            }
        }
    }
}
