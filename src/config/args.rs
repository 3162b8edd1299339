//! Command-line argument parsing

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "clickmatch", version, about = "Install attribution service")]
pub struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print a sample configuration file
    GenerateConfig {
        /// Write to this path instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },
}

impl Args {
    /// 未指定子命令时运行服务器
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}
