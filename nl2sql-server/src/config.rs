//! Configuration for the NL2SQL server
//!
//! CLI arguments and environment variable handling using clap. A `.env`
//! file in the working directory is loaded before parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use nl2sql_core::{OllamaConfig, PipelineConfig};

/// NL2SQL - ask questions of a SQL database in plain language
#[derive(Parser, Debug, Clone)]
#[command(name = "nl2sql-server")]
#[command(about = "Natural-language to SQL service backed by Ollama and SQLite")]
pub struct Args {
    /// Ollama server root
    #[arg(long, env = "OLLAMA_BASE_URL", default_value = "http://localhost:11434")]
    pub ollama_base_url: String,

    /// Model used for generation and explanation
    #[arg(long, env = "OLLAMA_MODEL", default_value = "llama2")]
    pub ollama_model: String,

    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH", default_value = "./data/sample.db")]
    pub database_path: PathBuf,

    /// Interface to bind the HTTP API to
    #[arg(long, env = "API_HOST", default_value = "0.0.0.0")]
    pub api_host: String,

    /// Port for the HTTP API
    #[arg(long, env = "API_PORT", default_value = "8000")]
    pub api_port: u16,

    /// Row ceiling for SELECT statements without a LIMIT
    #[arg(long, env = "DEFAULT_ROW_LIMIT", default_value = "100")]
    pub default_row_limit: u32,

    /// Timeout for each oracle call, in seconds
    #[arg(long, env = "GENERATION_TIMEOUT_SECS", default_value = "120")]
    pub generation_timeout_secs: u64,

    /// Timeout for each statement, in seconds
    #[arg(long, env = "EXECUTION_TIMEOUT_SECS", default_value = "30")]
    pub execution_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Create and populate the demo tables on startup
    #[arg(long, env = "SEED_SAMPLE_DATA", default_value = "true", action = ArgAction::Set)]
    pub seed_sample_data: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP API (default)
    Serve,

    /// Create the demo tables and print a summary
    InitDb {
        /// Drop the demo tables before recreating them
        #[arg(long)]
        reset: bool,
    },

    /// Answer one question and print the result as JSON
    Ask {
        question: String,

        /// Row ceiling for this question
        #[arg(long)]
        limit: Option<u32>,

        /// Execute the generated SQL, not just generate it
        #[arg(long)]
        execute: bool,
    },

    /// List the models Ollama can serve
    Models,

    /// Check database and Ollama connectivity
    Health,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.default_row_limit == 0 {
            return Err("DEFAULT_ROW_LIMIT must be a positive integer".to_string());
        }

        if self.generation_timeout_secs == 0 {
            return Err("GENERATION_TIMEOUT_SECS must be greater than zero".to_string());
        }

        if self.execution_timeout_secs == 0 {
            return Err("EXECUTION_TIMEOUT_SECS must be greater than zero".to_string());
        }

        if let Some(Command::Ask { limit: Some(0), .. }) = &self.command {
            return Err("--limit must be a positive integer".to_string());
        }

        Ok(())
    }

    /// Address the HTTP API binds to.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            default_row_limit: self.default_row_limit,
            generation_timeout: Duration::from_secs(self.generation_timeout_secs),
            execution_timeout: Duration::from_secs(self.execution_timeout_secs),
            ..PipelineConfig::default()
        }
    }

    pub fn ollama_config(&self) -> OllamaConfig {
        OllamaConfig {
            request_timeout: Duration::from_secs(self.generation_timeout_secs),
            ..OllamaConfig::new(&self.ollama_base_url, &self.ollama_model)
        }
    }

    /// Subcommand to run, `serve` when none was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["nl2sql-server"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_explicit_flags() {
        let args = parse(&[
            "--ollama-model",
            "sqlcoder",
            "--api-port",
            "9000",
            "--default-row-limit",
            "25",
            "--seed-sample-data",
            "false",
            "--log-format",
            "json",
        ]);

        assert_eq!(args.ollama_model, "sqlcoder");
        assert_eq!(args.listen_addr(), format!("{}:9000", args.api_host));
        assert_eq!(args.pipeline_config().default_row_limit, 25);
        assert!(!args.seed_sample_data);
        assert_eq!(args.log_format, LogFormat::Json);
        assert_eq!(args.command(), Command::Serve);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_subcommands() {
        let args = parse(&["ask", "how many orders?", "--limit", "5", "--execute"]);
        assert_eq!(
            args.command(),
            Command::Ask {
                question: "how many orders?".to_string(),
                limit: Some(5),
                execute: true,
            }
        );

        let args = parse(&["init-db", "--reset"]);
        assert_eq!(args.command(), Command::InitDb { reset: true });
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        assert!(parse(&["--default-row-limit", "0"]).validate().is_err());
        assert!(parse(&["--generation-timeout-secs", "0"]).validate().is_err());
        assert!(parse(&["--execution-timeout-secs", "0"]).validate().is_err());
        assert!(parse(&["ask", "q", "--limit", "0"]).validate().is_err());
    }

    #[test]
    fn test_timeouts_flow_into_core_config() {
        let args = parse(&["--generation-timeout-secs", "7", "--execution-timeout-secs", "3"]);
        let pipeline = args.pipeline_config();
        assert_eq!(pipeline.generation_timeout, Duration::from_secs(7));
        assert_eq!(pipeline.execution_timeout, Duration::from_secs(3));
        assert_eq!(args.ollama_config().request_timeout, Duration::from_secs(7));
    }
}
