//! CLI argument definitions using clap
//!
//! Commands:
//! - squema describe --schema <path> [--class <name>]
//! - squema render --schema <path> --class <name> --values <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// squema - typed schema value objects
#[derive(Parser, Debug)]
#[command(name = "squema")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Emit schema lifecycle events (TRACE logs)
    #[arg(long, global = true)]
    pub trace: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the field tables of declared classes
    Describe {
        /// Path to the schema document
        #[arg(long, default_value = "./schema.json")]
        schema: PathBuf,

        /// Only describe this class
        #[arg(long)]
        class: Option<String>,
    },

    /// Build an instance from a JSON values file and print it
    Render {
        /// Path to the schema document
        #[arg(long, default_value = "./schema.json")]
        schema: PathBuf,

        /// Class to instantiate
        #[arg(long)]
        class: String,

        /// Path to a JSON object (named) or array (positional) of values
        #[arg(long)]
        values: PathBuf,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Describe { .. } => "describe",
            Command::Render { .. } => "render",
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_render() {
        let cli = Cli::try_parse_from([
            "squema", "render", "--schema", "s.json", "--class", "Point", "--values", "v.json",
        ])
        .unwrap();
        assert!(!cli.trace);
        match cli.command {
            Command::Render { schema, class, values } => {
                assert_eq!(schema, PathBuf::from("s.json"));
                assert_eq!(class, "Point");
                assert_eq!(values, PathBuf::from("v.json"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_describe_defaults() {
        let cli = Cli::try_parse_from(["squema", "describe", "--trace"]).unwrap();
        assert!(cli.trace);
        assert_eq!(cli.command.name(), "describe");
        match cli.command {
            Command::Describe { schema, class } => {
                assert_eq!(schema, PathBuf::from("./schema.json"));
                assert!(class.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_render_requires_class() {
        assert!(Cli::try_parse_from(["squema", "render", "--values", "v.json"]).is_err());
    }
}
