//! Command-line definitions

use choirlibrary::Category;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// ChoirPortal - shared music, scores, videos, images and documents of the choir
#[derive(Parser, Debug)]
#[command(name = "choirportal")]
#[command(about = "Member portal of the choir: browse, upload and play shared content", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration directory (defaults to CHOIRPORTAL_CONFIG or ~/.choirportal)
    #[arg(long, global = true)]
    pub config_dir: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the content categories
    Categories,

    /// List the items of a category, newest first
    List {
        category: Category,

        /// Only items whose title or description contains this text
        #[arg(long)]
        filter: Option<String>,
    },

    /// Upload a file or add a link (admins only)
    Add(AddArgs),

    /// Delete an item and its stored file (admins only)
    Remove {
        category: Category,

        /// Id of the item
        id: String,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Retry deletion of files left behind by failed removals (admins only)
    Sweep { category: Category },

    /// Play a music or video item
    Play {
        category: Category,

        /// Id of the item
        id: String,

        /// Length of the media in seconds, when known
        #[arg(long)]
        duration: Option<f64>,
    },

    /// Show the signed-in member
    Whoami,

    /// Update the display name of the signed-in member
    Profile {
        #[arg(long)]
        name: String,
    },

    /// Upload a new avatar image
    Avatar { path: PathBuf },

    /// Show or change the backend connection settings
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    pub category: Category,

    /// Title of the item (defaults to the file name without extension)
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Local file to upload
    #[arg(long, conflicts_with = "url", required_unless_present = "url")]
    pub file: Option<PathBuf>,

    /// External link to store
    #[arg(long)]
    pub url: Option<String>,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Base URL of the backend
    #[arg(long)]
    pub url: Option<String>,

    /// Public anon key of the project
    #[arg(long)]
    pub anon_key: Option<String>,

    /// Session token of the signed-in member (stored encrypted)
    #[arg(long, conflicts_with = "clear_token")]
    pub token: Option<String>,

    /// Forget the session token
    #[arg(long)]
    pub clear_token: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_add_requires_a_source() {
        assert!(Cli::try_parse_from(["choirportal", "add", "music", "--title", "x"]).is_err());
        assert!(Cli::try_parse_from([
            "choirportal",
            "add",
            "videos",
            "--file",
            "a.mp4",
            "--url",
            "https://x"
        ])
        .is_err());

        let cli = Cli::try_parse_from([
            "choirportal",
            "add",
            "videos",
            "--title",
            "Concert Clip",
            "--url",
            "https://youtube.com/watch?v=xyz",
        ])
        .unwrap();
        match cli.command {
            Commands::Add(args) => {
                assert_eq!(args.category, Category::Videos);
                assert_eq!(args.url.as_deref(), Some("https://youtube.com/watch?v=xyz"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        assert!(Cli::try_parse_from(["choirportal", "list", "podcasts"]).is_err());
    }
}
