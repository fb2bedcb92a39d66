use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(about = "Virtual gallery viewer and client", version)]
pub struct Args {
    /// Viewer configuration JSON
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open the 3D gallery window (default)
    View {
        /// Gallery backend base URL, e.g. http://localhost:3000
        #[arg(long)]
        api: Option<String>,

        /// Read gallery data from a local JSON file instead of the backend
        #[arg(long)]
        gallery: Option<PathBuf>,
    },

    /// Register with the backend and remember the returned user id
    Join {
        #[arg(long)]
        api: Option<String>,
    },

    /// Upload an image into a free frame
    Upload {
        #[arg(long)]
        api: Option<String>,

        /// Frame slot id, e.g. backLeft
        #[arg(long)]
        frame: String,

        /// Image file (JPEG, PNG, GIF or WEBP, up to 5MB)
        path: PathBuf,
    },

    /// Print the saved user id
    Whoami,
}

impl Args {
    pub fn command_or_default(&self) -> Command {
        self.command.clone().unwrap_or(Command::View {
            api: None,
            gallery: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_view() {
        let args = Args::parse_from(["gallery_viewer"]);
        assert_eq!(
            args.command_or_default(),
            Command::View {
                api: None,
                gallery: None
            }
        );
    }

    #[test]
    fn test_upload_args() {
        let args = Args::parse_from([
            "gallery_viewer",
            "upload",
            "--api",
            "http://localhost:3000",
            "--frame",
            "backLeft",
            "art.png",
            "--config",
            "viewer.json",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("viewer.json")));
        assert_eq!(
            args.command_or_default(),
            Command::Upload {
                api: Some("http://localhost:3000".into()),
                frame: "backLeft".into(),
                path: PathBuf::from("art.png"),
            }
        );
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        <Args as CommandFactory>::command().debug_assert();
    }
}
