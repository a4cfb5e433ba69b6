use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the menutree binary.
#[derive(Debug, Parser)]
#[command(
    name = "menutree",
    version,
    about = "Organize flat CMS menu entries into a tree"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "MENUTREE_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub logging: LoggingOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Build a menu and print its tree as JSON.
    Tree(TreeArgs),
    /// Build a menu and render it through an HTML template.
    Render(RenderArgs),
}

impl Command {
    pub fn overrides(&self) -> &MenuOverrides {
        match self {
            Command::Tree(args) => &args.overrides,
            Command::Render(args) => &args.overrides,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct TreeArgs {
    /// Identifier of the menu to build.
    #[arg(long = "menu-id", value_name = "ID")]
    pub menu_id: u64,

    /// Pretty-print the JSON output.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub pretty: bool,

    #[command(flatten)]
    pub overrides: MenuOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    /// Identifier of the menu to build.
    #[arg(long = "menu-id", value_name = "ID")]
    pub menu_id: u64,

    /// Template to render with (nested|sitemap); defaults to `render.default_template`.
    #[arg(long, value_name = "NAME")]
    pub template: Option<String>,

    #[command(flatten)]
    pub overrides: MenuOverrides,
}

/// Logging flags accepted before or after the subcommand.
#[derive(Debug, Args, Default, Clone)]
pub struct LoggingOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct MenuOverrides {
    /// Override the menu export file.
    #[arg(long = "source", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub source: Option<PathBuf>,

    /// Override the cache backend (none|memory|file).
    #[arg(long = "cache-backend", value_name = "BACKEND")]
    pub cache_backend: Option<String>,

    /// Override the file cache directory.
    #[arg(long = "cache-dir", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub cache_dir: Option<PathBuf>,

    /// Override the cache entry time-to-live.
    #[arg(long = "cache-ttl-seconds", value_name = "SECONDS")]
    pub cache_ttl_seconds: Option<u64>,

    /// Rebuild from the source even when a cached tree exists.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub refresh: bool,
}
