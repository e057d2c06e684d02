use clap::{Args, Parser, Subcommand};
use notifybox::humanize::HumanDuration;
use notifybox::request::{BodyFormat, NotifyType};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "notifybox")]
#[command(about = "Notify URL-described services about a finished job", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to $NOTIFYBOX_CONFIG or config/notifybox.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short = 'D', long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one notification to every target
    Send(SendArgs),
    /// List the supported schemes
    Schemes,
    /// Show how a target URL is decomposed and routed
    Parse(ParseArgs),
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Target URLs; repeatable, each value may hold several separated by space, `;` or `,`
    #[arg(short = 's', long = "servers", value_name = "URLS")]
    pub servers: Vec<String>,

    #[arg(short = 't', long, default_value = "")]
    pub title: String,

    #[arg(short = 'b', long, default_value = "")]
    pub body: String,

    /// info, success, warning or failure
    #[arg(short = 'n', long = "notify-type", default_value = "info")]
    pub notify_type: NotifyType,

    /// text, html or markdown
    #[arg(short = 'f', long = "body-format", default_value = "text")]
    pub body_format: BodyFormat,

    /// Attach the themed image for the notification type
    #[arg(short = 'i', long = "include-image")]
    pub include_image: bool,

    /// Override image, http(s):// or file://; implies --include-image
    #[arg(short = 'u', long = "image-url")]
    pub image: Option<String>,

    /// Delay between sends to the recipients of one target, e.g. "2s"
    #[arg(long)]
    pub throttle: Option<HumanDuration>,

    /// Print the batch report as JSON
    #[arg(long)]
    pub json: bool,

    /// Exit non-zero unless every target was delivered
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct ParseArgs {
    pub url: String,

    /// Scheme used when the URL has none
    #[arg(long)]
    pub default_scheme: Option<String>,
}
