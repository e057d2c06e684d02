mod cli;

use clap::Parser;
use cli::{Cli, Commands, ParseArgs, SendArgs};
use notifybox::config::Config;
use notifybox::dispatch::{BatchReport, Dispatcher, Targets};
use notifybox::observability::{Metrics, init_tracing};
use notifybox::registry::SchemaRegistry;
use notifybox::request::NotificationRequest;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<ExitCode, BoxError> {
    let cli = Cli::parse();

    let config = Config::load_with(cli.config.clone())?;
    init_tracing(&config.logging, cli.debug);

    match cli.command {
        Commands::Send(args) => send(config, args).await,
        Commands::Schemes => {
            schemes();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Parse(args) => parse(&config, args),
    }
}

async fn send(mut config: Config, args: SendArgs) -> Result<ExitCode, BoxError> {
    let targets = if args.servers.is_empty() {
        Targets::from(config.dispatch.targets.clone())
    } else {
        args.servers.iter().flat_map(|s| Targets::parse(s).into_vec()).collect()
    };
    if targets.is_empty() {
        return Err("no targets: pass --servers or set NOTIFYBOX_TARGETS".into());
    }

    if args.include_image || args.image.is_some() {
        config.images.include = true;
    }
    if args.image.is_some() {
        config.images.override_image = args.image;
    }
    if let Some(throttle) = args.throttle {
        config.dispatch.throttle = throttle;
    }
    let strict = args.strict || config.dispatch.strict;

    let request = NotificationRequest::builder()
        .title(args.title)
        .body(args.body)
        .notify_type(args.notify_type)
        .body_format(args.body_format)
        .build();

    let dispatcher = Dispatcher::from_config(&config, Arc::new(Metrics::new()));

    let cancel = CancellationToken::new();
    let signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; stopping after the current call");
            signal.cancel();
        }
    });

    let report = dispatcher.dispatch_with_cancel(targets, &request, cancel).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    let success = if strict {
        report.all_succeeded()
    } else {
        report.legacy_success()
    };

    Ok(if success { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn print_report(report: &BatchReport) {
    for result in report.results() {
        let target = result.canonical.as_deref().unwrap_or(&result.target);
        let backend = result.backend.as_deref().unwrap_or("-");
        println!("{:<18} {:<10} {}", result.state.as_str(), backend, target);
        if !result.message.is_empty() {
            println!("{:<18} {}", "", result.message);
        }
    }
    println!(
        "{}/{} delivered{}",
        report.delivered(),
        report.results().len(),
        if report.cancelled { " (cancelled)" } else { "" }
    );
}

fn schemes() {
    let registry = SchemaRegistry::with_defaults();
    for descriptor in registry.descriptors() {
        let scheme = if descriptor.secure_variant {
            format!("{0}, {0}s", descriptor.scheme)
        } else {
            descriptor.scheme.to_string()
        };
        let required: Vec<_> = descriptor.required_fields().collect();
        let optional: Vec<_> = descriptor.optional_fields().collect();
        println!(
            "{:<14} {:<11} required: {:<24} optional: {}",
            scheme,
            descriptor.backend,
            required.join(", "),
            optional.join(", ")
        );
    }
}

fn parse(config: &Config, args: ParseArgs) -> Result<ExitCode, BoxError> {
    let registry = SchemaRegistry::with_defaults();
    let default_scheme = args
        .default_scheme
        .unwrap_or_else(|| config.dispatch.default_scheme.clone());

    let target = registry.decomposer(&default_scheme).decompose(&args.url)?;
    println!("canonical  {}", target.redacted());
    println!("scheme     {}", target.scheme);
    println!("host       {}", target.host);
    if let Some(port) = target.port {
        println!("port       {}", port);
    }
    if let Some(user) = &target.user {
        println!("user       {}", user);
    }
    if !target.path.is_empty() {
        println!("path       {}", target.path);
    }

    let resolution = match registry.resolve(&target.scheme) {
        Ok(resolution) => resolution,
        Err(e) => {
            println!("backend    - ({})", e);
            return Ok(ExitCode::FAILURE);
        }
    };
    println!(
        "backend    {}{}",
        resolution.descriptor().backend,
        if resolution.secure() { " (secure)" } else { "" }
    );

    match registry.extract(&resolution, &target) {
        Ok(args) => {
            for (name, value) in &args.fields {
                println!("{:<10} {}", name, value);
            }
            if !args.recipients.is_empty() {
                println!("recipients {}", args.recipient_labels().join(", "));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("invalid    {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}
