use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use tracing::error;

use setup_edgedb::config::{CLI_PACKAGE, SetupConfig, log_path};
use setup_edgedb::index::{HttpIndexFetcher, index_url};
use setup_edgedb::install::Installer;
use setup_edgedb::logging::{LogFormat, init_logging, level_for_verbosity};
use setup_edgedb::platform::IndexKey;
use setup_edgedb::resolver::{PackageResolver, RequestedVersion};

#[derive(Parser)]
#[command(name = "setup-edgedb")]
#[command(version, about = "Resolve and install EdgeDB builds from the package index")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct GlobalArgs {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    /// Write logs to the data directory instead of stderr
    #[arg(long, global = true)]
    log_file: bool,

    /// Package server root URL
    #[arg(long, global = true)]
    package_root: Option<String>,

    /// Target architecture (x86_64, aarch64); defaults to the host
    #[arg(long, global = true)]
    arch: Option<String>,

    /// Target OS or index platform tag; defaults to the host
    #[arg(long, global = true)]
    platform: Option<String>,

    /// Linux libc flavour (musl, gnu)
    #[arg(long, global = true)]
    libc: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the packages selected for each request as JSON lines
    Resolve {
        /// Requests as `name[@version]`; version is `stable`, `nightly` or a range
        #[arg(default_value = CLI_PACKAGE)]
        packages: Vec<String>,
    },
    /// Install a package into the tool cache and print its path
    Install {
        name: String,
        #[arg(default_value = "stable")]
        version: String,
        /// File name of the installed binary; defaults to the package name
        #[arg(long)]
        binary_name: Option<String>,
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
    /// Print the URL of the index that would be consulted
    IndexUrl {
        #[arg(long)]
        nightly: bool,
    },
}

impl GlobalArgs {
    fn load_config(&self) -> anyhow::Result<SetupConfig> {
        let mut config = match &self.config {
            Some(path) => SetupConfig::from_json_file(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => SetupConfig::default(),
        };

        if let Some(root) = &self.package_root {
            config.package_root = root.clone();
        }
        if let Some(arch) = &self.arch {
            config.architecture = Some(arch.clone());
        }
        if let Some(platform) = &self.platform {
            config.platform = Some(platform.clone());
        }
        if let Some(libc) = &self.libc {
            config.libc = Some(libc.clone());
        }

        Ok(config)
    }
}

/// Split `name[@version]`; a leading `@` belongs to the name
fn split_request(request: &str) -> (&str, &str) {
    match request.rfind('@') {
        Some(at) if at > 0 => (&request[..at], &request[at + 1..]),
        _ => (request, ""),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_file = cli.global.log_file.then(log_path);
    let _guard = init_logging(
        level_for_verbosity(cli.global.verbose),
        cli.global.log_format,
        log_file.as_deref(),
    )
    .context("failed to initialize logging")?;

    let config = cli.global.load_config()?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli.command, config))
}

async fn run(command: Command, config: SetupConfig) -> anyhow::Result<()> {
    let resolver_config = config.resolver_config()?;

    match command {
        Command::IndexUrl { nightly } => {
            let key = IndexKey {
                architecture: resolver_config.architecture,
                platform: resolver_config.platform,
                nightly,
            };
            println!("{}", index_url(&resolver_config.package_root, &key));
        }
        Command::Resolve { packages } => {
            let fetcher = HttpIndexFetcher::new(resolver_config.package_root.clone())?;
            let resolver = PackageResolver::new(Arc::new(fetcher), resolver_config);

            let requests: Vec<(&str, &str)> =
                packages.iter().map(|p| split_request(p)).collect();
            let results = resolver.resolve_many(&requests).await;

            let mut resolved = Vec::with_capacity(results.len());
            let mut failures = 0;
            for ((name, _), result) in requests.iter().zip(results) {
                match result {
                    Ok(package) => resolved.push(package),
                    Err(e) => {
                        error!("Failed to resolve {}: {}", name, e);
                        eprintln!("error: {e}");
                        failures += 1;
                    }
                }
            }
            if failures > 0 {
                bail!("{failures} of {} requests could not be resolved", requests.len());
            }

            for package in resolved {
                println!("{}", serde_json::to_string(&package)?);
            }
        }
        Command::Install {
            name,
            version,
            binary_name,
            cache_dir,
        } => {
            let cache_root = cache_dir.unwrap_or_else(|| config.cache_dir());
            let fetcher = HttpIndexFetcher::new(resolver_config.package_root.clone())?;
            let resolver = PackageResolver::new(Arc::new(fetcher), resolver_config);

            let package = resolver
                .resolve(&name, &RequestedVersion::parse(&version))
                .await?;

            let installer = Installer::new(cache_root)?;
            let binary_name = binary_name.unwrap_or_else(|| package.name.clone());
            let path = installer
                .install(&package, &binary_name)
                .await
                .with_context(|| format!("failed to install {} {}", package.name, package.version))?;

            println!("{}", path.display());
        }
    }

    Ok(())
}
