//! cloudseed CLI
//!
//! Entry point for the `cloudseed` command-line tool. Collects layer
//! directories and override flags, folds them into one config and renders
//! it as text, a directory of files or an ISO image.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cloudseed::config::{default_config, Config, LocalDefaults, Loader};
use cloudseed::document::{NetworkConfig, NetworkParams};

#[derive(Parser)]
#[command(name = "cloudseed")]
#[command(about = "Assemble cloud-init NoCloud seed data", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the assembled configuration
    Show {
        /// Machine name (hostname and instance id)
        name: String,

        #[command(flatten)]
        seed: SeedOptions,

        /// Also list the files each layer contributed
        #[arg(long)]
        sources: bool,
    },

    /// Write the assembled configuration to a directory
    Write {
        /// Machine name (hostname and instance id)
        name: String,

        /// Destination directory
        dest: PathBuf,

        #[command(flatten)]
        seed: SeedOptions,
    },

    /// Write the assembled configuration as an ISO9660 image
    Iso {
        /// Machine name (hostname and instance id)
        name: String,

        /// Destination image file
        dest: PathBuf,

        #[command(flatten)]
        seed: SeedOptions,
    },
}

/// Flags shared by all subcommands
#[derive(Args)]
struct SeedOptions {
    /// Configuration layer directory; may be repeated, later wins
    #[arg(long = "config-dir", short = 'c')]
    config_dirs: Vec<PathBuf>,

    /// User name to create during startup (default: current user)
    #[arg(long)]
    ssh_user: Option<String>,

    /// SSH public key file (default: ~/.ssh/id_rsa.pub)
    #[arg(long)]
    ssh_key_file: Option<PathBuf>,

    /// Password hash for the created user (shadow format)
    #[arg(long)]
    password_hash: Option<String>,

    /// Static address in CIDR notation; omit for DHCP
    #[arg(long, default_value = "")]
    address: String,

    /// Gateway address (default: first host of the subnet)
    #[arg(long)]
    gateway: Option<String>,

    /// Nameserver; may be repeated (default: the gateway)
    #[arg(long = "nameserver")]
    nameservers: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Show {
            name,
            seed,
            sources,
        } => run_show(&name, &seed, sources),
        Commands::Write { name, dest, seed } => run_write(&name, &dest, &seed),
        Commands::Iso { name, dest, seed } => run_iso(&name, &dest, &seed),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

/// Fold all layers: directories, then network parameters, then the
/// generated defaults as the highest-precedence overlay (flags win)
fn build_config(name: &str, seed: &SeedOptions) -> Result<(Config, Loader), Box<dyn std::error::Error>> {
    let defaults = LocalDefaults::discover();

    let mut loader = Loader::new();
    for dir in &seed.config_dirs {
        loader.push_dir(dir);
    }
    let mut config = loader.load()?;

    let params = NetworkParams {
        address: seed.address.clone(),
        gateway: seed.gateway.clone(),
        nameservers: seed.nameservers.clone(),
    };
    if let Some(network) = NetworkConfig::from_params(&params)? {
        let overlay = Config {
            network_config: Some(network),
            ..Default::default()
        };
        config.merge(&overlay)?;
    }

    let user = seed.ssh_user.clone().unwrap_or(defaults.user);
    let key_path = seed
        .ssh_key_file
        .clone()
        .unwrap_or(defaults.ssh_key_path);
    let ssh_key = fs::read_to_string(&key_path)
        .map_err(|e| format!("failed to read SSH key {}: {}", key_path.display(), e))?;

    let generated = default_config(name, &user, &ssh_key, seed.password_hash.as_deref());
    config.merge(&generated)?;

    Ok((config, loader))
}

fn run_show(name: &str, seed: &SeedOptions, sources: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (config, loader) = build_config(name, seed)?;
    print!("{}", config.render()?);

    if sources {
        println!("### sources ###");
        for source in loader.sources() {
            println!("{}  {}", source.digest, source.path.display());
        }
    }
    Ok(())
}

fn run_write(name: &str, dest: &PathBuf, seed: &SeedOptions) -> Result<(), Box<dyn std::error::Error>> {
    let (config, _) = build_config(name, seed)?;
    config.to_dir(dest)?;
    Ok(())
}

fn run_iso(name: &str, dest: &PathBuf, seed: &SeedOptions) -> Result<(), Box<dyn std::error::Error>> {
    let (config, _) = build_config(name, seed)?;
    let image = config.iso()?;
    fs::write(dest, image)?;
    Ok(())
}
