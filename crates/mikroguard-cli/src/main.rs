use clap::{Parser, Subcommand};
use tracing::info;

use mikroguard_routeros::client::RestClient;
use mikroguard_routeros::peers::PeerStore;
use mikroguard_routeros::settings::Settings;
use mikroguard_routeros::sweep;
use mikroguard_routeros::template::TemplateStore;
use mikroguard_types::key;
use mikroguard_types::render::ClientConfig;
use mikroguard_types::{Peer, TemplateUpdate};

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if std::env::var("LOG_FORMAT").is_ok_and(|v| v == "json") {
        fmt().json().with_env_filter(filter).init();
    } else {
        fmt().pretty().with_env_filter(filter).init();
    }
}

#[derive(Debug, Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(version)]
#[command(about = "Manage WireGuard peers on a MikroTik router")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every peer on the managed interface
    List,
    /// Show one peer in detail
    Show { username: String },
    /// Create a peer with an automatically assigned address
    Create {
        username: String,
        /// Client-generated WireGuard public key (44 base64 characters)
        public_key: String,
    },
    /// Extend a peer's expiry and re-enable it
    Renew { username: String },
    /// Unblock a peer
    Enable { username: String },
    /// Block a peer without deleting it
    Disable { username: String },
    /// Replace a peer's public key
    SetKey {
        username: String,
        public_key: String,
    },
    /// Remove a peer entirely
    Delete { username: String },
    /// Disable every peer whose expiry has passed
    Sweep,
    /// Render a client configuration file to stdout
    Config {
        username: String,
        /// Embed a real private key instead of the placeholder
        #[arg(long)]
        private_key: Option<String>,
        /// Override the template DNS server
        #[arg(long)]
        dns: Option<String>,
        /// Override the template allowed-IP list (comma separated)
        #[arg(long, value_delimiter = ',')]
        allowed_ips: Option<Vec<String>>,
        /// Override the template endpoint
        #[arg(long)]
        endpoint: Option<String>,
        /// Override the template keepalive interval
        #[arg(long)]
        persistent_keepalive: Option<u16>,
    },
    /// Show the connection template, applying any given updates first
    Template {
        /// New DNS server
        #[arg(long)]
        dns: Option<String>,
        /// New allowed-IP list (comma separated)
        #[arg(long, value_delimiter = ',')]
        allowed_ips: Option<Vec<String>>,
        /// New endpoint
        #[arg(long)]
        endpoint: Option<String>,
        /// New keepalive interval
        #[arg(long)]
        persistent_keepalive: Option<u16>,
    },
    /// Generate a fresh X25519 keypair locally
    Keygen,
}

fn print_peer(peer: &Peer) {
    let state = if peer.disabled { "disabled" } else { "enabled" };
    println!("name:            {}", peer.name);
    println!("public key:      {}", peer.public_key);
    println!("allowed address: {}", peer.allowed_address);
    println!("state:           {state}");
    println!("expires:         {}", peer.expires_at.format("%Y-%m-%d %H:%M:%S UTC"));
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();

    // Keygen is purely local and must work without router settings.
    if let Command::Keygen = args.command {
        let pair = key::generate_keypair();
        println!("private key: {}", pair.private_key);
        println!("public key:  {}", pair.public_key);
        return Ok(());
    }

    let settings = Settings::from_env()?;
    info!(
        host = %settings.router.host,
        interface = %settings.wireguard.interface,
        "connecting to router"
    );

    let client = RestClient::new(&settings.router)?;
    let store = PeerStore::new(client, &settings.wireguard);
    let templates = TemplateStore::new(settings.wireguard.default_template());

    match args.command {
        Command::List => {
            let peers = store.list_all().await?;
            if peers.is_empty() {
                println!("no peers on {}", settings.wireguard.interface);
            }
            for peer in peers {
                let state = if peer.disabled { "disabled" } else { "enabled" };
                println!(
                    "{}\t{}\t{}\texpires {}",
                    peer.name,
                    peer.allowed_address,
                    state,
                    peer.expires_at.format("%Y-%m-%d")
                );
            }
        }
        Command::Show { username } => match store.get_by_username(&username).await? {
            Some(peer) => print_peer(&peer),
            None => return Err(format!("no peer for user {username}").into()),
        },
        Command::Create {
            username,
            public_key,
        } => {
            let peer = store.provision(&username, &public_key).await?;
            println!("created {} at {}", peer.name, peer.allowed_address);
        }
        Command::Renew { username } => {
            store.renew(&username).await?;
            println!("renewed {username}");
        }
        Command::Enable { username } => {
            store.enable(&username).await?;
            println!("enabled {username}");
        }
        Command::Disable { username } => {
            store.disable(&username).await?;
            println!("disabled {username}");
        }
        Command::SetKey {
            username,
            public_key,
        } => {
            store.update_public_key(&username, &public_key).await?;
            println!("updated key for {username}");
        }
        Command::Delete { username } => {
            store.delete(&username).await?;
            println!("deleted {username}");
        }
        Command::Sweep => {
            let disabled = sweep::disable_expired(&store).await?;
            if disabled.is_empty() {
                println!("no expired peers");
            } else {
                println!(
                    "disabled {} expired peer(s): {}",
                    disabled.len(),
                    disabled.join(", ")
                );
            }
        }
        Command::Config {
            username,
            private_key,
            dns,
            allowed_ips,
            endpoint,
            persistent_keepalive,
        } => {
            let peer = store
                .get_by_username(&username)
                .await?
                .ok_or_else(|| format!("no peer for user {username}"))?;
            let server_key = store.server_public_key().await?;

            let template = templates.merge(TemplateUpdate {
                dns,
                allowed_ips,
                endpoint,
                persistent_keepalive,
            });

            let mut config =
                ClientConfig::from_template(&template, peer.allowed_address, server_key);
            if let Some(private_key) = private_key {
                config.private_key = private_key;
            }
            print!("{}", config.render());
        }
        Command::Template {
            dns,
            allowed_ips,
            endpoint,
            persistent_keepalive,
        } => {
            let update = TemplateUpdate {
                dns,
                allowed_ips,
                endpoint,
                persistent_keepalive,
            };
            let template = if update == TemplateUpdate::default() {
                templates.get()
            } else {
                templates.merge(update)
            };
            println!("dns:                  {}", template.dns);
            println!("allowed ips:          {}", template.allowed_ips.join(", "));
            println!("endpoint:             {}", template.endpoint);
            println!("persistent keepalive: {}", template.persistent_keepalive);
        }
        Command::Keygen => unreachable!("handled before settings load"),
    }

    Ok(())
}
