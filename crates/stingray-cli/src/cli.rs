use clap::{Parser, Subcommand, ValueEnum};
use stingray_config::ConfigOverrides;

#[derive(Parser)]
#[command(name = "stingrayctl")]
#[command(about = "Reconcile pools and nodes on a Stingray / SteelApp traffic manager")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a TOML config file (defaults to ./stingray.toml when present)
    #[arg(short, long, global = true, env = "STINGRAY_CONFIG")]
    pub config: Option<String>,

    /// Traffic manager host name or address
    #[arg(short, long, global = true)]
    pub server: Option<String>,

    /// REST API port [default: 9070]
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Request timeout in seconds [default: 3]
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// User for Basic authentication
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// Password for Basic authentication
    #[arg(long, global = true, env = "STINGRAY_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// REST API version (2.0 or 3.0) [default: 3.0]
    #[arg(long, global = true)]
    pub api_version: Option<String>,

    /// Verify the server's TLS certificate
    #[arg(long, global = true)]
    pub verify_tls: bool,

    /// Report what would change without changing anything
    #[arg(long, global = true)]
    pub check: bool,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Log level (trace, debug, info, warn, error, off); RUST_LOG takes precedence
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            server: self.server.clone(),
            port: self.port,
            timeout_secs: self.timeout,
            user: self.user.clone(),
            password: self.password.clone(),
            api_version: self.api_version.clone(),
            verify_tls: self.verify_tls.then_some(true),
            log_level: self.log_level.clone(),
        }
    }
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ensure a pool exists with the given properties, or is absent
    Pool(PoolArgs),
    /// Ensure a node is present, absent, or in a given state within a pool
    Node(NodeArgs),
    /// Run a pool-level operation (show, enablenodes, disablenodes, drainnodes)
    PoolOp(PoolOpArgs),
    /// Inspect the effective configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct PoolArgs {
    /// Pool name
    pub name: String,
    /// Desired state: present or absent
    #[arg(long, default_value = "present")]
    pub state: String,
    /// Desired properties as JSON, or @path to a JSON file
    #[arg(long)]
    pub properties: Option<String>,
}

#[derive(clap::Args)]
pub struct NodeArgs {
    /// Node address (host:port)
    pub name: String,
    /// Pool holding the node
    #[arg(long)]
    pub pool: String,
    /// Desired state: present, absent, enabled, disabled or draining
    #[arg(long, default_value = "present")]
    pub state: String,
    /// Load-balancing state to apply with --state present
    #[arg(long)]
    pub lb_state: Option<String>,
    /// Node weight
    #[arg(long)]
    pub weight: Option<u64>,
    /// Node priority
    #[arg(long)]
    pub priority: Option<u64>,
}

#[derive(clap::Args)]
pub struct PoolOpArgs {
    /// Pool name
    pub pool: String,
    /// Operation: show, enablenodes, disablenodes or drainnodes
    pub operation: String,
    /// Nodes to act on (comma separated host:port list)
    #[arg(long, value_delimiter = ',')]
    pub nodes: Vec<String>,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the merged configuration with the password masked
    Show,
}
