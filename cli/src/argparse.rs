use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "winstack",
    about = "Inspect and drive a WinStack private cloud",
    version,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Resource pool to work in; defaults to the first one
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Log requests and response bodies
    #[arg(long, global = true)]
    pub debug: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Print JSON instead of a table
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct ConnectionArgs {
    /// Management API base URL, e.g. https://10.0.0.1:8443
    #[arg(long, env = "WINSTACK_ENDPOINT", global = true, default_value = "")]
    pub endpoint: String,

    #[arg(long, env = "WINSTACK_USER", global = true, default_value = "")]
    pub user: String,

    #[arg(
        long,
        env = "WINSTACK_PASSWORD",
        global = true,
        default_value = "",
        hide_env_values = true
    )]
    pub password: String,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// List resource pools
    RegionList,
    /// List clusters of the selected pool
    ZoneList,
    /// List hosts of every cluster
    HostList,
    /// List virtual machines
    VmList {
        /// Only machines on this host
        #[arg(long)]
        host: Option<String>,
    },
    /// Power on a virtual machine
    VmStart { id: String },
    /// Shut down a virtual machine
    VmStop { id: String },
    /// List storage pools
    StorageList,
    /// List volumes of every storage pool
    DiskList,
    /// List VM templates
    ImageList,
    /// List VPCs, including the classic one
    VpcList,
    /// List the networks of one VPC
    NetworkList {
        #[arg(long)]
        vpc: String,
    },
    /// List floating IPs
    EipList,
    /// List security groups
    SecgroupList,
    /// Show a vendor task
    TaskShow { id: String },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
