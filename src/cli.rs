//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

/// Create Azure virtual machines with boot diagnostics routed to a
/// resolved storage account.
#[derive(Parser, Debug)]
#[command(name = "azvm")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to <config dir>/azvm/config.yaml)
    #[arg(long, global = true, env = "AZVM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(long, short, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create or update a VM from a JSON description
    #[command(name = "create-vm")]
    CreateVm {
        /// Defaults to the group named in the description's resource id
        #[arg(long, short = 'g')]
        resource_group: Option<String>,

        /// Overrides the location in the VM description
        #[arg(long, short = 'l', default_value = "")]
        location: String,

        /// ARM JSON body of the virtual machine
        #[arg(long)]
        vm_file: PathBuf,

        /// Tag as KEY=VALUE; replaces the VM's own tags when given
        #[arg(long = "tag", value_parser = parse_tag)]
        tags: Vec<(String, String)>,

        /// Poll the operation until it finishes
        #[arg(long)]
        wait: bool,
    },

    /// Find or create a boot-diagnostics storage account and print its blob endpoint
    #[command(name = "resolve-diagnostics")]
    ResolveDiagnostics {
        #[arg(long, short = 'g')]
        resource_group: String,

        #[arg(long, short = 'l')]
        location: String,

        /// VHD URI of an existing OS disk whose account may be reused
        #[arg(long)]
        os_disk_uri: Option<String>,
    },

    /// Look for a reusable diagnostics account without creating one
    #[command(name = "find-diagnostics-account")]
    FindDiagnosticsAccount {
        #[arg(long, short = 'g')]
        resource_group: String,

        #[arg(long)]
        os_disk_uri: Option<String>,
    },

    /// Fetch the status of an asynchronous ARM operation
    #[command(name = "operation-status")]
    OperationStatus {
        /// Azure-AsyncOperation URL returned by create-vm
        #[arg(long)]
        url: String,
    },
}

/// Parse `KEY=VALUE`. The value may be empty; the key may not.
pub fn parse_tag(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty tag key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
