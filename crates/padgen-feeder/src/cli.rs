use clap::{Parser, Subcommand, ValueEnum};

use padgen::Backend;

/// Backend selector on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum BackendArg {
    /// Legacy virtual joystick driver (slots 1-16).
    Joystick,
    /// Legacy four-slot virtual bus.
    Bus,
    /// Generic bus, Xbox-shaped target.
    Xbox,
    /// Generic bus, DualShock-shaped target.
    Ds4,
}

impl BackendArg {
    pub(crate) fn backend(self) -> Backend {
        match self {
            BackendArg::Joystick => Backend::LegacyJoystick,
            BackendArg::Bus => Backend::LegacyBus,
            BackendArg::Xbox => Backend::GenericXbox,
            BackendArg::Ds4 => Backend::GenericDs4,
        }
    }
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Show the status of every backend address.
    Status,
    /// Plug a device in, print its identity, then release it.
    Plug {
        #[clap(value_enum)]
        backend: BackendArg,
        /// Backend-local slot index (1-based)
        #[clap(default_value_t = 1)]
        index: u8,
    },
    /// Plug a device in and feed it a moving position.
    Feed {
        #[clap(value_enum)]
        backend: BackendArg,
        /// Backend-local slot index (1-based)
        #[clap(default_value_t = 1)]
        index: u8,
        /// How long to feed before releasing the device
        #[clap(short, long, default_value_t = 5)]
        seconds: u64,
    },
}

/// Demo feeder for the padgen virtual-controller facade.
#[derive(Parser)]
#[command(version, about, long_about = None)]
pub(crate) struct Cli {
    /// Turn debugging information on
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// The command to run
    #[clap(subcommand)]
    pub command: Command,
}
