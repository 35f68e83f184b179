use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tdport")]
#[command(about = "Move Telegram Desktop sessions between machines as portable bundles")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v debug, -vv trace)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Driver program implementing the store decoder and protocol client [env: TDPORT_DRIVER]
	#[arg(long, global = true, value_name = "PROGRAM")]
	pub driver: Option<String>,

	/// Extra argument passed to the driver (repeatable)
	#[arg(long = "driver-arg", global = true, value_name = "ARG", allow_hyphen_values = true)]
	pub driver_args: Vec<String>,

	/// Without a subcommand, discover a local store and export it
	#[command(subcommand)]
	pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Convert a local store into a bundle
	Export {
		/// The `tdata` directory to read
		source: PathBuf,
		/// Directory receiving `<basename>.json` and `<basename>.session`
		out_dir: PathBuf,
		/// Bundle basename, also seeds the synthesized device
		basename: String,
		/// Application identifier; needs --api-hash too
		#[arg(long, value_name = "ID")]
		api_id: Option<i64>,
		/// Application secret; needs --api-id too
		#[arg(long, value_name = "HASH")]
		api_hash: Option<String>,
	},

	/// Open a bundle and check the session is still authorized
	Import {
		/// Path to the bundle document
		bundle: PathBuf,
	},

	/// Discover a single local store and export it
	Auto {
		/// Output directory for the bundle
		#[arg(long, default_value = "bundles")]
		out: PathBuf,
	},

	/// Authorize straight from a local store and print the session string
	Authorize {
		/// The `tdata` directory to read
		source: PathBuf,
		/// Name used for the temporary session file
		#[arg(long, default_value = "account")]
		name: String,
	},

	/// Print a bundle's fields without connecting
	Inspect {
		/// Path to the bundle document
		bundle: PathBuf,
	},
}
