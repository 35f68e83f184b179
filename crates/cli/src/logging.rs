use tracing_subscriber::EnvFilter;

/// Installs the stderr subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `verbose` picks the level for the
/// `tdport` targets while dependencies stay at `warn`.
pub fn init_logging(verbose: u8) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));
	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(verbose > 0)
		.try_init();
}

fn default_directives(verbose: u8) -> String {
	let level = match verbose {
		0 => "info",
		1 => "debug",
		_ => "trace",
	};
	format!("warn,tdport={level},tdport_cli={level}")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn verbosity_maps_to_levels() {
		assert_eq!(default_directives(0), "warn,tdport=info,tdport_cli=info");
		assert!(default_directives(1).contains("tdport=debug"));
		assert!(default_directives(5).contains("tdport=trace"));
	}
}
