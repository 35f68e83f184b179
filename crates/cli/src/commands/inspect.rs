use std::path::Path;

use anyhow::Result;
use tdport::PortError;

use crate::output;

pub fn execute(bundle: &Path) -> Result<()> {
	if !bundle.is_file() {
		let err = PortError::Config(format!("bundle {} does not exist", bundle.display()));
		output::failure("inspect", &err);
		return Err(err.into());
	}
	match tdport::bundle::decode(bundle) {
		Ok((decoded, artifact)) => {
			output::print_rows(&output::bundle_rows(&decoded, &artifact));
			Ok(())
		}
		Err(err) => {
			output::failure("inspect", &err);
			Err(err.into())
		}
	}
}
