//! Fingerprint command - print a combination key without baking

use crate::bake::BakeRequest;
use crate::cli::args::FingerprintArgs;
use crate::config::Config;
use crate::error::BakeResult;

/// Execute the fingerprint command
pub async fn execute(args: FingerprintArgs, _config: &Config) -> BakeResult<()> {
    let request = BakeRequest::new(args.base, args.engine, args.overlays);
    let key = request.key();
    println!("{}  {}", key.hex(), key.artifact_name());
    Ok(())
}
