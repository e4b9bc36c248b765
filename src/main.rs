//! otlp-series CLI entry point.

use otlp_series::cli::{self, Cli};
use otlp_series::core::Result;

fn main() -> Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    // Execute the command
    cli::execute(cli)
}
