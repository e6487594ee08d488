//! schemadeploy - Deploy CMS schema artifacts from manifests

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = schemadeploy::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
