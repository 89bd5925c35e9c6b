//! cdist binary entrypoint.

use std::process::ExitCode;

use cdist_cli::{BuiltinHandlers, CdistCli, CliError, build_parser_tree};

fn main() -> ExitCode {
    let tree = match build_parser_tree() {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let app = CdistCli::new(tree, BuiltinHandlers);
    match app.run(std::env::args_os()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Clap(e)) => {
            // Help and version go to stdout with status 0.
            let _ = e.print();
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}
