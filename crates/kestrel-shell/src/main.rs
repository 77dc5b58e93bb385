//! Kestrel desktop entry point.

use std::process::ExitCode;

fn main() -> ExitCode {
    kestrel_shell::run_desktop(std::env::args_os(), &mut std::io::stderr())
}
