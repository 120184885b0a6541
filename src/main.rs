//! Dylang CLI: execute a script file.

use std::path::Path;
use std::process;

use dylang::ExecutionMode;

fn main() {
    let mut args = std::env::args().skip(1);
    let Some(filename) = args.next() else {
        eprintln!("Usage: dylang <filename.dy>");
        process::exit(1);
    };

    let path = Path::new(&filename);
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    if extension != "dy" && extension != "dx" {
        eprintln!(
            "Error: Only .dy and .dx files are supported (got .{})",
            extension
        );
        process::exit(1);
    }

    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Error reading file: {}", err);
            process::exit(1);
        }
    };

    if let Err(err) = dylang::run_with_options(&source, ExecutionMode::Hybrid) {
        eprintln!("{}", err);
        process::exit(1);
    }
}
