//! services/api/src/bin/openapi.rs
//!
//! Dumps the OpenAPI document for the lesson booking API.
//!
//! Usage: `openapi [OUTPUT]` (defaults to `openapi.json`).

use api_lib::web::rest::write_openapi;
use std::path::PathBuf;

fn main() -> std::io::Result<()> {
    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("openapi.json"));
    let routes = write_openapi(&path)?;
    println!("Wrote {} API paths to {}", routes, path.display());
    Ok(())
}
