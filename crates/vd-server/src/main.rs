//! `vd-server` binary: JSON-RPC document server plus one-shot generators.

use std::process::ExitCode;
use std::sync::Arc;
use vd_core::{ShapeBatch, generate_batch, template_batch};
use vd_server::config::USAGE;
use vd_server::{DocumentService, FileStore, MemoryStore, Mode, ServerConfig, rpc};

#[tokio::main]
async fn main() -> ExitCode {
    // stdout carries responses, so logs go to stderr.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("vd-server: {e}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    match config.mode {
        Mode::Help => {
            println!("{USAGE}");
            ExitCode::SUCCESS
        }

        // ── `vd-server --generate "A -> B"` ─────────────────────────────
        // Prints the shape batch a canvas host would create, then exits.
        Mode::Generate(ref input) => match generate_batch(input, &config.layout) {
            Some(batch) => print_batch(&batch),
            None => {
                eprintln!("vd-server --generate: no valid `A -> B` pairs in input");
                ExitCode::FAILURE
            }
        },

        // ── `vd-server --template flow|mindmap` ─────────────────────────
        Mode::Template(template) => print_batch(&template_batch(template, &config.layout)),

        // ── JSON-RPC server mode ────────────────────────────────────────
        Mode::Serve => {
            let service = match &config.store_dir {
                Some(dir) => match FileStore::open(dir) {
                    Ok(store) => {
                        log::info!("documents stored in {}", dir.display());
                        DocumentService::new(store)
                    }
                    Err(e) => {
                        eprintln!("vd-server: cannot open store {}: {e}", dir.display());
                        return ExitCode::FAILURE;
                    }
                },
                None => {
                    log::info!("documents kept in memory");
                    DocumentService::new(MemoryStore::new())
                }
            };

            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let stdout = tokio::io::stdout();
            match rpc::serve(Arc::new(service), stdin, stdout).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    log::error!("stdio transport failed: {e}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}

fn print_batch(batch: &ShapeBatch) -> ExitCode {
    match serde_json::to_string_pretty(batch) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("vd-server: failed to encode batch: {e}");
            ExitCode::FAILURE
        }
    }
}
