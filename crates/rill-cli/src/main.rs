mod cli;
mod commands;

use std::sync::Once;

use cli::{CheckParams, DumpParams, GenParams, build_cli};

static TRACING_INIT: Once = Once::new();

/// Installs the log subscriber when `RUST_LOG` is set, e.g.
/// `RUST_LOG=rill_compiler=debug`.
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}

fn main() {
    init_tracing();
    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("gen", m)) => {
            let params = GenParams::from_matches(m);
            commands::generate::run(params.into());
        }
        Some(("check", m)) => {
            let params = CheckParams::from_matches(m);
            commands::check::run(params.into());
        }
        Some(("dump", m)) => {
            let params = DumpParams::from_matches(m);
            commands::dump::run(params.into());
        }
        _ => unreachable!("clap should have caught this"),
    }
}
