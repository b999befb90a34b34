//! pharmyx-web: HTTP transport for Pharmyx.
//!   POST /api/analyze : multipart VCF + drug → risk report
//!   GET  /api/health  : liveness and collaborator status
//!   GET  /api/tables  : loaded rule table versions and coverage

pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
pub mod state;

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pharmyx=debug,info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
