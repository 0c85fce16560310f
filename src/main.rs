//! Director-driven reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request     ┌─────────┐    ┌──────────────┐    ┌───────────┐
//!     ──────────────────▶│  http   │───▶│   routing    │───▶│ transport │────▶ Backend
//!                        │ server  │    │ table lookup │    │  (HTTPS)  │      Instance
//!                        └─────────┘    └──────▲───────┘    └───────────┘
//!                                              │ update
//!                                       ┌──────┴───────┐    ┌───────────┐
//!                                       │    sync      │───▶│ director  │────▶ Director
//!                                       │ 60s / 300s   │    │  client   │      API
//!                                       └──────────────┘    └───────────┘
//! ```

use clap::Parser;

use director_proxy::lifecycle::startup;
use director_proxy::StartupOptions;

#[tokio::main]
async fn main() {
    let options = StartupOptions::parse();

    if let Err(e) = startup::run(options).await {
        tracing::error!(error = %e, "Startup failed");
        eprintln!("director-proxy: {}", e);
        std::process::exit(1);
    }
}
