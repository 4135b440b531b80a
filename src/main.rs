//! CEP weather services.
//!
//! # Architecture Overview
//!
//! ```text
//!   client                    input (service-a)              orchestrator (service-b)
//!   ──────  POST / {"cep"} ─▶ cep_handler
//!                               └─ call_service_b ─ GET /{cep} + traceparent ─▶ weather_handler
//!                                                                                 ├─ get_cep_info ──▶ ViaCEP
//!                                                                                 └─ get_weather_info ─▶ WeatherAPI
//!   ◀── {"city","temp_C","temp_F","temp_K"} ◀──────── relayed unchanged ◀──────────┘
//!
//!   spans from both processes ──OTLP/gRPC──▶ collector
//! ```
//!
//! Each process runs one role, chosen on the command line.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use cep_weather::config::ServiceRole;
use cep_weather::lifecycle;

#[derive(Parser)]
#[command(name = "cep-weather")]
#[command(about = "CEP to temperature services with distributed tracing", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file; environment variables still take precedence
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    service: Service,
}

#[derive(Subcommand)]
enum Service {
    /// Public entry point (POST / with {"cep": ".."})
    Input,
    /// CEP → city → temperature (GET /{cep})
    Orchestrator,
}

impl From<Service> for ServiceRole {
    fn from(service: Service) -> Self {
        match service {
            Service::Input => ServiceRole::Input,
            Service::Orchestrator => ServiceRole::Orchestrator,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    lifecycle::run(cli.service.into(), cli.config.as_deref()).await?;

    Ok(())
}
