// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use orthoai_xray_node::{
    api::{start_server, AppState},
    config::NodeConfig,
    storage::LocalImageStore,
    vision::{ModelRegistry, ModelRole, XrayPipeline},
};
use std::{env, sync::Arc};
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let config = NodeConfig::parse();

    println!("🚀 Starting OrthoAI X-ray Node...");
    println!("📦 BUILD VERSION: {}", orthoai_xray_node::version::VERSION);
    println!();

    // Models are loaded once; the registry is read-only from here on
    println!("🧠 Loading models from {}...", config.weights_dir.display());
    let registry = ModelRegistry::load_onnx(&config.model_paths(), config.onnx_options());
    for role in ModelRole::ALL {
        let marker = if registry.is_loaded(role) { "✅" } else { "➖" };
        println!("   {} {}", marker, role);
    }
    if !registry.is_loaded(ModelRole::Classifier) {
        println!("⚠️  No classifier loaded - /analyze will fail until weights are provided");
    }

    let store = LocalImageStore::new(&config.upload_dir).await?;
    println!("📁 Uploads stored in {}", store.root().display());

    let pipeline = XrayPipeline::new(Arc::new(registry), Arc::new(store));
    let state = AppState::new(pipeline);

    let server_config = config.clone();
    let server = tokio::spawn(async move { start_server(state, &server_config).await });

    println!("\nAPI Endpoints:");
    println!("  Status:       http://{}:{}/", config.host, config.port);
    println!("  Health:       http://{}:{}/health", config.host, config.port);
    println!("  Analyze:      POST http://{}:{}/analyze", config.host, config.port);
    println!("\nPress Ctrl+C to shutdown...");

    tokio::select! {
        result = server => {
            result??;
        }
        _ = signal::ctrl_c() => {
            println!("\n⏹️  Shutting down...");
        }
    }

    println!("👋 Goodbye!");
    Ok(())
}
