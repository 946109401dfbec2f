// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Node configuration from command line flags and environment

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::vision::{ModelPaths, OnnxModelOptions};

/// OrthoAI X-ray analysis node
#[derive(Parser, Debug, Clone)]
#[command(name = "orthoai-xray-node")]
#[command(version)]
#[command(about = "Dental X-ray classification and finding detection service", long_about = None)]
pub struct NodeConfig {
    /// Address to bind the HTTP server to
    #[arg(long, env = "XRAY_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// HTTP port
    #[arg(long, env = "XRAY_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Directory uploaded images are written to and served from
    #[arg(long, env = "XRAY_UPLOAD_DIR", default_value = "./public/uploads")]
    pub upload_dir: PathBuf,

    /// Directory holding the generic classifier and per-type detector weights
    #[arg(long, env = "XRAY_WEIGHTS_DIR", default_value = "./weights")]
    pub weights_dir: PathBuf,

    /// Weights directory of a trained classifier run (preferred over the generic one)
    #[arg(
        long,
        env = "XRAY_CLASSIFIER_RUN_DIR",
        default_value = "./models/xray_type_classifier/weights"
    )]
    pub classifier_run_dir: PathBuf,

    /// Minimum detection confidence
    #[arg(long, env = "XRAY_CONFIDENCE_THRESHOLD", default_value_t = 0.25)]
    pub confidence_threshold: f32,

    /// IoU threshold for non-maximum suppression
    #[arg(long, env = "XRAY_IOU_THRESHOLD", default_value_t = 0.45)]
    pub iou_threshold: f32,

    /// Largest accepted upload, in bytes
    #[arg(long, env = "XRAY_MAX_UPLOAD_BYTES", default_value_t = 20 * 1024 * 1024)]
    pub max_upload_bytes: usize,

    /// ONNX Runtime intra-op threads per model
    #[arg(long, env = "XRAY_INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,
}

impl NodeConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port).parse()?;
        Ok(addr)
    }

    pub fn model_paths(&self) -> ModelPaths {
        ModelPaths {
            weights_dir: self.weights_dir.clone(),
            classifier_run_dir: self.classifier_run_dir.clone(),
        }
    }

    pub fn onnx_options(&self) -> OnnxModelOptions {
        OnnxModelOptions {
            confidence_threshold: self.confidence_threshold.clamp(0.0, 1.0),
            iou_threshold: self.iou_threshold.clamp(0.0, 1.0),
            intra_threads: self.intra_threads.max(1),
        }
    }
}
