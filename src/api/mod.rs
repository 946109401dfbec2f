// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod analyze;
pub mod errors;
pub mod http_server;

pub use analyze::analyze_handler;
pub use errors::{ApiError, ErrorResponse};
pub use http_server::{build_router, start_server, AppState, HealthResponse, StatusResponse};
