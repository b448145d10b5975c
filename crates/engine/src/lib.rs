// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! recon-engine: the reconnaissance pipelines (scan, monitor) and their
//! supporting stateless collaborators (resource governor, URL/content
//! differs, secret detector, notification aggregator).

pub mod content_differ;
pub mod embed_builder;
pub mod monitor_pipeline;
pub mod notify_aggregator;
pub mod resource_governor;
pub mod scan_pipeline;
pub mod secret_detector;
pub mod task_tracker;
pub mod url_differ;

pub use embed_builder::{EmbedBuilder, EmbedError};
pub use monitor_pipeline::{MonitorCycleCounts, MonitorPipeline};
pub use notify_aggregator::{FileChangeEvent, MonitorErrorEvent, NotificationAggregator};
pub use resource_governor::{ResourceGovernor, ResourceSnapshot};
pub use scan_pipeline::ScanPipeline;
pub use task_tracker::{TaskCounter, TaskGuard};
pub use url_differ::{count_statuses, diff_urls, DiffCounts};
