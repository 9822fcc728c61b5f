//! Progress notifications for `analyze_post`.
//!
//! The tool reports two steps: fetching the subreddit listing (instant on a
//! cache hit) and classifying the selected post's comments. Notifications
//! are only sent when the client attached a progress token to the call.

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::model::{Meta, ProgressNotificationParam, ProgressToken};
use rmcp::{Peer, RoleServer};

use crate::services::{noop_progress, ProgressReporter};

/// Forwards pipeline steps to the calling client as progress notifications.
pub struct ToolProgress {
    client: Peer<RoleServer>,
    token: ProgressToken,
}

#[async_trait]
impl ProgressReporter for ToolProgress {
    async fn report(&self, current: f64, total: f64, message: Option<String>) {
        let param = ProgressNotificationParam {
            progress_token: self.token.clone(),
            progress: current,
            total: Some(total),
            message,
        };
        // A client that went away mid-call must not fail the analysis
        if let Err(e) = self.client.notify_progress(param).await {
            tracing::debug!("Progress notification dropped: {}", e);
        }
    }
}

/// Reporter for one tool call: notifying when the client asked for
/// progress, silent otherwise.
pub fn make_mcp_progress(meta: &Meta, client: &Peer<RoleServer>) -> Arc<dyn ProgressReporter> {
    match meta.get_progress_token() {
        Some(token) => Arc::new(ToolProgress {
            client: client.clone(),
            token: token.clone(),
        }),
        None => noop_progress(),
    }
}
