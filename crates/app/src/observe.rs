//! One-shot `observe` command.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use provider_mailgun_common::Context;
use provider_mailgun_core::observe_by_id;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cli::ObserveArgs;
use crate::context::AppContext;

/// One output line of `observe`.
#[derive(Debug, Clone, Serialize)]
pub struct ObserveLine {
    pub kind: String,
    pub id: String,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Observe every id, at most `controller.max_concurrency` at a time.
///
/// Lines are returned in completion order. Cancelling `ctx` ends in-flight
/// retries with a cancellation error on their lines.
pub async fn run(app: Arc<AppContext>, ctx: &Context, args: &ObserveArgs) -> Vec<ObserveLine> {
    let limit = app.config.controller.max_concurrency.max(1);
    let kind = args.kind;
    let domain = args.domain.as_deref();
    debug!(%kind, count = args.ids.len(), limit, "observing resources");

    stream::iter(args.ids.iter())
        .map(|id| {
            let app = Arc::clone(&app);
            async move {
                let result = observe_by_id(&app.client, ctx, kind, domain, id).await;
                match result {
                    Ok(observed) => ObserveLine {
                        kind: kind.to_string(),
                        id: id.clone(),
                        exists: observed.is_some(),
                        observed,
                        error: None,
                    },
                    Err(err) => {
                        warn!(%kind, id = %id, error = %err, "observe failed");
                        ObserveLine {
                            kind: kind.to_string(),
                            id: id.clone(),
                            exists: false,
                            observed: None,
                            error: Some(err.to_string()),
                        }
                    }
                }
            }
        })
        .buffer_unordered(limit)
        .collect()
        .await
}
