use anyhow::Context;
use axum::routing::{get, patch, post};
use axum::{Extension, Router};
use axum_prometheus::PrometheusMetricLayer;
use tokio::net;

use crate::domain::AppState;
use crate::infrastructure::auth::AuthContext;
use crate::infrastructure::http::handlers::health_check;
use crate::infrastructure::http::handlers::documents::{
    approval_summary, create_comment, create_document, create_version, decide_approval,
    delete_document, delete_version, get_document, get_version, list_approvals, list_comments,
    list_documents, list_versions, request_approval, rollback_version, update_document,
};
use crate::infrastructure::http::handlers::frameworks::{
    export_csv, get_assessments, get_category_detail, get_framework, list_categories,
    list_frameworks, upsert_assessment,
};
use crate::infrastructure::http::handlers::notifications::{
    list_notifications, mark_all_read, mark_read,
};
use crate::infrastructure::http::handlers::templates::{
    get_template, list_templates, render_draft, update_template,
};
use crate::infrastructure::http::handlers::users::{
    create_user, delete_user, list_users, update_user,
};

pub mod api;
mod handlers;
mod querystring;

/// Configuration for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpServerConfig<'a> {
    pub port: &'a str,
}

/// The application's HTTP server. The underlying HTTP package is opaque to module consumers.
pub struct HttpServer {
    router: axum::Router,
    listener: net::TcpListener,
}

impl HttpServer {
    /// Returns a new HTTP server bound to the port specified in `config`.
    pub async fn new(
        state: impl AppState,
        auth: AuthContext,
        config: HttpServerConfig<'_>,
    ) -> anyhow::Result<Self> {
        let trace_layer = tower_http::trace::TraceLayer::new_for_http().make_span_with(
            |request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                tracing::info_span!("http_request", method = ?request.method(), uri)
            },
        );
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

        let router = Router::new()
            .route("/health", get(health_check))
            .nest("/api/v1", api_routes())
            .route("/metrics", get(|| async move { metric_handle.render() }))
            .layer(Extension(auth))
            .layer(trace_layer)
            .layer(prometheus_layer)
            .with_state(state);

        let listener = net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
            .await
            .with_context(|| format!("failed to listen on {}", config.port))?;

        Ok(Self { router, listener })
    }

    /// Runs the HTTP server.
    pub async fn run(self) -> anyhow::Result<()> {
        tracing::debug!("listening on {}", self.listener.local_addr().unwrap());
        axum::serve(self.listener, self.router)
            .await
            .context("received error from running server")?;
        Ok(())
    }
}

fn api_routes<S: AppState>() -> Router<S> {
    Router::new()
        .route(
            "/documents",
            get(list_documents::<S>).post(create_document::<S>),
        )
        .route(
            "/documents/{id}",
            get(get_document::<S>)
                .patch(update_document::<S>)
                .delete(delete_document::<S>),
        )
        .route(
            "/documents/{id}/versions",
            get(list_versions::<S>).post(create_version::<S>),
        )
        .route(
            "/documents/{id}/versions/{version}",
            get(get_version::<S>).delete(delete_version::<S>),
        )
        .route(
            "/documents/{id}/versions/{version}/rollback",
            post(rollback_version::<S>),
        )
        .route(
            "/documents/{id}/approvals",
            get(list_approvals::<S>).post(request_approval::<S>),
        )
        .route("/documents/{id}/approvals/summary", get(approval_summary::<S>))
        .route(
            "/documents/{id}/approvals/{approval_id}",
            patch(decide_approval::<S>),
        )
        .route(
            "/documents/{id}/comments",
            get(list_comments::<S>).post(create_comment::<S>),
        )
        .route("/templates", get(list_templates::<S>))
        .route(
            "/templates/{key}",
            get(get_template::<S>).put(update_template::<S>),
        )
        .route("/templates/{key}/draft", post(render_draft::<S>))
        .route("/frameworks", get(list_frameworks::<S>))
        .route("/frameworks/{key}", get(get_framework::<S>))
        .route("/frameworks/{key}/assessments", get(get_assessments::<S>))
        .route(
            "/frameworks/{key}/controls/{control_id}/assessment",
            patch(upsert_assessment::<S>),
        )
        .route("/frameworks/{key}/categories", get(list_categories::<S>))
        .route(
            "/frameworks/{key}/categories/{category_id}",
            get(get_category_detail::<S>),
        )
        .route("/frameworks/{key}/export/csv", get(export_csv::<S>))
        .route("/notifications", get(list_notifications::<S>))
        .route("/notifications/mark_read", post(mark_read::<S>))
        .route("/notifications/mark_all_read", post(mark_all_read::<S>))
        .route("/users", get(list_users::<S>).post(create_user::<S>))
        .route("/users/{id}", patch(update_user::<S>).delete(delete_user::<S>))
}
