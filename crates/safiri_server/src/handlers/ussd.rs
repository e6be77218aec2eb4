//! USSD gateway callback.
//!
//! GET  /, /ussd  — parameters in the query string
//! POST /, /ussd  — parameters as an urlencoded form; any also present in
//!                  the query string take precedence
//!
//! The gateway only understands `CON …` / `END …` bodies, so this endpoint
//! always answers 200 with one of them, even for malformed callbacks.

use std::sync::Arc;

use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Form, Query};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Extension;
use safiri_core::{UssdRequest, UssdService};

pub async fn callback_get(
    Extension(service): Extension<Arc<UssdService>>,
    query: Result<Query<UssdRequest>, QueryRejection>,
) -> impl IntoResponse {
    let request = match query {
        Ok(Query(request)) => request,
        Err(rejection) => {
            tracing::warn!(%rejection, "unreadable ussd query");
            UssdRequest::default()
        }
    };
    respond(&service, &request).await
}

pub async fn callback_post(
    Extension(service): Extension<Arc<UssdService>>,
    query: Result<Query<UssdRequest>, QueryRejection>,
    form: Result<Form<UssdRequest>, FormRejection>,
) -> impl IntoResponse {
    let form = match form {
        Ok(Form(request)) => request,
        Err(rejection) => {
            tracing::warn!(%rejection, "unreadable ussd form");
            UssdRequest::default()
        }
    };
    let request = match query {
        Ok(Query(query)) => merge(query, form),
        Err(_) => form,
    };
    respond(&service, &request).await
}

/// Field-wise merge: non-empty `primary` values win over `fallback`.
fn merge(primary: UssdRequest, fallback: UssdRequest) -> UssdRequest {
    fn pick(primary: String, fallback: String) -> String {
        if primary.is_empty() {
            fallback
        } else {
            primary
        }
    }
    UssdRequest {
        session_id: pick(primary.session_id, fallback.session_id),
        service_code: pick(primary.service_code, fallback.service_code),
        phone_number: pick(primary.phone_number, fallback.phone_number),
        text: pick(primary.text, fallback.text),
    }
}

async fn respond(service: &UssdService, request: &UssdRequest) -> impl IntoResponse {
    let reply = service.handle(request).await;
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        reply.to_wire(),
    )
}
