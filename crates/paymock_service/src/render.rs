#![forbid(unsafe_code)]

use axum::body::Body;
use axum::http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use paymock_contracts::backend::{
    Credentials, ItemInfo, PurchaseReply, CLICK_TOKEN_HEADER, CLICK_TOKEN_VALUE,
    SCENARIO_INTERACTION_REDIRECT, SUGGESTED_CURRENCY_HEADER,
};
use paymock_contracts::session::EndpointCategory;
use tracing::{info, warn};

use crate::markup;
use crate::router::{Route, ScenarioTags};
use crate::state::MockState;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const HTML_CONTENT_TYPE: &str = "text/html";

/// A response decided while the state lock is held, sent after it is released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub status: StatusCode,
    pub content_type: Option<&'static str>,
    pub headers: Vec<(&'static str, &'static str)>,
    pub body: String,
    /// Set by the shutdown path; the serve loop stops after this reply.
    pub stop_requested: bool,
}

impl Rendered {
    fn new(status: StatusCode) -> Self {
        Self {
            status,
            content_type: None,
            headers: Vec::new(),
            body: String::new(),
            stop_requested: false,
        }
    }

    fn json<T: serde::Serialize>(status: StatusCode, payload: &T) -> Self {
        match serde_json::to_string(payload) {
            Ok(body) => Self {
                content_type: Some(JSON_CONTENT_TYPE),
                body,
                ..Self::new(status)
            },
            Err(err) => {
                warn!(error = %err, "failed to serialize mock payload");
                Self::error(StatusCode::INTERNAL_SERVER_ERROR, "payload serialization failed")
            }
        }
    }

    /// Failure shape of the listing, credentials and item-info endpoints.
    fn json_failure(status: StatusCode) -> Self {
        Self {
            content_type: Some(JSON_CONTENT_TYPE),
            ..Self::new(status)
        }
    }

    fn html(page: &'static str) -> Self {
        Self {
            content_type: Some(HTML_CONTENT_TYPE),
            body: page.to_string(),
            ..Self::new(StatusCode::OK)
        }
    }

    pub fn error(status: StatusCode, message: &str) -> Self {
        Self::json(status, &serde_json::json!({ "error": message }))
    }

    pub fn unhandled() -> Self {
        Self::error(StatusCode::NOT_FOUND, "unhandled")
    }

    fn header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }

    pub fn header_values(&self, name: &str) -> Vec<&'static str> {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
            .collect()
    }
}

impl IntoResponse for Rendered {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        let headers = response.headers_mut();
        if let Some(content_type) = self.content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        for (name, value) in self.headers {
            headers.append(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        response
    }
}

pub fn render(route: &Route, state: &mut MockState) -> Rendered {
    match route {
        Route::Head => Rendered::new(StatusCode::OK).header(CLICK_TOKEN_HEADER, CLICK_TOKEN_VALUE),
        Route::Unhandled => Rendered::unhandled(),
        Route::Endpoint { category, tags } => render_endpoint(*category, tags, state),
    }
}

fn render_endpoint(category: EndpointCategory, tags: &ScenarioTags, state: &mut MockState) -> Rendered {
    let fails = category.honors_fail() && (tags.fail || state.backend.flags().fails(category));
    let cancelled = state.backend.flags().interaction_cancelled;
    match category {
        EndpointCategory::AuthError => {
            Rendered::json(StatusCode::UNAUTHORIZED, &serde_json::json!({}))
        }
        EndpointCategory::Shutdown => Rendered {
            stop_requested: true,
            ..Rendered::new(StatusCode::OK)
        },
        EndpointCategory::PaymentMethodAdd => {
            Rendered::html(markup::add_flow_page(tags.add_flow, cancelled))
        }
        EndpointCategory::PaymentMethodCompleteAdd => match state.backend.complete_add() {
            Ok(count) => {
                info!(choices = count, "add-card flow completed");
                Rendered::html(markup::ADD_COMPLETED)
            }
            Err(err) => {
                warn!(error = %err, "add-card completion has no target payment type");
                Rendered::error(StatusCode::NOT_FOUND, &err.to_string())
            }
        },
        EndpointCategory::PaymentMethods if fails => Rendered::json_failure(StatusCode::NOT_FOUND),
        EndpointCategory::PaymentMethods => {
            Rendered::json(StatusCode::OK, state.backend.catalog())
        }
        EndpointCategory::CreditCardInteraction => {
            Rendered::html(markup::interaction_page(cancelled))
        }
        EndpointCategory::Purchase => {
            let reply = purchase_reply(fails, tags, state);
            // Failure still answers 200; only the not-purchased scenario changes the status.
            let status = if tags.not_purchased {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::OK
            };
            Rendered::json(status, &reply)
        }
        EndpointCategory::Credentials if fails => Rendered::json_failure(StatusCode::NOT_FOUND),
        EndpointCategory::Credentials => Rendered::json(StatusCode::OK, &Credentials::canned()),
        EndpointCategory::ItemInfo => {
            let mut out = if fails {
                Rendered::json_failure(StatusCode::NOT_FOUND)
            } else {
                Rendered::json(StatusCode::OK, &ItemInfo::canned())
            };
            if tags.eurozone {
                out = out.header(SUGGESTED_CURRENCY_HEADER, "EUR");
            }
            if tags.dotar {
                out = out.header(SUGGESTED_CURRENCY_HEADER, "ARS");
            }
            out
        }
    }
}

fn purchase_reply(fails: bool, tags: &ScenarioTags, state: &MockState) -> PurchaseReply {
    if fails {
        return PurchaseReply::degenerate();
    }
    match &state.backend.flags().interaction_required {
        Some(target) => PurchaseReply::in_progress(target.clone()),
        None if tags.interaction => PurchaseReply::in_progress(SCENARIO_INTERACTION_REDIRECT),
        None => PurchaseReply::complete(),
    }
}
