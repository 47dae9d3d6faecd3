pub(crate) use super::csrf::{csrf_token, validate_csrf};
pub(crate) use super::session::GreetingSession;
pub(crate) use crate::catalog::{RelationshipCategory, Selection};
pub(crate) use crate::error::GreetingError;
pub(crate) use crate::web::AppState;
pub(crate) use askama::Template;
pub(crate) use askama_web::WebTemplate;
pub(crate) use axum::extract::{Form, Query, State};
pub(crate) use axum::http::{HeaderValue, StatusCode, header::CONTENT_TYPE};
pub(crate) use axum::response::{IntoResponse, Redirect, Response};
pub(crate) use serde::{Deserialize, Serialize};
pub(crate) use tower_sessions::Session;
pub(crate) use tracing::{debug, info, instrument};
