use super::flash;
use super::prelude::*;
use crate::catalog::{resolve_sub_roles, sorted_occasions, sorted_tones};
use axum::Json;

#[derive(Clone, Debug)]
pub(crate) struct OptionView {
    pub(crate) value: String,
    pub(crate) selected: bool,
}

fn options<'a>(values: impl IntoIterator<Item = &'a str>, selected: &str) -> Vec<OptionView> {
    values
        .into_iter()
        .map(|value| OptionView {
            selected: value == selected,
            value: value.to_string(),
        })
        .collect()
}

#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub(crate) struct HomeTemplate {
    occasions: Vec<OptionView>,
    tones: Vec<OptionView>,
    categories: Vec<OptionView>,
    roles: Vec<OptionView>,
    role_label: String,
    text_color: String,
    draft: String,
    confirmed: bool,
    has_output: bool,
    render_version: u32,
    csrf_token: String,
    has_flash: bool,
    flash_message: String,
    flash_class: String,
}

impl HomeTemplate {
    fn new(greeting: GreetingSession, csrf_token: String, flash: Option<flash::FlashMessage>) -> Self {
        let selection = &greeting.selection;
        let category = selection.category;
        let (has_flash, flash_message, flash_class) = match flash {
            Some(message) => (true, message.text.to_string(), message.class.to_string()),
            None => (false, String::new(), String::new()),
        };
        Self {
            occasions: options(sorted_occasions(), &selection.occasion),
            tones: options(sorted_tones(), &selection.tone),
            categories: options(
                RelationshipCategory::ALL.map(RelationshipCategory::as_str),
                category.as_str(),
            ),
            roles: options(
                category.sub_roles().iter().copied(),
                &selection.specific_relationship,
            ),
            role_label: category.role_label().to_string(),
            text_color: selection.text_color.to_string(),
            draft: greeting.draft,
            confirmed: greeting.confirmed,
            has_output: greeting.renders > 0,
            render_version: greeting.renders,
            csrf_token,
            has_flash,
            flash_message,
            flash_class,
        }
    }
}

/// handles the / GET
pub(crate) async fn home_handler(session: Session) -> Result<HomeTemplate, GreetingError> {
    let greeting = GreetingSession::load(&session).await?;
    let csrf_token = csrf_token(&session).await?;
    let flash = flash::take_flash_message(&session).await?;
    Ok(HomeTemplate::new(greeting, csrf_token, flash))
}

#[derive(Deserialize)]
pub(crate) struct RolesQuery {
    category: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RolesResponse {
    label: &'static str,
    roles: &'static [&'static str],
}

/// Sub-roles for the dependent drop-down.
pub(crate) async fn roles_handler(
    Query(query): Query<RolesQuery>,
) -> Result<Json<RolesResponse>, GreetingError> {
    let category = query
        .category
        .parse::<RelationshipCategory>()
        .map_err(|err| {
            debug!("{}", err);
            GreetingError::BadRequest
        })?;
    Ok(Json(RolesResponse {
        label: category.role_label(),
        roles: resolve_sub_roles(category),
    }))
}

pub(crate) async fn styles_handler() -> impl IntoResponse {
    const STYLES: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/styles.css"));
    ([(CONTENT_TYPE, "text/css")], STYLES)
}
