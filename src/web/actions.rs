use std::collections::HashMap;

use axum::extract::Multipart;

use super::flash;
use super::prelude::*;
use crate::catalog::{TextColor, is_known_occasion, is_known_tone};
use crate::compositor::{Canvas, render};

/// Fields shared by every button on the form.
#[derive(Debug, Deserialize)]
pub(crate) struct SelectionForm {
    csrf_token: String,
    occasion: String,
    tone: String,
    category: String,
    specific_relationship: String,
    text_color: String,
    #[serde(default)]
    draft: Option<String>,
}

impl SelectionForm {
    /// Checks the drop-down values against the catalog. The specific role is
    /// taken as-is, it isn't checked against the category.
    fn selection(&self) -> Result<Selection, GreetingError> {
        if !is_known_occasion(&self.occasion) || !is_known_tone(&self.tone) {
            debug!("Unknown occasion {:?} or tone {:?}", self.occasion, self.tone);
            return Err(GreetingError::BadRequest);
        }
        let category = self
            .category
            .parse::<RelationshipCategory>()
            .map_err(|_| GreetingError::BadRequest)?;
        let specific_relationship = self.specific_relationship.trim();
        if specific_relationship.is_empty() {
            return Err(GreetingError::BadRequest);
        }
        let text_color = self
            .text_color
            .parse::<TextColor>()
            .map_err(|_| GreetingError::BadRequest)?;
        Ok(Selection {
            occasion: self.occasion.clone(),
            tone: self.tone.clone(),
            category,
            specific_relationship: specific_relationship.to_string(),
            text_color,
        })
    }

    fn from_fields(mut fields: HashMap<String, String>) -> Result<Self, GreetingError> {
        let mut take = |name: &str| fields.remove(name).ok_or(GreetingError::BadRequest);
        Ok(Self {
            csrf_token: take("csrf_token")?,
            occasion: take("occasion")?,
            tone: take("tone")?,
            category: take("category")?,
            specific_relationship: take("specific_relationship")?,
            text_color: take("text_color")?,
            draft: take("draft").ok(),
        })
    }
}

/// Generate Message: prompt Gemini and replace the draft.
#[instrument(skip_all, fields(occasion = %form.occasion, tone = %form.tone))]
pub(crate) async fn generate_handler(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SelectionForm>,
) -> Result<Redirect, GreetingError> {
    validate_csrf(&session, &form.csrf_token).await?;
    let selection = form.selection()?;

    let mut greeting = GreetingSession::load(&session).await?;
    greeting.selection = selection;
    greeting.save(&session).await?;

    let prompt = greeting.selection.prompt();
    debug!("Prompt: {}", prompt);
    let draft = state.generator.generate(&prompt).await?;
    info!("Generated a {} character greeting", draft.chars().count());

    greeting.draft = draft;
    greeting.confirmed = false;
    greeting.save(&session).await?;
    flash::set_flash(&session, flash::FLASH_DRAFT_READY).await?;
    Ok(Redirect::to("/"))
}

/// Confirm: keep the edited draft and show the coloured preview.
pub(crate) async fn confirm_handler(
    session: Session,
    Form(form): Form<SelectionForm>,
) -> Result<Redirect, GreetingError> {
    validate_csrf(&session, &form.csrf_token).await?;
    let selection = form.selection()?;

    let mut greeting = GreetingSession::load(&session).await?;
    greeting.selection = selection;
    greeting.draft = form.draft.unwrap_or_default();
    greeting.confirmed = true;
    greeting.save(&session).await?;
    flash::set_flash(&session, flash::FLASH_DRAFT_CONFIRMED).await?;
    Ok(Redirect::to("/"))
}

/// Generate Image: draw the draft onto the uploaded image and write the output file.
///
/// The upload is decoded, drawn on and dropped within this request. Without an
/// image nothing is rendered.
#[instrument(skip_all)]
pub(crate) async fn image_handler(
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> Result<Redirect, GreetingError> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut image_bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let bytes = field.bytes().await?;
            // browsers send an empty part when no file was chosen
            if !bytes.is_empty() {
                image_bytes = Some(bytes.to_vec());
            }
            continue;
        }
        let value = field.text().await?;
        fields.insert(name, value);
    }

    let form = SelectionForm::from_fields(fields)?;
    validate_csrf(&session, &form.csrf_token).await?;
    let selection = form.selection()?;

    let mut greeting = GreetingSession::load(&session).await?;
    greeting.selection = selection;
    if let Some(draft) = form.draft {
        greeting.draft = draft;
    }

    let Some(bytes) = image_bytes else {
        info!("Image requested without an upload, skipping render");
        greeting.save(&session).await?;
        flash::set_flash(&session, flash::FLASH_IMAGE_REQUIRED).await?;
        return Ok(Redirect::to("/"));
    };

    let mut canvas = Canvas::decode(&bytes)?;
    let png = render(
        &greeting.draft,
        &state.fonts,
        &mut canvas,
        greeting.selection.text_color,
    )?;
    tokio::fs::write(state.output_path.as_path(), &png).await?;
    info!(
        "Rendered {}x{} greeting to {}",
        canvas.width(),
        canvas.height(),
        state.output_path.display()
    );

    greeting.renders = greeting.renders.saturating_add(1);
    greeting.save(&session).await?;
    flash::set_flash(&session, flash::FLASH_IMAGE_READY).await?;
    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(category: &str, role: &str, color: &str) -> SelectionForm {
        SelectionForm {
            csrf_token: String::new(),
            occasion: "Holi".to_string(),
            tone: "Fun".to_string(),
            category: category.to_string(),
            specific_relationship: role.to_string(),
            text_color: color.to_string(),
            draft: None,
        }
    }

    #[test]
    fn role_is_not_checked_against_category() {
        let selection = form("Friend", "Manager", "#000000")
            .selection()
            .expect("selection");
        assert_eq!(selection.category, RelationshipCategory::Friend);
        assert_eq!(selection.specific_relationship, "Manager");
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(form("Neighbour", "Manager", "#000000").selection().is_err());
        assert!(form("Friend", "  ", "#000000").selection().is_err());
        assert!(form("Friend", "Close Friend", "black").selection().is_err());
    }

    #[test]
    fn multipart_fields_need_the_selection() {
        let mut fields = HashMap::new();
        fields.insert("csrf_token".to_string(), "t".to_string());
        assert!(SelectionForm::from_fields(fields).is_err());
    }
}
