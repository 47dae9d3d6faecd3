//! Per-browser state: what was picked and the draft.
//!
//! Handlers load a [`GreetingSession`] at the start of a request, change it,
//! and save it back, so nothing lives in ambient globals. Uploaded images are
//! never stored here; they only live for the request that renders them.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::catalog::Selection;
use crate::error::GreetingError;

const SESSION_KEY: &str = "greeting";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub(crate) struct GreetingSession {
    pub(crate) selection: Selection,
    /// Empty until the first generation, then whatever the user edits it to.
    pub(crate) draft: String,
    /// Set by Confirm, cleared when a new draft is generated.
    pub(crate) confirmed: bool,
    /// How many images this session rendered, used to bust the preview cache.
    pub(crate) renders: u32,
}

impl GreetingSession {
    pub(crate) async fn load(session: &Session) -> Result<Self, GreetingError> {
        Ok(session
            .get::<GreetingSession>(SESSION_KEY)
            .await?
            .unwrap_or_default())
    }

    pub(crate) async fn save(&self, session: &Session) -> Result<(), GreetingError> {
        session.insert(SESSION_KEY, self).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_state_survives_json() {
        let state = GreetingSession {
            draft: "Happy Onam".to_string(),
            confirmed: true,
            renders: 2,
            ..Default::default()
        };
        let value = serde_json::to_value(&state).expect("serialize");
        let back: GreetingSession = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back.draft, "Happy Onam");
        assert!(back.confirmed);
        assert_eq!(back.renders, 2);
        assert_eq!(back.selection, Selection::default());
    }
}
