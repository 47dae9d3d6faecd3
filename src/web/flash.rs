use tower_sessions::Session;

use crate::error::GreetingError;

const FLASH_FLAG_KEY: &str = "flash_flag";

pub(crate) const FLASH_DRAFT_READY: u16 = 1;
pub(crate) const FLASH_DRAFT_CONFIRMED: u16 = 2;
pub(crate) const FLASH_IMAGE_REQUIRED: u16 = 3;
pub(crate) const FLASH_IMAGE_READY: u16 = 4;

#[derive(Clone, Debug)]
pub(crate) struct FlashMessage {
    pub(crate) text: &'static str,
    pub(crate) class: &'static str,
}

pub(crate) async fn set_flash(session: &Session, flag: u16) -> Result<(), GreetingError> {
    session.insert(FLASH_FLAG_KEY, flag).await?;
    Ok(())
}

pub(crate) async fn take_flash_message(
    session: &Session,
) -> Result<Option<FlashMessage>, GreetingError> {
    let flag = session
        .get::<u16>(FLASH_FLAG_KEY)
        .await?
        .filter(|flag| *flag != 0);
    if flag.is_some() {
        session.insert(FLASH_FLAG_KEY, 0u16).await?;
    }
    Ok(flag.and_then(message_for))
}

fn message_for(flag: u16) -> Option<FlashMessage> {
    match flag {
        FLASH_DRAFT_READY => Some(FlashMessage {
            text: "Your greeting is ready. Edit the draft as needed.",
            class: "success",
        }),
        FLASH_DRAFT_CONFIRMED => Some(FlashMessage {
            text: "Draft confirmed.",
            class: "success",
        }),
        FLASH_IMAGE_REQUIRED => Some(FlashMessage {
            text: "Please upload an image to proceed.",
            class: "warning",
        }),
        FLASH_IMAGE_READY => Some(FlashMessage {
            text: "Your greeting image is ready to download.",
            class: "success",
        }),
        _ => None,
    }
}
