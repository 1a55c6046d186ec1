use actix_session::Session;

use crate::errors::AppError;

const FLASH_KEY: &str = "_flashes";

/// Queues a message for the next page rendered in this session.
pub fn flash(session: &Session, message: impl Into<String>) -> Result<(), AppError> {
    let mut messages = session.get::<Vec<String>>(FLASH_KEY)?.unwrap_or_default();
    messages.push(message.into());
    session.insert(FLASH_KEY, messages)?;
    Ok(())
}

/// Returns every pending message and clears them.
pub fn take_flashes(session: &Session) -> Result<Vec<String>, AppError> {
    let messages = session.get::<Vec<String>>(FLASH_KEY)?.unwrap_or_default();
    if !messages.is_empty() {
        session.remove(FLASH_KEY);
    }
    Ok(messages)
}
