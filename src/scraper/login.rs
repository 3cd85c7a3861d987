use tracing::{debug, info};

use crate::app::Result;
use crate::browser::{wait_for_interactable, BrowserDriver, BrowserSettings, DomElement};
use crate::config::{Credentials, DelayRange};
use crate::scraper::LoginSettings;

/// Sign in through the site's login form.
///
/// Credentials are typed one character at a time with a short random pause
/// between keystrokes.
pub async fn login<D: BrowserDriver>(
    driver: &D,
    settings: &LoginSettings,
    credentials: &Credentials,
    browser: &BrowserSettings,
) -> Result<()> {
    info!("Logging in at {}", settings.url);

    driver.navigate(&settings.url).await?;
    settings.page_settle.sleep().await;

    let timeout = browser.element_timeout();
    let poll = browser.poll_interval();

    let username = wait_for_interactable(driver, &settings.username_field, timeout, poll).await?;
    type_slowly(&username, &credentials.username, settings.keystroke).await?;

    let password = wait_for_interactable(driver, &settings.password_field, timeout, poll).await?;
    type_slowly(&password, &credentials.password, settings.keystroke).await?;

    let submit = wait_for_interactable(driver, &settings.submit_button, timeout, poll).await?;
    submit.click().await?;
    settings.after_submit.sleep().await;

    info!("Login submitted");
    Ok(())
}

async fn type_slowly<E: DomElement>(element: &E, text: &str, keystroke: DelayRange) -> Result<()> {
    let mut buf = [0u8; 4];
    for ch in text.chars() {
        element.type_text(ch.encode_utf8(&mut buf)).await?;
        keystroke.sleep().await;
    }
    debug!("Typed {} characters", text.chars().count());
    Ok(())
}
