//! Account emails and the links inside them

use kernel::id::UserId;
use mailer::EmailSender;
use platform::html::escape;

use crate::application::config::IdentityConfig;
use crate::error::IdentityResult;

pub const CONFIRM_SUBJECT: &str = "Confirm your email";
pub const RESET_SUBJECT: &str = "Reset Password";

pub fn confirmation_link(config: &IdentityConfig, user_id: &UserId, code: &str) -> String {
    config.absolute_url(&format!(
        "/Identity/Account/ConfirmEmail?userId={}&code={}",
        user_id, code
    ))
}

pub fn reset_link(config: &IdentityConfig, code: &str) -> String {
    config.absolute_url(&format!("/Identity/Account/ResetPassword?code={}", code))
}

pub async fn send_confirmation<M: EmailSender>(
    mailer: &M,
    config: &IdentityConfig,
    email: &str,
    user_id: &UserId,
    code: &str,
) -> IdentityResult<()> {
    let link = confirmation_link(config, user_id, code);
    let body = format!(
        "Please confirm your account by <a href='{}'>clicking here</a>.",
        escape(&link)
    );
    mailer.send_email(email, CONFIRM_SUBJECT, &body).await?;
    Ok(())
}

pub async fn send_password_reset<M: EmailSender>(
    mailer: &M,
    config: &IdentityConfig,
    email: &str,
    code: &str,
) -> IdentityResult<()> {
    let link = reset_link(config, code);
    let body = format!(
        "Please reset your password by <a href='{}'>clicking here</a>.",
        escape(&link)
    );
    mailer.send_email(email, RESET_SUBJECT, &body).await?;
    Ok(())
}
