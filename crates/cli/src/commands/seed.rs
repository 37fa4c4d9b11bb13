//! Seed the database with the demo accounts.
//!
//! Creates `admin@test.com` (ADMIN) and `user@test.com` (USER). Accounts that
//! already exist are left untouched, so the command can be re-run safely.

use modish_api::db::users::UserRepository;

use super::connect;
use super::user::{UserError, new_user};

const DEMO_ADMIN_EMAIL: &str = "admin@test.com";
const DEMO_USER_EMAIL: &str = "user@test.com";

/// Create the demo administrator and shopper.
///
/// # Errors
///
/// Returns `UserError` if a password is rejected or the database fails.
pub async fn demo_users(admin_password: &str, user_password: &str) -> Result<(), UserError> {
    let accounts = [
        new_user(DEMO_ADMIN_EMAIL, "Admin", admin_password, "admin")?,
        new_user(DEMO_USER_EMAIL, "Tester", user_password, "user")?,
    ];

    let pool = connect().await?;
    let users = UserRepository::new(&pool);

    for account in &accounts {
        if users.email_exists(&account.email).await? {
            tracing::info!("Skipping {}: already exists", account.email);
            continue;
        }
        let user = users.create(account).await?;
        tracing::info!("Created {} ({}) with ID {}", user.email, user.role, user.id);
    }

    tracing::info!("Seed complete!");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use modish_core::Email;

    use super::*;

    #[test]
    fn test_demo_emails_are_valid() {
        assert!(Email::parse(DEMO_ADMIN_EMAIL).is_ok());
        assert!(Email::parse(DEMO_USER_EMAIL).is_ok());
    }
}
