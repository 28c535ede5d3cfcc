//! Startup provisioning of the first super admin.
//!
//! Without at least one `super_admin` nobody could approve sign-ups, so the
//! server can create one from `BOOTSTRAP_ADMIN_EMAIL` /
//! `BOOTSTRAP_ADMIN_PASSWORD`. Running it again is a no-op.

use atelier_core::roles::ROLE_SUPER_ADMIN;
use atelier_db::models::admin::Admin;
use atelier_db::models::Record;
use atelier_db::Facade;

use crate::auth::identity::{IdentityError, IdentityProvider};
use crate::config::BootstrapAdmin;
use crate::error::AppResult;

/// Make sure `bootstrap` can sign in as a super admin.
///
/// Creates the identity if it is missing and an `admins` record if none
/// carries the email. An existing record is returned untouched, whatever
/// its role.
pub async fn ensure_super_admin(
    identity: &dyn IdentityProvider,
    facade: &Facade,
    bootstrap: &BootstrapAdmin,
) -> AppResult<Record<Admin>> {
    let email = bootstrap.email.trim().to_lowercase();

    let uid = match identity.sign_up(&email, &bootstrap.password).await {
        Ok(uid) => {
            tracing::info!(email = %email, "Bootstrap identity created");
            Some(uid)
        }
        Err(IdentityError::EmailTaken(_)) => None,
        Err(e) => return Err(e.into()),
    };

    if let Some(existing) = facade.find_by::<Admin>("email", email.as_str()).await? {
        if existing.data.role != ROLE_SUPER_ADMIN {
            tracing::warn!(
                email = %email,
                role = %existing.data.role,
                "Bootstrap admin exists without the super admin role"
            );
        }
        return Ok(existing);
    }

    let record = facade
        .create(&Admin {
            name: "Super Admin".into(),
            email: email.clone(),
            role: ROLE_SUPER_ADMIN.into(),
            uid,
        })
        .await?;
    tracing::info!(email = %email, admin_id = %record.id, "Bootstrap super admin created");
    Ok(record)
}
