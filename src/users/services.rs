use tracing::{error, info, warn};

use crate::error::ApiError;
use crate::i18n::{Locale, Text};
use crate::state::AppState;
use crate::users::dto::{CreateUserRequest, UpdateUserRequest};
use crate::users::repo::RepoError;
use crate::users::repo_types::{User, UserChanges, UserStatus};
use crate::users::validation::{
    check_updated_email, email_domain, validate_create, validate_update, Field, Rule,
    Violations,
};

pub async fn list_users(state: &AppState) -> Result<Vec<User>, ApiError> {
    let locale = state.config.locale;
    state
        .users
        .list_active()
        .await
        .map_err(|e| repo_failure(locale, Text::ListFailed, e))
}

pub async fn get_user(state: &AppState, id: i64) -> Result<User, ApiError> {
    let locale = state.config.locale;
    state
        .users
        .find_by_id(id)
        .await
        .map_err(|e| repo_failure(locale, Text::FetchFailed, e))?
        .ok_or_else(|| ApiError::user_not_found(locale, id))
}

pub async fn create_user(state: &AppState, req: CreateUserRequest) -> Result<User, ApiError> {
    let locale = state.config.locale;
    let checked = validate_create(req);
    let new = checked.value;
    let mut violations = checked.violations;

    if !violations.contains(Field::Email) {
        let taken = state
            .users
            .email_in_use(&new.email, None)
            .await
            .map_err(|e| repo_failure(locale, Text::CreateFailed, e))?;
        if taken {
            violations.record(Field::Email, Rule::EmailTaken);
        }
    }
    reject_if_invalid(locale, &violations)?;

    let user = state
        .users
        .insert(new)
        .await
        .map_err(|e| repo_failure(locale, Text::CreateFailed, e))?;
    info!(user_id = user.id, email = %user.email, "user created");
    Ok(user)
}

pub async fn update_user(
    state: &AppState,
    id: i64,
    req: UpdateUserRequest,
) -> Result<User, ApiError> {
    let locale = state.config.locale;
    let current = get_user(state, id).await?;

    let checked = validate_update(req);
    let changes = checked.value;
    let mut violations = checked.violations;

    if let Some(email) = changes.email.as_deref() {
        let resolves = match email_domain(email) {
            Some(domain) => state.resolver.resolves(domain).await,
            None => false,
        };
        check_updated_email(&mut violations, email, resolves);
    }

    if !violations.contains(Field::Email) {
        if let Some(email) = email_to_recheck(&current, &changes) {
            let taken = state
                .users
                .email_in_use(email, Some(id))
                .await
                .map_err(|e| repo_failure(locale, Text::UpdateFailed, e))?;
            if taken {
                violations.record(Field::Email, Rule::EmailTaken);
            }
        }
    }
    reject_if_invalid(locale, &violations)?;

    let user = state
        .users
        .update(id, changes)
        .await
        .map_err(|e| repo_failure(locale, Text::UpdateFailed, e))?
        .ok_or_else(|| ApiError::user_not_found(locale, id))?;
    info!(user_id = user.id, "user updated");
    Ok(user)
}

/// Soft delete: the row stays, its status becomes inactive.
pub async fn delete_user(state: &AppState, id: i64) -> Result<(), ApiError> {
    let locale = state.config.locale;
    get_user(state, id).await?;

    state
        .users
        .update(id, UserChanges::deactivate())
        .await
        .map_err(|e| repo_failure(locale, Text::DeleteFailed, e))?
        .ok_or_else(|| ApiError::user_not_found(locale, id))?;
    info!(user_id = id, "user deactivated");
    Ok(())
}

/// Email whose active-uniqueness must hold after the update, if any.
///
/// Only a record that ends up active competes for its email: either a new
/// email is being set, or an inactive record is being reactivated with the
/// one it already has.
fn email_to_recheck<'a>(current: &'a User, changes: &'a UserChanges) -> Option<&'a str> {
    if changes.resulting_status(current.status) != UserStatus::Active {
        return None;
    }
    match changes.email.as_deref() {
        Some(email) => Some(email),
        None if current.status == UserStatus::Inactive => Some(current.email.as_str()),
        None => None,
    }
}

fn reject_if_invalid(locale: Locale, violations: &Violations) -> Result<(), ApiError> {
    if violations.is_empty() {
        return Ok(());
    }
    warn!(fields = ?violations.keys(), "validation failed");
    Err(ApiError::validation(locale, violations))
}

fn repo_failure(locale: Locale, context: Text, e: RepoError) -> ApiError {
    match e {
        // Lost a race against a concurrent writer holding the same email.
        RepoError::EmailTaken => {
            let mut violations = Violations::default();
            violations.record(Field::Email, Rule::EmailTaken);
            warn!("active email conflict detected at write time");
            ApiError::validation(locale, &violations)
        }
        RepoError::Database(e) => {
            error!(error = %e, "user repository failure");
            ApiError::internal(locale, context, e)
        }
    }
}
