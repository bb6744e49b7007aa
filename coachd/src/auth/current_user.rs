use crate::db::errors::DbError;
use crate::{
    AppState,
    api::models::users::CurrentUser,
    db::{
        handlers::{Repository, Users},
        models::users::UserCreateDBRequest,
    },
    errors::{Error, Result},
};
use axum::{extract::FromRequestParts, http::request::Parts};
use sqlx::PgPool;
use tracing::{debug, instrument, trace};

/// Derive a display name from an email's local part.
///
/// Auto-created users get this name when the upstream proxy sends no name
/// header. "coach@example.com" becomes "coach"; degenerate addresses fall
/// back to "user".
fn name_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or("user");
    if local.is_empty() { "user" } else { local }.to_string()
}

/// Extract user from proxy headers if present and valid
/// Returns:
/// - None: No proxy header present
/// - Some(Ok(user)): Valid proxy header found and user authenticated
/// - Some(Err(error)): Proxy header present but user lookup/creation failed
#[instrument(skip(parts, config, db))]
async fn try_proxy_header_auth(
    parts: &axum::http::request::Parts,
    config: &crate::config::Config,
    db: &PgPool,
) -> Option<Result<CurrentUser>> {
    let headers = &config.auth.proxy_header;

    // The identity header is mandatory; a dedicated email header wins when
    // the proxy sets both (the identity header may carry an opaque id).
    let identity = parts.headers.get(&headers.header_name).and_then(|h| h.to_str().ok());
    let user_email = match parts
        .headers
        .get(&headers.email_header_name)
        .and_then(|h| h.to_str().ok())
        .or(identity)
    {
        Some(email) => email,
        None => return None,
    };

    let mut tx = match db.begin().await {
        Ok(tx) => tx,
        Err(e) => return Some(Err(DbError::from(e).into())),
    };
    let mut user_repo = Users::new(&mut tx);

    let user_result = match user_repo.get_user_by_email(user_email).await {
        Ok(Some(user)) => Some(CurrentUser::from(user)),
        Ok(None) => {
            if headers.auto_create_users {
                let name = parts
                    .headers
                    .get(&headers.name_header_name)
                    .and_then(|h| h.to_str().ok())
                    .map(str::to_string)
                    .unwrap_or_else(|| name_from_email(user_email));

                let create_request = UserCreateDBRequest {
                    email: user_email.to_string(),
                    name,
                    role: headers.default_role,
                    check_in_frequency_days: None,
                };

                match user_repo.create(&create_request).await {
                    Ok(new_user) => Some(CurrentUser::from(new_user)),
                    Err(e) => return Some(Err(Error::Database(e))),
                }
            } else {
                None
            }
        }
        Err(e) => return Some(Err(Error::Database(e))),
    };

    match tx.commit().await {
        Ok(_) => {}
        Err(e) => return Some(Err(DbError::from(e).into())),
    }
    user_result.map(Ok)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        // try_proxy_header_auth returns Option<Result<CurrentUser>>:
        // - None means no credentials were present
        // - Some(Ok(user)) means successful authentication
        // - Some(Err(error)) means credentials were present but invalid
        //
        // Either failure mode collapses to a bare 401 so the response never
        // reveals whether an account exists.
        if state.config.auth.proxy_header.enabled {
            match try_proxy_header_auth(parts, &state.config, &state.db).await {
                Some(Ok(user)) => {
                    debug!("Found proxy header authenticated user: {}", user.id);
                    return Ok(user);
                }
                Some(Err(e)) => {
                    trace!("Proxy header authentication failed: {:?}", e);
                }
                None => {
                    trace!("No proxy header authentication attempted");
                }
            }
        }

        Err(Error::Unauthenticated { message: None })
    }
}
