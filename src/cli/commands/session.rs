//! Session commands: login, logout, whoami.

use colored::Colorize;

use crate::backend::{BackendClient, Profiles, Session};
use crate::cli::args::OutputFormat;
use crate::config::Config;
use crate::error::SkymarkError;
use crate::output::to_json;
use crate::storage::{Database, KvStore};

/// Sign in and store the session locally.
///
/// # Errors
///
/// Returns an error on rejected credentials, transport failure, or a
/// local storage failure.
pub fn login(
    config: &Config,
    email: &str,
    password: &str,
    format: OutputFormat,
) -> Result<String, SkymarkError> {
    let client = BackendClient::new(&config.backend)?;
    let session = client.sign_in(email, password)?;

    let db = Database::open()?;
    session.save(&KvStore::new(&db))?;

    match format {
        OutputFormat::Json => to_json(&serde_json::json!({
            "user_id": session.user_id,
            "email": session.email,
        })),
        OutputFormat::Pretty => Ok(format!(
            "Signed in as {} ({})",
            session.email.as_deref().unwrap_or("unknown").bold(),
            session.user_id.dimmed()
        )),
    }
}

/// Sign out, revoking the token when the backend is reachable.
///
/// # Errors
///
/// Returns an error if no session is stored or the local storage fails.
pub fn logout(config: &Config, format: OutputFormat) -> Result<String, SkymarkError> {
    let db = Database::open()?;
    let kv = KvStore::new(&db);
    let session = Session::require(&kv)?;

    // Best effort: the local session goes away even if the backend is
    // unreachable right now
    let client = BackendClient::new(&config.backend)?.with_session(&session);
    if let Err(e) = client.sign_out() {
        tracing::debug!(error = %e, "remote sign-out failed; discarding local session anyway");
    }

    Session::clear(&kv)?;

    match format {
        OutputFormat::Json => to_json(&serde_json::json!({ "signed_out": true })),
        OutputFormat::Pretty => Ok("Signed out".to_string()),
    }
}

/// Show the signed-in user.
///
/// # Errors
///
/// Returns an error if no session is stored.
pub fn whoami(config: &Config, format: OutputFormat) -> Result<String, SkymarkError> {
    let db = Database::open()?;
    let session = Session::require(&KvStore::new(&db))?;

    // Refresh the identity from the backend when reachable; fall back to
    // the stored session offline
    let client = BackendClient::new(&config.backend)?.with_session(&session);
    let (user_id, email) = match client.current_user() {
        Ok(user) => (user.id, user.email),
        Err(e) => {
            tracing::debug!(error = %e, "could not refresh identity; using stored session");
            (session.user_id.clone(), session.email.clone())
        }
    };

    let username = Profiles::new(&client)
        .get(&user_id)
        .map(|p| p.username)
        .ok();

    match format {
        OutputFormat::Json => to_json(&serde_json::json!({
            "user_id": user_id,
            "email": email,
            "username": username,
            "signed_in_at": session.signed_in_at.to_rfc3339(),
        })),
        OutputFormat::Pretty => {
            let mut out = format!(
                "{} ({})\n  signed in {}",
                email.as_deref().unwrap_or("unknown").bold(),
                user_id,
                session.signed_in_at.format("%Y-%m-%d %H:%M")
            );
            if let Some(username) = username {
                out.push_str(&format!("\n  profile: {username}"));
            }
            Ok(out)
        }
    }
}
