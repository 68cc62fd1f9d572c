//! HTTP client for the hosted backend.
//!
//! One client covers the four backend surfaces the app consumes: auth
//! (password grant, sign-out, current user), table-level CRUD with
//! equality filters, callable functions, and object-storage signed URLs.
//! All requests carry the project anon key; authenticated requests add
//! the session's bearer token.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde_json::{json, Value};

use crate::config::BackendConfig;
use crate::error::SkymarkError;
use crate::features::sync::RemoteStore;

use super::session::Session;
use super::types::{AuthUser, TokenResponse};

/// Blocking client for the hosted backend.
pub struct BackendClient {
    http: Client,
    base_url: String,
    anon_key: String,
    token: Option<String>,
}

impl BackendClient {
    /// Build a client from backend settings, without a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, SkymarkError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SkymarkError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            token: None,
        })
    }

    /// Attach a signed-in session so requests run as that user.
    #[must_use]
    pub fn with_session(mut self, session: &Session) -> Self {
        self.token = Some(session.access_token.clone());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        let bearer = self.token.as_deref().unwrap_or(&self.anon_key);
        req.header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {bearer}"))
    }

    fn send(&self, req: RequestBuilder) -> Result<Response, SkymarkError> {
        let resp = req.send().map_err(|e| SkymarkError::from_http(&e))?;
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            let message = resp
                .text()
                .unwrap_or_else(|_| "(no response body)".to_string());
            Err(SkymarkError::Backend {
                status: status.as_u16(),
                message,
            })
        }
    }

    // --- auth ---

    /// Sign in with email and password, returning a fresh session.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or rejected credentials.
    pub fn sign_in(&self, email: &str, password: &str) -> Result<Session, SkymarkError> {
        let url = self.url("/auth/v1/token?grant_type=password");
        let req = self
            .authorize(self.http.post(url))
            .json(&json!({ "email": email, "password": password }));

        let token: TokenResponse = self
            .send(req)?
            .json()
            .map_err(|e| SkymarkError::Network(format!("Malformed token response: {e}")))?;

        Ok(Session::from_token(&token))
    }

    /// Revoke the current session's token.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or if no session is attached.
    pub fn sign_out(&self) -> Result<(), SkymarkError> {
        if self.token.is_none() {
            return Err(SkymarkError::AuthRequired(
                "no session to sign out".to_string(),
            ));
        }
        let req = self.authorize(self.http.post(self.url("/auth/v1/logout")));
        self.send(req)?;
        Ok(())
    }

    /// Fetch the signed-in user for the attached session.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or an invalid session.
    pub fn current_user(&self) -> Result<AuthUser, SkymarkError> {
        let req = self.authorize(self.http.get(self.url("/auth/v1/user")));
        self.send(req)?
            .json()
            .map_err(|e| SkymarkError::Network(format!("Malformed user response: {e}")))
    }

    // --- tables ---

    /// Select rows from a table with equality filters.
    ///
    /// Filters are `(column, value)` pairs combined with AND. Row-level
    /// security on the backend further restricts what comes back.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status.
    pub fn select(
        &self,
        table: &str,
        filters: &[(&str, &str)],
    ) -> Result<Vec<Value>, SkymarkError> {
        let mut query: Vec<(String, String)> = vec![("select".to_string(), "*".to_string())];
        for (column, value) in filters {
            query.push(((*column).to_string(), format!("eq.{value}")));
        }

        let req = self
            .authorize(self.http.get(self.url(&format!("/rest/v1/{table}"))))
            .query(&query);

        self.send(req)?
            .json()
            .map_err(|e| SkymarkError::Network(format!("Malformed rows response: {e}")))
    }

    /// Insert a single row, returning the stored representation.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, constraint violation, or a
    /// response without the new row.
    pub fn insert_row(&self, table: &str, payload: &Value) -> Result<Value, SkymarkError> {
        let req = self
            .authorize(self.http.post(self.url(&format!("/rest/v1/{table}"))))
            .header("Prefer", "return=representation")
            .json(payload);

        let mut rows: Vec<Value> = self
            .send(req)?
            .json()
            .map_err(|e| SkymarkError::Network(format!("Malformed insert response: {e}")))?;

        if rows.is_empty() {
            return Err(SkymarkError::Backend {
                status: 200,
                message: format!("insert into {table} returned no row"),
            });
        }
        Ok(rows.remove(0))
    }

    /// Update the row with the given id, returning the stored representation.
    ///
    /// # Errors
    ///
    /// Returns `SkymarkError::NotFound` if no row matched the id.
    pub fn update_row(
        &self,
        table: &str,
        id: &str,
        payload: &Value,
    ) -> Result<Value, SkymarkError> {
        let req = self
            .authorize(self.http.patch(self.url(&format!("/rest/v1/{table}"))))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(payload);

        let mut rows: Vec<Value> = self
            .send(req)?
            .json()
            .map_err(|e| SkymarkError::Network(format!("Malformed update response: {e}")))?;

        if rows.is_empty() {
            return Err(SkymarkError::NotFound(format!("{table} row {id}")));
        }
        Ok(rows.remove(0))
    }

    /// Delete the row with the given id.
    ///
    /// # Errors
    ///
    /// Returns `SkymarkError::NotFound` if no row matched the id.
    pub fn delete_row(&self, table: &str, id: &str) -> Result<(), SkymarkError> {
        let req = self
            .authorize(self.http.delete(self.url(&format!("/rest/v1/{table}"))))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation");

        let rows: Vec<Value> = self
            .send(req)?
            .json()
            .map_err(|e| SkymarkError::Network(format!("Malformed delete response: {e}")))?;

        if rows.is_empty() {
            return Err(SkymarkError::NotFound(format!("{table} row {id}")));
        }
        Ok(())
    }

    // --- functions ---

    /// Invoke a callable serverless function with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status.
    pub fn invoke_function(&self, name: &str, body: &Value) -> Result<Value, SkymarkError> {
        let req = self
            .authorize(self.http.post(self.url(&format!("/functions/v1/{name}"))))
            .json(body);

        self.send(req)?
            .json()
            .map_err(|e| SkymarkError::Network(format!("Malformed function response: {e}")))
    }

    // --- storage ---

    /// Request a signed URL for an object, valid for `expires_secs`.
    ///
    /// Returns an absolute URL.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or an unknown object.
    pub fn signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_secs: u64,
    ) -> Result<String, SkymarkError> {
        let req = self
            .authorize(
                self.http
                    .post(self.url(&format!("/storage/v1/object/sign/{bucket}/{path}"))),
            )
            .json(&json!({ "expiresIn": expires_secs }));

        let body: Value = self
            .send(req)?
            .json()
            .map_err(|e| SkymarkError::Network(format!("Malformed signing response: {e}")))?;

        let signed = body
            .get("signedURL")
            .and_then(Value::as_str)
            .ok_or_else(|| SkymarkError::Network("signing response missing URL".to_string()))?;

        Ok(self.url(signed))
    }
}

/// The sync driver replays queued mutations through the same table calls
/// the online write path uses.
impl RemoteStore for BackendClient {
    fn insert(&self, table: &str, payload: &Value) -> Result<(), SkymarkError> {
        self.insert_row(table, payload).map(|_| ())
    }

    fn update(&self, table: &str, id: &str, payload: &Value) -> Result<(), SkymarkError> {
        self.update_row(table, id, payload).map(|_| ())
    }

    fn delete(&self, table: &str, id: &str) -> Result<(), SkymarkError> {
        self.delete_row(table, id)
    }
}
