//! Azure AD OAuth2 authentication.
//!
//! Client-credentials (service-principal) flow against the Microsoft Identity
//! Platform v2.0 token endpoint.

use chrono::{Duration, Utc};
use log::debug;

use crate::client::AzureClient;
use crate::types::{
    AzureCredentials, AzureError, AzureErrorKind, AzureResult, AzureToken, TokenResponse,
};

const MANAGEMENT_SCOPE: &str = "https://management.azure.com/.default";

/// Token endpoint URL for a given tenant.
fn token_url(tenant_id: &str) -> String {
    format!(
        "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
        tenant_id
    )
}

fn validate(creds: &AzureCredentials) -> AzureResult<()> {
    if creds.client_id.is_empty() || creds.client_secret.is_empty() || creds.tenant_id.is_empty() {
        return Err(AzureError::new(
            AzureErrorKind::Validation,
            "client_id, client_secret, and tenant_id are all required",
        ));
    }
    Ok(())
}

/// Acquire a management-plane token using the client-credentials grant.
pub async fn acquire_token(
    client: &AzureClient,
    creds: &AzureCredentials,
) -> AzureResult<AzureToken> {
    validate(creds)?;

    let url = token_url(&creds.tenant_id);
    debug!("Azure token request → {}", url);

    let form: Vec<(&str, &str)> = vec![
        ("grant_type", "client_credentials"),
        ("client_id", &creds.client_id),
        ("client_secret", &creds.client_secret),
        ("scope", MANAGEMENT_SCOPE),
    ];

    let resp: TokenResponse = client.post_form_unauthenticated(&url, &form).await?;
    Ok(token_from_response(resp))
}

/// Authenticate `client` in place with its own credentials.
pub async fn authenticate(client: &mut AzureClient) -> AzureResult<()> {
    let creds = client
        .credentials()
        .cloned()
        .ok_or_else(AzureError::not_authenticated)?;
    let token = acquire_token(client, &creds).await?;
    client.set_token(token);
    Ok(())
}

fn token_from_response(resp: TokenResponse) -> AzureToken {
    let expires_at = resp
        .expires_in
        .map(|secs| Utc::now() + Duration::seconds(secs as i64));

    AzureToken {
        access_token: resp.access_token,
        token_type: resp.token_type,
        expires_at,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_url_format() {
        assert_eq!(
            token_url("my-tenant"),
            "https://login.microsoftonline.com/my-tenant/oauth2/v2.0/token"
        );
    }

    #[test]
    fn token_from_response_sets_expiry() {
        let resp = TokenResponse {
            access_token: "tok".into(),
            token_type: "Bearer".into(),
            expires_in: Some(3600),
        };
        let t = token_from_response(resp);
        assert_eq!(t.access_token, "tok");
        assert!(t.expires_at.is_some());
        assert!(!t.is_expired());
    }

    #[test]
    fn token_from_response_without_expiry() {
        let resp = TokenResponse {
            access_token: "tok".into(),
            token_type: "Bearer".into(),
            expires_in: None,
        };
        assert!(token_from_response(resp).expires_at.is_none());
    }

    #[tokio::test]
    async fn acquire_token_rejects_missing_fields() {
        let client = AzureClient::new();
        let creds = AzureCredentials {
            client_id: "id".into(),
            ..Default::default()
        };
        let err = acquire_token(&client, &creds).await.unwrap_err();
        assert_eq!(err.kind, AzureErrorKind::Validation);
    }

    #[tokio::test]
    async fn authenticate_without_credentials_fails() {
        let mut client = AzureClient::new();
        let err = authenticate(&mut client).await.unwrap_err();
        assert_eq!(err.kind, AzureErrorKind::NotAuthenticated);
    }
}
