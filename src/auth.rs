// Authentication client: exchanges the configured credentials for a token
use crate::config::ClientConfig;
use crate::models::{AuthRejection, AuthRequest, AuthResponse};
use crate::transport::{
    decode_json, expect_status, ApiError, HttpRequest, HttpTransport, RawResponse,
};
use std::sync::Arc;
use tracing::{debug, warn};

pub const AUTH_ENDPOINT: &str = "/auth";

pub struct AuthClient {
    transport: Arc<dyn HttpTransport>,
    username: String,
    password: String,
}

impl AuthClient {
    pub fn new(transport: Arc<dyn HttpTransport>, config: &ClientConfig) -> Self {
        Self {
            transport,
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    // A fresh token on every call, nothing is cached
    pub async fn get_auth_token(&self) -> Result<String, ApiError> {
        let response = self.request_token(&self.username, &self.password).await?;
        expect_status(&response, 200)?;
        token_from(&response)
    }

    // Send arbitrary credentials and hand back the raw answer
    pub async fn request_token(
        &self,
        username: &str,
        password: &str,
    ) -> Result<RawResponse, ApiError> {
        let request =
            HttpRequest::post(AUTH_ENDPOINT).json(&AuthRequest::new(username, password))?;
        debug!(username, "requesting auth token");
        self.transport.send(request).await
    }
}

// The service answers 200 with {"reason": ...} for bad credentials
pub fn token_from(response: &RawResponse) -> Result<String, ApiError> {
    match decode_json::<AuthResponse>(response) {
        Ok(auth) if !auth.token.is_empty() => Ok(auth.token),
        Ok(_) => Err(ApiError::AuthRejected("empty token".to_string())),
        Err(decode_error) => match decode_json::<AuthRejection>(response) {
            Ok(rejection) => {
                warn!(reason = %rejection.reason, "authentication rejected");
                Err(ApiError::AuthRejected(rejection.reason))
            }
            Err(_) => Err(decode_error),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_service::MockBookingService;
    use tokio_test::{assert_err, assert_ok};

    fn config() -> ClientConfig {
        ClientConfig::new("http://mock", "admin", "password123")
    }

    #[tokio::test]
    async fn test_get_auth_token() {
        let service = Arc::new(MockBookingService::new("admin", "password123"));
        let client = AuthClient::new(service.clone(), &config());

        let token = assert_ok!(client.get_auth_token().await);
        assert!(!token.is_empty());
        assert!(service.is_valid_token(&token));

        let recorded = service.recorded_requests();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].path, AUTH_ENDPOINT);
        assert_eq!(recorded[0].body.as_ref().unwrap()["username"], "admin");
    }

    #[tokio::test]
    async fn test_fresh_token_per_call() {
        let service = Arc::new(MockBookingService::new("admin", "password123"));
        let client = AuthClient::new(service.clone(), &config());

        let first = client.get_auth_token().await.unwrap();
        let second = client.get_auth_token().await.unwrap();
        assert_ne!(first, second);
        assert_eq!(service.recorded_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_bad_credentials_are_rejected() {
        let service = Arc::new(MockBookingService::new("admin", "password123"));
        let wrong = ClientConfig::new("http://mock", "admin", "wrong");
        let client = AuthClient::new(service, &wrong);

        let error = assert_err!(client.get_auth_token().await);
        match error {
            ApiError::AuthRejected(reason) => assert_eq!(reason, "Bad credentials"),
            other => panic!("Expected auth rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_ok_status_is_rejected() {
        let service = Arc::new(MockBookingService::new("admin", "password123"));
        let client = AuthClient::new(service.clone(), &config());
        service.fail_next_requests(1);

        let error = assert_err!(client.get_auth_token().await);
        assert!(matches!(
            error,
            ApiError::UnexpectedStatus {
                expected: 200,
                actual: 500,
                ..
            }
        ));

        // the next call is answered normally
        assert_ok!(client.get_auth_token().await);
    }

    #[test]
    fn test_token_from_non_json_body() {
        let response = RawResponse::new(200, "Internal Server Error");
        assert!(matches!(token_from(&response), Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_token_from_empty_token() {
        let response = RawResponse::new(200, r#"{"token":""}"#);
        assert!(matches!(
            token_from(&response),
            Err(ApiError::AuthRejected(_))
        ));
    }
}
