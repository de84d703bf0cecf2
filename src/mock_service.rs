// In-memory stand-in for the remote booking service, so the clients and the
// scenarios can be exercised without network access
use crate::auth::AUTH_ENDPOINT;
use crate::booking::{BOOKING_ENDPOINT, PING_ENDPOINT};
use crate::models::{
    AuthRejection, AuthRequest, AuthResponse, Booking, BookingFilter, BookingId,
    BookingRequest, BookingResponse,
};
use crate::transport::{ApiError, HttpRequest, HttpTransport, RawResponse};
use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::{DashMap, DashSet};
use parking_lot::Mutex;
use reqwest::header::COOKIE;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::debug;

// Oldest entries are dropped once the log holds this many requests
pub const MAX_RECORDED_REQUESTS: usize = 1024;

pub struct MockBookingService {
    username: String,
    password: String,
    bookings: DashMap<u64, Booking>,
    tokens: DashSet<String>,
    next_id: AtomicU64,
    fail_next_requests: AtomicUsize,
    recent_requests: Mutex<Vec<HttpRequest>>,
}

impl MockBookingService {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            bookings: DashMap::new(),
            tokens: DashSet::new(),
            next_id: AtomicU64::new(1),
            fail_next_requests: AtomicUsize::new(0),
            recent_requests: Mutex::new(Vec::new()),
        }
    }

    // Hand out a token without going through /auth
    pub fn issue_token(&self) -> String {
        let token = format!("{:016x}", rand::random::<u64>());
        self.tokens.insert(token.clone());
        token
    }

    pub fn is_valid_token(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn booking(&self, booking_id: u64) -> Option<Booking> {
        self.bookings.get(&booking_id).map(|entry| entry.value().clone())
    }

    pub fn booking_count(&self) -> usize {
        self.bookings.len()
    }

    // The next `count` requests answer 500 before any routing happens
    pub fn fail_next_requests(&self, count: usize) {
        self.fail_next_requests.store(count, Ordering::SeqCst);
    }

    pub fn recorded_requests(&self) -> Vec<HttpRequest> {
        self.recent_requests.lock().clone()
    }

    pub fn clear_recorded_requests(&self) {
        self.recent_requests.lock().clear();
    }

    fn record(&self, request: &HttpRequest) {
        let mut recent = self.recent_requests.lock();
        if recent.len() >= MAX_RECORDED_REQUESTS {
            let excess = recent.len() + 1 - MAX_RECORDED_REQUESTS;
            recent.drain(..excess);
        }
        recent.push(request.clone());
    }

    fn take_failure(&self) -> bool {
        self.fail_next_requests
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn route(&self, request: &HttpRequest) -> RawResponse {
        let path = request.path.as_str();
        let method = request.method.as_str();

        if path == PING_ENDPOINT && method == "GET" {
            return created();
        }
        if path == AUTH_ENDPOINT && method == "POST" {
            return self.handle_auth(request);
        }
        if path == BOOKING_ENDPOINT {
            return match method {
                "GET" => self.handle_list(request),
                "POST" => self.handle_create(request),
                _ => status_text(405, "Method Not Allowed"),
            };
        }

        let booking_id = match path
            .strip_prefix(BOOKING_ENDPOINT)
            .and_then(|rest| rest.strip_prefix('/'))
            .and_then(|id| id.parse::<u64>().ok())
        {
            Some(id) => id,
            None => return not_found(),
        };

        match method {
            "GET" => self.handle_get(booking_id),
            "PUT" => self.handle_update(booking_id, request),
            "PATCH" => self.handle_partial_update(booking_id, request),
            "DELETE" => self.handle_delete(booking_id, request),
            _ => status_text(405, "Method Not Allowed"),
        }
    }

    fn handle_auth(&self, request: &HttpRequest) -> RawResponse {
        let credentials = request
            .body
            .clone()
            .and_then(|body| serde_json::from_value::<AuthRequest>(body).ok());

        match credentials {
            Some(auth) if auth.username == self.username && auth.password == self.password => {
                let token = self.issue_token();
                json_response(200, &AuthResponse { token })
            }
            // The real service also answers 200 here
            _ => json_response(
                200,
                &AuthRejection {
                    reason: "Bad credentials".to_string(),
                },
            ),
        }
    }

    fn handle_list(&self, request: &HttpRequest) -> RawResponse {
        let filter = match filter_from_query(&request.query) {
            Some(filter) => filter,
            None => return status_text(400, "Bad Request"),
        };

        let mut ids: Vec<u64> = self
            .bookings
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| *entry.key())
            .collect();
        ids.sort_unstable();

        let body: Vec<BookingId> = ids
            .into_iter()
            .map(|booking_id| BookingId { booking_id })
            .collect();
        json_response(200, &body)
    }

    fn handle_create(&self, request: &HttpRequest) -> RawResponse {
        let payload = match decode_body::<BookingRequest>(request) {
            Some(payload) => payload,
            None => return status_text(500, "Internal Server Error"),
        };

        let booking_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let booking = Booking::from(payload);
        self.bookings.insert(booking_id, booking.clone());

        json_response(200, &BookingResponse::new(booking_id, booking))
    }

    fn handle_get(&self, booking_id: u64) -> RawResponse {
        match self.booking(booking_id) {
            Some(booking) => json_response(200, &booking),
            None => not_found(),
        }
    }

    fn handle_update(&self, booking_id: u64, request: &HttpRequest) -> RawResponse {
        if !self.authorized(request) {
            return forbidden();
        }

        let payload = match decode_body::<BookingRequest>(request) {
            Some(payload) => payload,
            None => return status_text(400, "Bad Request"),
        };

        match self.bookings.get_mut(&booking_id) {
            Some(mut entry) => {
                *entry = Booking::from(payload);
                json_response(200, entry.value())
            }
            None => status_text(405, "Method Not Allowed"),
        }
    }

    fn handle_partial_update(&self, booking_id: u64, request: &HttpRequest) -> RawResponse {
        if !self.authorized(request) {
            return forbidden();
        }

        let patch = match request.body.as_ref().and_then(Value::as_object) {
            Some(patch) => patch,
            None => return status_text(400, "Bad Request"),
        };

        let mut entry = match self.bookings.get_mut(&booking_id) {
            Some(entry) => entry,
            None => return status_text(405, "Method Not Allowed"),
        };

        let mut merged = match serde_json::to_value(entry.value()) {
            Ok(Value::Object(current)) => current,
            _ => return status_text(500, "Internal Server Error"),
        };
        for (key, value) in patch {
            merged.insert(key.clone(), value.clone());
        }

        match serde_json::from_value::<Booking>(Value::Object(merged)) {
            Ok(updated) => {
                *entry = updated;
                json_response(200, entry.value())
            }
            Err(_) => status_text(400, "Bad Request"),
        }
    }

    fn handle_delete(&self, booking_id: u64, request: &HttpRequest) -> RawResponse {
        if !self.authorized(request) {
            return forbidden();
        }

        match self.bookings.remove(&booking_id) {
            Some(_) => created(),
            None => status_text(405, "Method Not Allowed"),
        }
    }

    fn authorized(&self, request: &HttpRequest) -> bool {
        request
            .header_value(COOKIE.as_str())
            .and_then(cookie_token)
            .map_or(false, |token| self.is_valid_token(token))
    }
}

impl Default for MockBookingService {
    fn default() -> Self {
        Self::new("admin", "password123")
    }
}

#[async_trait]
impl HttpTransport for MockBookingService {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, ApiError> {
        self.record(&request);

        let response = if self.take_failure() {
            status_text(500, "Internal Server Error")
        } else {
            self.route(&request)
        };

        debug!(
            method = %request.method,
            path = %request.path,
            status = response.status,
            "mock booking service"
        );
        Ok(response)
    }
}

// Value of `token` in a `Cookie: a=b; token=...` header
fn cookie_token(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == "token")
        .map(|(_, value)| value)
}

fn filter_from_query(query: &[(String, String)]) -> Option<BookingFilter> {
    let mut filter = BookingFilter::default();
    for (name, value) in query {
        match name.as_str() {
            "firstname" => filter.firstname = Some(value.clone()),
            "lastname" => filter.lastname = Some(value.clone()),
            "checkin" => filter.checkin = Some(parse_date(value)?),
            "checkout" => filter.checkout = Some(parse_date(value)?),
            _ => {}
        }
    }
    Some(filter)
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, crate::models::DATE_FORMAT).ok()
}

fn decode_body<T: serde::de::DeserializeOwned>(request: &HttpRequest) -> Option<T> {
    request
        .body
        .clone()
        .and_then(|body| serde_json::from_value(body).ok())
}

fn json_response<T: Serialize>(status: u16, body: &T) -> RawResponse {
    match serde_json::to_vec(body) {
        Ok(bytes) => RawResponse::new(status, bytes),
        Err(_) => status_text(500, "Internal Server Error"),
    }
}

fn status_text(status: u16, text: &'static str) -> RawResponse {
    RawResponse::new(status, text)
}

fn created() -> RawResponse {
    status_text(201, "Created")
}

fn not_found() -> RawResponse {
    status_text(404, "Not Found")
}

fn forbidden() -> RawResponse {
    status_text(403, "Forbidden")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn booking_body() -> Value {
        json!({
            "firstname": "Jim",
            "lastname": "Brown",
            "totalprice": 111,
            "depositpaid": true,
            "bookingdates": {"checkin": "2018-01-01", "checkout": "2019-01-01"},
            "additionalneeds": "Breakfast"
        })
    }

    async fn create(service: &MockBookingService) -> u64 {
        let request = HttpRequest::post(BOOKING_ENDPOINT).json(&booking_body()).unwrap();
        let response = service.send(request).await.unwrap();
        let created: BookingResponse = serde_json::from_slice(&response.body).unwrap();
        created.booking_id
    }

    #[test_case("token=abc", Some("abc"); "single cookie")]
    #[test_case("session=1; token=abc", Some("abc"); "several cookies")]
    #[test_case("session=1", None; "no token")]
    #[test_case("token", None; "malformed")]
    fn test_cookie_token(header: &str, expected: Option<&str>) {
        assert_eq!(cookie_token(header), expected);
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let service = MockBookingService::default();
        assert_eq!(create(&service).await, 1);
        assert_eq!(create(&service).await, 2);
        assert_eq!(service.booking_count(), 2);
    }

    #[tokio::test]
    async fn test_invalid_create_body() {
        let service = MockBookingService::default();
        let request = HttpRequest::post(BOOKING_ENDPOINT)
            .json(&json!({"firstname": "Jim"}))
            .unwrap();

        let response = service.send(request).await.unwrap();
        assert_eq!(response.status, 500);
        assert_eq!(service.booking_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_requires_token() {
        let service = MockBookingService::default();
        let id = create(&service).await;

        let response = service
            .send(HttpRequest::delete(format!("/booking/{}", id)))
            .await
            .unwrap();
        assert_eq!(response.status, 403);
        assert!(service.booking(id).is_some());

        let token = service.issue_token();
        let response = service
            .send(HttpRequest::delete(format!("/booking/{}", id)).token_cookie(&token))
            .await
            .unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(response.body, "Created");
        assert!(service.booking(id).is_none());
    }

    #[tokio::test]
    async fn test_unknown_routes() {
        let service = MockBookingService::default();

        let response = service.send(HttpRequest::get("/booking/abc")).await.unwrap();
        assert_eq!(response.status, 404);

        let response = service.send(HttpRequest::get("/rooms")).await.unwrap();
        assert_eq!(response.status, 404);

        let token = service.issue_token();
        let response = service
            .send(HttpRequest::delete("/booking/77").token_cookie(&token))
            .await
            .unwrap();
        assert_eq!(response.status, 405);
    }

    #[tokio::test]
    async fn test_invalid_partial_update_keeps_booking() {
        let service = MockBookingService::default();
        let id = create(&service).await;
        let token = service.issue_token();

        let request = HttpRequest::patch(format!("/booking/{}", id))
            .token_cookie(&token)
            .json(&json!({"totalprice": "lots"}))
            .unwrap();
        let response = service.send(request).await.unwrap();

        assert_eq!(response.status, 400);
        assert_eq!(service.booking(id).unwrap().total_price, 111);
    }

    #[tokio::test]
    async fn test_list_rejects_bad_dates() {
        let service = MockBookingService::default();
        let request = HttpRequest::get(BOOKING_ENDPOINT).query("checkin", "yesterday");

        let response = service.send(request).await.unwrap();
        assert_eq!(response.status, 400);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let service = MockBookingService::default();
        service.fail_next_requests(2);

        for _ in 0..2 {
            let response = service.send(HttpRequest::get(PING_ENDPOINT)).await.unwrap();
            assert_eq!(response.status, 500);
        }

        let response = service.send(HttpRequest::get(PING_ENDPOINT)).await.unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(service.recorded_requests().len(), 3);
    }

    #[tokio::test]
    async fn test_request_log_is_bounded() {
        let service = MockBookingService::default();

        for i in 0..MAX_RECORDED_REQUESTS + 10 {
            let request = HttpRequest::get(PING_ENDPOINT).query("n", i.to_string());
            service.send(request).await.unwrap();
        }

        let recorded = service.recorded_requests();
        assert_eq!(recorded.len(), MAX_RECORDED_REQUESTS);
        // the ten oldest requests were dropped
        assert_eq!(recorded[0].query, vec![("n".to_string(), "10".to_string())]);
        assert_eq!(
            recorded.last().unwrap().query[0].1,
            (MAX_RECORDED_REQUESTS + 9).to_string()
        );

        service.clear_recorded_requests();
        assert!(service.recorded_requests().is_empty());
    }
}
