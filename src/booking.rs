// Booking client: one call per HTTP verb against the /booking resource
use crate::models::{Booking, BookingFilter, BookingId, BookingRequest, BookingResponse};
use crate::transport::{expect_status, extract, ApiError, HttpRequest, HttpTransport, RawResponse};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

pub const BOOKING_ENDPOINT: &str = "/booking";
pub const PING_ENDPOINT: &str = "/ping";

pub fn booking_path(booking_id: u64) -> String {
    format!("{}/{}", BOOKING_ENDPOINT, booking_id)
}

// The raw calls never assert the status; the *_and_extract variants do
pub struct BookingClient {
    transport: Arc<dyn HttpTransport>,
}

impl BookingClient {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    // --- GET ---
    pub async fn get_booking(&self, booking_id: u64) -> Result<RawResponse, ApiError> {
        let request = HttpRequest::get(booking_path(booking_id)).accept_json();
        self.transport.send(request).await
    }

    pub async fn get_booking_and_extract(&self, booking_id: u64) -> Result<Booking, ApiError> {
        let response = self.get_booking(booking_id).await?;
        extract(&response, 200)
    }

    pub async fn get_booking_ids(&self, filter: &BookingFilter) -> Result<Vec<u64>, ApiError> {
        let mut request = HttpRequest::get(BOOKING_ENDPOINT).accept_json();
        for (name, value) in filter.query_pairs() {
            request = request.query(name, value);
        }

        let response = self.transport.send(request).await?;
        let ids: Vec<BookingId> = extract(&response, 200)?;
        Ok(ids.into_iter().map(|id| id.booking_id).collect())
    }

    // --- CREATE ---
    pub async fn create_booking(&self, payload: &BookingRequest) -> Result<RawResponse, ApiError> {
        let request = HttpRequest::post(BOOKING_ENDPOINT)
            .accept_json()
            .json(payload)?;
        self.transport.send(request).await
    }

    pub async fn create_booking_and_extract(
        &self,
        payload: &BookingRequest,
    ) -> Result<BookingResponse, ApiError> {
        let response = self.create_booking(payload).await?;
        let created: BookingResponse = extract(&response, 200)?;
        debug!(booking_id = created.booking_id, "booking created");
        Ok(created)
    }

    // --- UPDATE ---
    pub async fn update_booking(
        &self,
        booking_id: u64,
        payload: &BookingRequest,
        token: &str,
    ) -> Result<RawResponse, ApiError> {
        let request = HttpRequest::put(booking_path(booking_id))
            .accept_json()
            .token_cookie(token)
            .json(payload)?;
        self.transport.send(request).await
    }

    pub async fn update_booking_and_extract(
        &self,
        booking_id: u64,
        payload: &BookingRequest,
        token: &str,
    ) -> Result<Booking, ApiError> {
        let response = self.update_booking(booking_id, payload, token).await?;
        extract(&response, 200)
    }

    // Only the fields present in `patch` are changed
    pub async fn partial_update_booking(
        &self,
        booking_id: u64,
        patch: &Map<String, Value>,
        token: &str,
    ) -> Result<RawResponse, ApiError> {
        let request = HttpRequest::patch(booking_path(booking_id))
            .accept_json()
            .token_cookie(token)
            .json(patch)?;
        self.transport.send(request).await
    }

    // --- DELETE ---
    pub async fn delete_booking(
        &self,
        booking_id: u64,
        token: &str,
    ) -> Result<RawResponse, ApiError> {
        let request = HttpRequest::delete(booking_path(booking_id)).token_cookie(token);
        self.transport.send(request).await
    }

    // The service answers 201 on its ping endpoint
    pub async fn health_check(&self) -> Result<(), ApiError> {
        let response = self.transport.send(HttpRequest::get(PING_ENDPOINT)).await?;
        expect_status(&response, 201)
    }
}
