// Create / update / delete flows against the booking service. Each flow is a
// straight sequence of calls followed by checks; the first failed check ends it.
use crate::auth::{token_from, AuthClient};
use crate::booking::BookingClient;
use crate::config::ClientConfig;
use crate::models::{Booking, BookingRequest, BookingResponse};
use crate::payload::create_random_booking_payload;
use crate::transport::{HttpTransport, ReqwestTransport};
use anyhow::{ensure, Context, Result};
use std::fmt::Debug;
use std::sync::Arc;
use tracing::info;

pub const UPDATED_PREFIX: &str = "UPDATED_";
pub const UPDATED_TOTAL_PRICE: i64 = 999;

// Both clients sharing one transport
pub struct BookingSuite {
    pub auth: AuthClient,
    pub bookings: BookingClient,
}

impl BookingSuite {
    pub fn new(transport: Arc<dyn HttpTransport>, config: &ClientConfig) -> Self {
        Self {
            auth: AuthClient::new(transport.clone(), config),
            bookings: BookingClient::new(transport),
        }
    }

    // Suite talking to the remote service named in the configuration
    pub fn remote(config: &ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config).context("building HTTP client")?;
        Ok(Self::new(Arc::new(transport), config))
    }
}

fn check_eq<A, E>(label: &str, actual: &A, expected: &E) -> Result<()>
where
    A: PartialEq<E> + Debug + ?Sized,
    E: Debug + ?Sized,
{
    ensure!(
        actual == expected,
        "{} should match: expected {:?}, got {:?}",
        label,
        expected,
        actual
    );
    Ok(())
}

// Field-by-field comparison so a mismatch names the field
pub fn check_booking_matches(booking: &Booking, request: &BookingRequest) -> Result<()> {
    check_eq("Firstname", &booking.firstname, &request.firstname)?;
    check_eq("Lastname", &booking.lastname, &request.lastname)?;
    check_eq("Total price", &booking.total_price, &request.total_price)?;
    check_eq("Deposit paid", &booking.deposit_paid, &request.deposit_paid)?;
    check_eq(
        "Additional needs",
        &booking.additional_needs,
        &request.additional_needs,
    )?;
    check_eq(
        "Checkin date",
        &booking.booking_dates.checkin,
        &request.booking_dates.checkin,
    )?;
    check_eq(
        "Checkout date",
        &booking.booking_dates.checkout,
        &request.booking_dates.checkout,
    )?;
    Ok(())
}

async fn fetch_token(suite: &BookingSuite) -> Result<String> {
    let token = suite
        .auth
        .get_auth_token()
        .await
        .context("requesting auth token")?;
    ensure!(!token.is_empty(), "Auth token should not be empty");
    Ok(token)
}

pub async fn create_booking_flow(suite: &BookingSuite) -> Result<BookingResponse> {
    create_booking_flow_with(suite, &create_random_booking_payload()).await
}

pub async fn create_booking_flow_with(
    suite: &BookingSuite,
    payload: &BookingRequest,
) -> Result<BookingResponse> {
    let created = suite
        .bookings
        .create_booking_and_extract(payload)
        .await
        .context("creating booking")?;

    ensure!(created.booking_id > 0, "Booking ID should be positive");
    check_booking_matches(&created.booking, payload)?;

    info!(booking_id = created.booking_id, "create booking flow passed");
    Ok(created)
}

// Copy of `payload` with a marked firstname and a distinctive price
pub fn updated_payload(payload: BookingRequest) -> BookingRequest {
    BookingRequest::new(
        format!("{}{}", UPDATED_PREFIX, payload.firstname),
        payload.lastname,
        UPDATED_TOTAL_PRICE,
        payload.deposit_paid,
        payload.booking_dates,
        payload.additional_needs,
    )
}

pub async fn update_booking_flow(suite: &BookingSuite) -> Result<Booking> {
    let token = fetch_token(suite).await?;

    let initial = create_random_booking_payload();
    let created = suite
        .bookings
        .create_booking_and_extract(&initial)
        .await
        .context("creating booking to update")?;

    let update = updated_payload(create_random_booking_payload());
    let updated = suite
        .bookings
        .update_booking_and_extract(created.booking_id, &update, &token)
        .await
        .context("updating booking")?;

    check_eq("Firstname", &updated.firstname, &update.firstname)?;
    ensure!(
        updated.firstname != initial.firstname,
        "Firstname should be updated"
    );
    check_eq("Total price", &updated.total_price, &UPDATED_TOTAL_PRICE)?;
    check_eq(
        "Checkin date",
        &updated.booking_dates.checkin,
        &update.booking_dates.checkin,
    )?;

    let stored = suite
        .bookings
        .get_booking_and_extract(created.booking_id)
        .await
        .context("reading updated booking")?;
    check_booking_matches(&stored, &update)?;

    info!(booking_id = created.booking_id, "update booking flow passed");
    Ok(updated)
}

// Returns the id of the booking that no longer exists
pub async fn delete_booking_flow(suite: &BookingSuite) -> Result<u64> {
    let token = fetch_token(suite).await?;

    let created = suite
        .bookings
        .create_booking_and_extract(&create_random_booking_payload())
        .await
        .context("creating booking to delete")?;
    let booking_id = created.booking_id;
    ensure!(booking_id > 0, "Created booking ID should be positive");

    let deleted = suite
        .bookings
        .delete_booking(booking_id, &token)
        .await
        .context("deleting booking")?;
    check_eq("Delete status", &deleted.status, &201)?;

    let after = suite
        .bookings
        .get_booking(booking_id)
        .await
        .context("reading deleted booking")?;
    check_eq("Status after delete", &after.status, &404)?;

    info!(booking_id, "delete booking flow passed");
    Ok(booking_id)
}

// Wrong credentials must not yield a token, whatever status the service uses
pub async fn rejected_auth_flow(
    suite: &BookingSuite,
    username: &str,
    password: &str,
) -> Result<()> {
    let response = suite
        .auth
        .request_token(username, password)
        .await
        .context("requesting auth token")?;

    if response.status == 200 {
        ensure!(
            token_from(&response).is_err(),
            "Token should not be issued for wrong credentials"
        );
    }

    info!(status = response.status, "rejected auth flow passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_service::MockBookingService;
    use crate::models::BookingDates;
    use chrono::NaiveDate;

    fn suite() -> (Arc<MockBookingService>, BookingSuite) {
        let service = Arc::new(MockBookingService::new("admin", "password123"));
        let config = ClientConfig::new("http://mock", "admin", "password123");
        let suite = BookingSuite::new(service.clone(), &config);
        (service, suite)
    }

    fn request() -> BookingRequest {
        BookingRequest::new(
            "John_ab12cd34",
            "Doe_ab12cd34",
            150,
            true,
            BookingDates::new(
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(),
            ),
            Some("Breakfast, WiFi".to_string()),
        )
    }

    #[test]
    fn test_check_booking_matches_names_the_field() {
        let mut booking = Booking::from(request());
        booking.total_price = 151;

        let error = check_booking_matches(&booking, &request()).unwrap_err();
        assert!(error.to_string().starts_with("Total price should match"));
    }

    #[test]
    fn test_updated_payload() {
        let update = updated_payload(request());
        assert_eq!(update.firstname, "UPDATED_John_ab12cd34");
        assert_eq!(update.total_price, 999);
        assert_eq!(update.lastname, "Doe_ab12cd34");
    }

    #[tokio::test]
    async fn test_create_flow_fails_on_server_error() {
        let (service, suite) = suite();
        service.fail_next_requests(1);

        let error = create_booking_flow(&suite).await.unwrap_err();
        assert_eq!(error.to_string(), "creating booking");
        assert!(format!("{:#}", error).contains("got 500"));
    }

    #[tokio::test]
    async fn test_delete_flow_fails_without_auth() {
        let service = Arc::new(MockBookingService::new("admin", "password123"));
        let config = ClientConfig::new("http://mock", "admin", "wrong");
        let suite = BookingSuite::new(service.clone(), &config);

        let error = delete_booking_flow(&suite).await.unwrap_err();
        assert_eq!(error.to_string(), "requesting auth token");
        assert_eq!(service.booking_count(), 0);
    }

    #[tokio::test]
    async fn test_rejected_auth_flow_accepts_error_status() {
        let (service, suite) = suite();
        service.fail_next_requests(1);

        rejected_auth_flow(&suite, "admin", "wrong").await.unwrap();
        assert_eq!(service.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_auth_flow_fails_when_token_is_issued() {
        let (_service, suite) = suite();

        let error = rejected_auth_flow(&suite, "admin", "password123")
            .await
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "Token should not be issued for wrong credentials"
        );
    }
}
