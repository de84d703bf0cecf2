// End-to-end test suite for a booking service's HTTP/JSON API

// Export modules in dependency order
pub mod config;
pub mod transport;
pub mod models;
pub mod auth;
pub mod booking;
pub mod payload;
pub mod mock_service; // In-memory service used by the offline tests
pub mod scenarios;

// Re-export key types for convenience
pub use auth::AuthClient;
pub use booking::BookingClient;
pub use config::{ClientConfig, ConfigError, Properties};
pub use mock_service::MockBookingService;
pub use models::{
    AuthRequest, AuthResponse, Booking, BookingDates, BookingFilter, BookingRequest,
    BookingResponse,
};
pub use payload::create_random_booking_payload;
pub use scenarios::BookingSuite;
pub use transport::{ApiError, HttpRequest, HttpTransport, RawResponse, ReqwestTransport};
