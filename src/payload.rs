// Randomized but valid booking payloads, unique per call
use crate::models::{BookingDates, BookingRequest};
use chrono::{Days, Local, NaiveDate};
use rand::Rng;

pub const FIRSTNAME_PREFIX: &str = "John_";
pub const LASTNAME_PREFIX: &str = "Doe_";
pub const DEFAULT_TOTAL_PRICE: i64 = 150;
pub const DEFAULT_ADDITIONAL_NEEDS: &str = "Breakfast, WiFi";
pub const CHECKIN_OFFSET_DAYS: u64 = 1;
pub const CHECKOUT_OFFSET_DAYS: u64 = 5;
pub const UNIQUE_ID_LEN: usize = 8;

const HEX_DIGITS: &[u8] = b"0123456789abcdef";

// Eight lowercase hex characters
pub fn unique_id() -> String {
    let mut rng = rand::thread_rng();
    (0..UNIQUE_ID_LEN)
        .map(|_| HEX_DIGITS[rng.gen_range(0..HEX_DIGITS.len())] as char)
        .collect()
}

pub fn create_random_booking_payload() -> BookingRequest {
    create_booking_payload_for(Local::now().date_naive())
}

pub fn create_booking_payload_for(today: NaiveDate) -> BookingRequest {
    let id = unique_id();

    BookingRequest::new(
        format!("{}{}", FIRSTNAME_PREFIX, id),
        format!("{}{}", LASTNAME_PREFIX, id),
        DEFAULT_TOTAL_PRICE,
        true,
        BookingDates::new(
            offset(today, CHECKIN_OFFSET_DAYS),
            offset(today, CHECKOUT_OFFSET_DAYS),
        ),
        Some(DEFAULT_ADDITIONAL_NEEDS.to_string()),
    )
}

// Saturates at the end of the calendar instead of failing
fn offset(today: NaiveDate, days: u64) -> NaiveDate {
    today.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}
