// Request and response bodies exchanged with the booking service
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct BookingDates {
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
}

impl BookingDates {
    pub fn new(checkin: NaiveDate, checkout: NaiveDate) -> Self {
        Self { checkin, checkout }
    }

    // Not enforced anywhere; the service decides what it accepts
    pub fn is_ordered(&self) -> bool {
        self.checkin <= self.checkout
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BookingRequest {
    pub firstname: String,
    pub lastname: String,
    #[serde(rename = "totalprice")]
    pub total_price: i64,
    #[serde(rename = "depositpaid")]
    pub deposit_paid: bool,
    #[serde(rename = "bookingdates")]
    pub booking_dates: BookingDates,
    #[serde(
        rename = "additionalneeds",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_needs: Option<String>,
}

impl BookingRequest {
    pub fn new(
        firstname: impl Into<String>,
        lastname: impl Into<String>,
        total_price: i64,
        deposit_paid: bool,
        booking_dates: BookingDates,
        additional_needs: Option<String>,
    ) -> Self {
        Self {
            firstname: firstname.into(),
            lastname: lastname.into(),
            total_price,
            deposit_paid,
            booking_dates,
            additional_needs,
        }
    }
}

// State of a booking as stored and returned by the service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Booking {
    pub firstname: String,
    pub lastname: String,
    #[serde(rename = "totalprice")]
    pub total_price: i64,
    #[serde(rename = "depositpaid")]
    pub deposit_paid: bool,
    #[serde(rename = "bookingdates")]
    pub booking_dates: BookingDates,
    #[serde(
        rename = "additionalneeds",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_needs: Option<String>,
}

impl From<BookingRequest> for Booking {
    fn from(item: BookingRequest) -> Self {
        Self {
            firstname: item.firstname,
            lastname: item.lastname,
            total_price: item.total_price,
            deposit_paid: item.deposit_paid,
            booking_dates: item.booking_dates,
            additional_needs: item.additional_needs,
        }
    }
}

impl From<Booking> for BookingRequest {
    fn from(item: Booking) -> Self {
        Self {
            firstname: item.firstname,
            lastname: item.lastname,
            total_price: item.total_price,
            deposit_paid: item.deposit_paid,
            booking_dates: item.booking_dates,
            additional_needs: item.additional_needs,
        }
    }
}

impl PartialEq<BookingRequest> for Booking {
    fn eq(&self, other: &BookingRequest) -> bool {
        self.firstname == other.firstname
            && self.lastname == other.lastname
            && self.total_price == other.total_price
            && self.deposit_paid == other.deposit_paid
            && self.booking_dates == other.booking_dates
            && self.additional_needs == other.additional_needs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BookingResponse {
    #[serde(rename = "bookingid")]
    pub booking_id: u64,
    pub booking: Booking,
}

impl BookingResponse {
    pub fn new(booking_id: u64, booking: Booking) -> Self {
        Self {
            booking_id,
            booking,
        }
    }
}

// One entry of the GET /booking listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct BookingId {
    #[serde(rename = "bookingid")]
    pub booking_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthRequest {
    pub username: String,
    pub password: String,
}

impl AuthRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthResponse {
    pub token: String,
}

// Body the service sends instead of a token when it refuses the credentials
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthRejection {
    pub reason: String,
}

// Query parameters accepted by GET /booking
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub checkin: Option<NaiveDate>,
    pub checkout: Option<NaiveDate>,
}

impl BookingFilter {
    pub fn by_name(firstname: impl Into<String>, lastname: impl Into<String>) -> Self {
        Self {
            firstname: Some(firstname.into()),
            lastname: Some(lastname.into()),
            ..Default::default()
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(firstname) = &self.firstname {
            pairs.push(("firstname", firstname.clone()));
        }
        if let Some(lastname) = &self.lastname {
            pairs.push(("lastname", lastname.clone()));
        }
        if let Some(checkin) = self.checkin {
            pairs.push(("checkin", checkin.format(DATE_FORMAT).to_string()));
        }
        if let Some(checkout) = self.checkout {
            pairs.push(("checkout", checkout.format(DATE_FORMAT).to_string()));
        }
        pairs
    }

    // Whether a stored booking passes this filter, using the service's rules:
    // names match exactly, checkin/checkout are inclusive lower/upper bounds
    pub fn matches(&self, booking: &Booking) -> bool {
        if !self
            .firstname
            .as_ref()
            .map_or(true, |name| &booking.firstname == name)
        {
            return false;
        }

        if !self
            .lastname
            .as_ref()
            .map_or(true, |name| &booking.lastname == name)
        {
            return false;
        }

        if !self
            .checkin
            .map_or(true, |date| booking.booking_dates.checkin >= date)
        {
            return false;
        }

        self.checkout
            .map_or(true, |date| booking.booking_dates.checkout <= date)
    }
}

pub const DATE_FORMAT: &str = "%Y-%m-%d";
