//! Checkout form types and their field validation.
//!
//! Each field reports the first rule it breaks, using the message shown to
//! the shopper next to that field. Field keys are the camelCase names of the
//! serialised form.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::Error;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static PHONE_RE: OnceLock<Regex> = OnceLock::new();
static ZIP_RE: OnceLock<Regex> = OnceLock::new();
static CARD_NUMBER_RE: OnceLock<Regex> = OnceLock::new();
static EXPIRY_RE: OnceLock<Regex> = OnceLock::new();
static CVV_RE: OnceLock<Regex> = OnceLock::new();
static CARDHOLDER_RE: OnceLock<Regex> = OnceLock::new();

fn compiled(cell: &'static OnceLock<Regex>, name: &str, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| {
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("{name} regex failed to compile: {error}"))
    })
}

fn email_regex() -> &'static Regex {
    compiled(&EMAIL_RE, "email", r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
}

fn phone_regex() -> &'static Regex {
    compiled(&PHONE_RE, "phone", r"^\+?[1-9][0-9]{0,15}$")
}

fn zip_regex() -> &'static Regex {
    compiled(&ZIP_RE, "zip code", r"^[0-9]{5}(-[0-9]{4})?$")
}

fn card_number_regex() -> &'static Regex {
    compiled(&CARD_NUMBER_RE, "card number", r"^[0-9]{4} ?[0-9]{4} ?[0-9]{4} ?[0-9]{4}$")
}

fn expiry_regex() -> &'static Regex {
    compiled(&EXPIRY_RE, "expiry date", r"^(0[1-9]|1[0-2])/([0-9]{2})$")
}

fn cvv_regex() -> &'static Regex {
    compiled(&CVV_RE, "cvv", r"^[0-9]{3,4}$")
}

fn cardholder_regex() -> &'static Regex {
    compiled(&CARDHOLDER_RE, "cardholder name", r"^[a-zA-Z\s]+$")
}

/// Per-field validation messages keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Whether every field passed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Message recorded for the field.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Number of failing fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn check(&mut self, field: impl Into<String>, outcome: Result<(), &'static str>) {
        if let Err(message) = outcome {
            self.0.entry(field.into()).or_insert_with(|| message.to_owned());
        }
    }

    fn absorb(&mut self, prefix: &str, other: Self) {
        for (field, message) in other.0 {
            self.0.entry(format!("{prefix}.{field}")).or_insert(message);
        }
    }

    pub(crate) fn merge(&mut self, other: Self) {
        for (field, message) in other.0 {
            self.0.entry(field).or_insert(message);
        }
    }

    fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Convert into an invalid-request error carrying the fields as details.
    pub fn into_error(self) -> Error {
        Error::invalid_request("checkout details are invalid").with_details(json!({
            "fields": self,
        }))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

struct TextRule {
    required: &'static str,
    min: Option<(usize, &'static str)>,
    max: Option<(usize, &'static str)>,
    pattern: Option<(fn() -> &'static Regex, &'static str)>,
}

impl TextRule {
    fn required(message: &'static str) -> Self {
        Self {
            required: message,
            min: None,
            max: None,
            pattern: None,
        }
    }

    fn length(
        mut self,
        min: (usize, &'static str),
        max: (usize, &'static str),
    ) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    fn matching(mut self, regex: fn() -> &'static Regex, message: &'static str) -> Self {
        self.pattern = Some((regex, message));
        self
    }

    fn check(&self, value: &str) -> Result<(), &'static str> {
        if value.is_empty() {
            return Err(self.required);
        }
        let chars = value.chars().count();
        if let Some((_, message)) = self.min.filter(|(min, _)| chars < *min) {
            return Err(message);
        }
        if let Some((_, message)) = self.max.filter(|(max, _)| chars > *max) {
            return Err(message);
        }
        if let Some((_, message)) = self.pattern.filter(|(regex, _)| !regex().is_match(value)) {
            return Err(message);
        }
        Ok(())
    }
}

/// Shipping (and billing) address form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone number.
    pub phone: String,
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// State or region.
    pub state: String,
    /// US-style ZIP code.
    pub zip_code: String,
    /// Country.
    pub country: String,
}

impl ShippingInfo {
    /// Validate every field.
    ///
    /// # Errors
    ///
    /// Returns the failing fields with their messages.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check(
            "firstName",
            TextRule::required("First name is required")
                .length(
                    (2, "First name must be at least 2 characters"),
                    (50, "First name must be less than 50 characters"),
                )
                .check(&self.first_name),
        );
        errors.check(
            "lastName",
            TextRule::required("Last name is required")
                .length(
                    (2, "Last name must be at least 2 characters"),
                    (50, "Last name must be less than 50 characters"),
                )
                .check(&self.last_name),
        );
        errors.check(
            "email",
            TextRule::required("Email is required")
                .matching(email_regex, "Please enter a valid email address")
                .check(&self.email),
        );
        errors.check(
            "phone",
            TextRule::required("Phone number is required")
                .matching(phone_regex, "Please enter a valid phone number")
                .check(&self.phone),
        );
        errors.check(
            "address",
            TextRule::required("Address is required")
                .length(
                    (5, "Address must be at least 5 characters"),
                    (200, "Address must be less than 200 characters"),
                )
                .check(&self.address),
        );
        errors.check(
            "city",
            TextRule::required("City is required")
                .length(
                    (2, "City must be at least 2 characters"),
                    (50, "City must be less than 50 characters"),
                )
                .check(&self.city),
        );
        errors.check(
            "state",
            TextRule::required("State is required")
                .length(
                    (2, "State must be at least 2 characters"),
                    (50, "State must be less than 50 characters"),
                )
                .check(&self.state),
        );
        errors.check(
            "zipCode",
            TextRule::required("ZIP code is required")
                .matching(
                    zip_regex,
                    "Please enter a valid ZIP code (e.g., 12345 or 12345-6789)",
                )
                .check(&self.zip_code),
        );
        errors.check(
            "country",
            TextRule::required("Country is required").check(&self.country),
        );
        errors.into_result()
    }
}

/// Accepted payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Credit card.
    Credit,
    /// Debit card.
    Debit,
    /// PayPal account.
    Paypal,
}

impl PaymentMethod {
    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
            Self::Paypal => "paypal",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown payment method.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Please select a payment method")]
pub struct UnknownPaymentMethod;

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            "paypal" => Ok(Self::Paypal),
            _ => Err(UnknownPaymentMethod),
        }
    }
}

/// Payment form. The card number and CVV never leave checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    /// Selected method; `None` until the shopper picks one.
    pub payment_method: Option<PaymentMethod>,
    /// Sixteen digits, optionally grouped in fours by single spaces.
    pub card_number: String,
    /// `MM/YY`.
    pub expiry_date: String,
    /// Three or four digits.
    pub cvv: String,
    /// Name printed on the card.
    pub cardholder_name: String,
    /// Billing address; `None` when it matches the shipping address.
    #[serde(default)]
    pub billing_address: Option<ShippingInfo>,
}

impl PaymentInfo {
    /// Last four digits of the card number.
    pub fn card_last_four(&self) -> String {
        let digits: Vec<char> = self
            .card_number
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        digits[digits.len().saturating_sub(4)..].iter().collect()
    }

    /// Validate every field, judging card expiry against `today`.
    ///
    /// # Errors
    ///
    /// Returns the failing fields with their messages. Billing address
    /// failures are keyed as `billingAddress.<field>`.
    pub fn validate(&self, today: NaiveDate) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check(
            "paymentMethod",
            self.payment_method
                .map(|_| ())
                .ok_or("Please select a payment method"),
        );
        errors.check(
            "cardNumber",
            TextRule::required("Card number is required")
                .matching(card_number_regex, "Please enter a valid 16-digit card number")
                .check(&self.card_number),
        );
        errors.check(
            "expiryDate",
            TextRule::required("Expiry date is required")
                .matching(expiry_regex, "Please enter a valid expiry date (MM/YY)")
                .check(&self.expiry_date)
                .and_then(|()| check_not_expired(&self.expiry_date, today)),
        );
        errors.check(
            "cvv",
            TextRule::required("CVV is required")
                .matching(cvv_regex, "CVV must be 3 or 4 digits")
                .check(&self.cvv),
        );
        errors.check(
            "cardholderName",
            TextRule::required("Cardholder name is required")
                .length(
                    (2, "Cardholder name must be at least 2 characters"),
                    (100, "Cardholder name must be less than 100 characters"),
                )
                .matching(
                    cardholder_regex,
                    "Cardholder name can only contain letters and spaces",
                )
                .check(&self.cardholder_name),
        );
        if let Some(Err(billing)) = self.billing_address.as_ref().map(ShippingInfo::validate) {
            errors.absorb("billingAddress", billing);
        }
        errors.into_result()
    }
}

fn check_not_expired(expiry: &str, today: NaiveDate) -> Result<(), &'static str> {
    const EXPIRED: &str = "Card has expired";
    let Some(captures) = expiry_regex().captures(expiry) else {
        return Err(EXPIRED);
    };
    let parse = |index: usize| {
        captures
            .get(index)
            .and_then(|m| m.as_str().parse::<u32>().ok())
    };
    let (Some(month), Some(year)) = (parse(1), parse(2)) else {
        return Err(EXPIRED);
    };
    let current_year = u32::try_from(today.year().rem_euclid(100)).unwrap_or(0);
    let current_month = today.month();
    if year < current_year || (year == current_year && month < current_month) {
        return Err(EXPIRED);
    }
    Ok(())
}
