//! Strongly-typed value types with validation for domain primitives.
//!
//! - [`NationalId`]: exactly ten ASCII digits
//! - [`Grade`]: a score in `[0, 100]`, kept to two decimal places
//! - [`AttachmentName`]: a reference to an uploaded PDF or ZIP file
//!
//! Each type validates on construction and on deserialization, and trusts
//! values coming back from the database.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize, Serializer};
use sqlx::{
    Database, Decode, Encode, Type,
    postgres::{PgHasArrayType, PgTypeInfo},
};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use classbook_core::Rejection;

/// Error type for value type parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueTypeError {
    InvalidNationalId(String),
    InvalidGrade(String),
    InvalidAttachment(String),
    InvalidRole(String),
}

impl std::error::Error for ValueTypeError {}

impl fmt::Display for ValueTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidNationalId(msg)
            | Self::InvalidGrade(msg)
            | Self::InvalidAttachment(msg)
            | Self::InvalidRole(msg) => write!(f, "{}", msg),
        }
    }
}

impl From<ValueTypeError> for Rejection {
    fn from(err: ValueTypeError) -> Self {
        Rejection::Validation(err.to_string())
    }
}

// ============================================================================
// NationalId
// ============================================================================

/// A national identification number: exactly ten ASCII digits.
///
/// ```ignore
/// use classbook_models::value_types::NationalId;
///
/// let id: NationalId = "0012345678".parse().unwrap();
/// assert!("12345".parse::<NationalId>().is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[schema(value_type = String, example = "0012345678")]
pub struct NationalId(String);

impl NationalId {
    pub const LENGTH: usize = 10;

    pub fn new(value: impl Into<String>) -> Result<Self, ValueTypeError> {
        let value = value.into();
        Self::validate(&value)?;
        Ok(Self(value))
    }

    /// Wrap a value without validation. Only for values read back from storage.
    #[inline]
    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(value: &str) -> Result<(), ValueTypeError> {
        if value.chars().count() != Self::LENGTH {
            return Err(ValueTypeError::InvalidNationalId(
                "National id must be 10 digits".into(),
            ));
        }

        if !value.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValueTypeError::InvalidNationalId(
                "National id must contain only numbers".into(),
            ));
        }

        Ok(())
    }
}

impl fmt::Debug for NationalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NationalId({})", self.0)
    }
}

impl fmt::Display for NationalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NationalId {
    type Err = ValueTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Type<sqlx::Postgres> for NationalId {
    fn type_info() -> PgTypeInfo {
        <String as Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <String as Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'q> Encode<'q, sqlx::Postgres> for NationalId {
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> Decode<'r, sqlx::Postgres> for NationalId {
    fn decode(
        value: <sqlx::Postgres as Database>::ValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as Decode<'r, sqlx::Postgres>>::decode(value)?;
        Ok(Self::new_unchecked(s))
    }
}

impl<'de> Deserialize<'de> for NationalId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Grade
// ============================================================================

/// A solution grade in `[0, 100]`, rounded half away from zero to two
/// decimal places. Stored as `NUMERIC(5,2)`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ToSchema)]
#[schema(value_type = f64, example = 80.0)]
pub struct Grade(Decimal);

impl Grade {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 100.0;

    pub fn new(value: f64) -> Result<Self, ValueTypeError> {
        if !value.is_finite() {
            return Err(ValueTypeError::InvalidGrade(
                "The grade must be a number.".into(),
            ));
        }
        if value > Self::MAX {
            return Err(ValueTypeError::InvalidGrade(
                "The grade must not be greater than 100.".into(),
            ));
        }
        if value < Self::MIN {
            return Err(ValueTypeError::InvalidGrade(
                "The grade must not be negative.".into(),
            ));
        }

        let exact = Decimal::from_f64(value).ok_or_else(|| {
            ValueTypeError::InvalidGrade("The grade must be a number.".into())
        })?;
        Ok(Self(exact.round_dp_with_strategy(
            2,
            RoundingStrategy::MidpointAwayFromZero,
        )))
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }

    #[inline]
    pub fn as_decimal(self) -> Decimal {
        self.0
    }
}

impl fmt::Debug for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Grade({:.2})", self.0)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Type<sqlx::Postgres> for Grade {
    fn type_info() -> PgTypeInfo {
        <Decimal as Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <Decimal as Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'q> Encode<'q, sqlx::Postgres> for Grade {
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> Decode<'r, sqlx::Postgres> for Grade {
    fn decode(
        value: <sqlx::Postgres as Database>::ValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        <Decimal as Decode<'r, sqlx::Postgres>>::decode(value).map(Self)
    }
}

/// Serialized as a JSON number.
impl Serialize for Grade {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.value())
    }
}

impl<'de> Deserialize<'de> for Grade {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// AttachmentName
// ============================================================================

/// Reference to an uploaded file. Only PDF and ZIP uploads are accepted.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[schema(value_type = String, example = "answers/week-3.pdf")]
pub struct AttachmentName(String);

impl AttachmentName {
    const ALLOWED_EXTENSIONS: [&'static str; 2] = ["pdf", "zip"];

    pub fn new(value: impl Into<String>) -> Result<Self, ValueTypeError> {
        let value = value.into();
        let extension = std::path::Path::new(&value)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension {
            Some(ext) if Self::ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(Self(value)),
            _ => Err(ValueTypeError::InvalidAttachment(
                "You should upload PDF or ZIP file.".into(),
            )),
        }
    }

    #[inline]
    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AttachmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttachmentName({})", self.0)
    }
}

impl fmt::Display for AttachmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Type<sqlx::Postgres> for AttachmentName {
    fn type_info() -> PgTypeInfo {
        <String as Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <String as Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'q> Encode<'q, sqlx::Postgres> for AttachmentName {
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> Decode<'r, sqlx::Postgres> for AttachmentName {
    fn decode(
        value: <sqlx::Postgres as Database>::ValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as Decode<'r, sqlx::Postgres>>::decode(value)?;
        Ok(Self::new_unchecked(s))
    }
}

impl PgHasArrayType for AttachmentName {
    fn array_type_info() -> PgTypeInfo {
        <String as PgHasArrayType>::array_type_info()
    }
}

impl<'de> Deserialize<'de> for AttachmentName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}
