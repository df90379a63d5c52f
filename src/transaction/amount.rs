//! A positive amount of money.

use std::{fmt::Display, str::FromStr};

use rust_decimal::Decimal;
use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::Error;

/// The number of decimal places allowed in an amount, i.e. cents.
const MAX_DECIMAL_PLACES: u32 = 2;

/// An amount of money, always greater than zero.
///
/// Whether the money came in or went out is decided by the transaction type,
/// never by the sign of the amount. Amounts are stored as decimal text so
/// that sums are exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    /// The largest amount accepted, one quadrillion.
    ///
    /// Totals of many such amounts still fit in a [Decimal].
    pub const MAX: Amount = Amount(Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0));

    /// Create an amount from a decimal number.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidAmount] if `value` is zero or negative, is
    /// larger than [Amount::MAX], or has more than two decimal places.
    pub fn new(value: Decimal) -> Result<Self, Error> {
        let value = value.normalize();

        if value <= Decimal::ZERO || value > Self::MAX.0 || value.scale() > MAX_DECIMAL_PLACES {
            return Err(Error::InvalidAmount(value.to_string()));
        }

        Ok(Self(value))
    }

    /// Parse an amount sent as either a JSON number or a numeric string.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidAmount] if `value` is not a positive number.
    pub fn from_json(value: &Value) -> Result<Self, Error> {
        match value {
            Value::Number(number) => number.to_string().parse(),
            Value::String(string) => string.parse(),
            other => Err(Error::InvalidAmount(other.to_string())),
        }
    }

    /// The amount as a decimal number.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value = Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|_| Error::InvalidAmount(s.to_owned()))?;

        Amount::new(value)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_string()))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let decimal = match value {
            ValueRef::Text(_) => Decimal::from_str(value.as_str()?)
                .map_err(|error| FromSqlError::Other(Box::new(error)))?,
            ValueRef::Integer(integer) => Decimal::from(integer),
            ValueRef::Real(real) => {
                Decimal::try_from(real).map_err(|error| FromSqlError::Other(Box::new(error)))?
            }
            _ => return Err(FromSqlError::InvalidType),
        };

        Ok(Self(decimal))
    }
}
