//! The type of a transaction and, for investments, the kind of asset.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Whether money was earned, spent or invested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money earned, e.g. a salary.
    Income,
    /// Money spent, e.g. rent.
    Expense,
    /// Money put aside in an investment, e.g. bitcoin.
    Investment,
}

impl TransactionType {
    /// All transaction types, in the order they are shown to users.
    pub const ALL: [TransactionType; 3] = [
        TransactionType::Income,
        TransactionType::Expense,
        TransactionType::Investment,
    ];

    /// The lowercase name used in requests and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
            TransactionType::Investment => "investment",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionType::ALL
            .into_iter()
            .find(|transaction_type| transaction_type.as_str() == s)
            .ok_or_else(|| Error::InvalidTransactionType(s.to_owned()))
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// The kind of asset an investment was made in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestmentType {
    /// Domestic fixed income or funds.
    National,
    /// Assets held abroad.
    International,
    /// Cryptocurrencies.
    Crypto,
    /// Shares listed on a stock exchange.
    Stocks,
    /// Property and real estate funds.
    RealEstate,
}

impl InvestmentType {
    const ALL: [InvestmentType; 5] = [
        InvestmentType::National,
        InvestmentType::International,
        InvestmentType::Crypto,
        InvestmentType::Stocks,
        InvestmentType::RealEstate,
    ];

    /// The lowercase name used in requests and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestmentType::National => "national",
            InvestmentType::International => "international",
            InvestmentType::Crypto => "crypto",
            InvestmentType::Stocks => "stocks",
            InvestmentType::RealEstate => "realestate",
        }
    }
}

impl FromStr for InvestmentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InvestmentType::ALL
            .into_iter()
            .find(|investment_type| investment_type.as_str() == s)
            .ok_or_else(|| Error::InvalidInvestmentType(s.to_owned()))
    }
}

impl ToSql for InvestmentType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for InvestmentType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// The type of a transaction together with the details that only apply to that type.
///
/// Serialises as `{"type": "investment", "investmentType": "crypto"}` so that
/// it can be flattened into [crate::Transaction].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
    /// Money invested.
    Investment {
        /// The kind of asset, if the user chose one.
        #[serde(rename = "investmentType", skip_serializing_if = "Option::is_none")]
        investment_type: Option<InvestmentType>,
    },
}

impl TransactionKind {
    /// Combine a transaction type with an optional investment type.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvestmentTypeNotAllowed] if `investment_type` is set
    /// for a transaction that is not an investment.
    pub fn new(
        transaction_type: TransactionType,
        investment_type: Option<InvestmentType>,
    ) -> Result<Self, Error> {
        match (transaction_type, investment_type) {
            (TransactionType::Income, None) => Ok(TransactionKind::Income),
            (TransactionType::Expense, None) => Ok(TransactionKind::Expense),
            (TransactionType::Investment, investment_type) => {
                Ok(TransactionKind::Investment { investment_type })
            }
            (_, Some(_)) => Err(Error::InvestmentTypeNotAllowed),
        }
    }

    /// The type without any of the type specific details.
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            TransactionKind::Income => TransactionType::Income,
            TransactionKind::Expense => TransactionType::Expense,
            TransactionKind::Investment { .. } => TransactionType::Investment,
        }
    }

    /// The kind of asset for investments, `None` for every other type.
    pub fn investment_type(&self) -> Option<InvestmentType> {
        match self {
            TransactionKind::Investment { investment_type } => *investment_type,
            _ => None,
        }
    }
}
