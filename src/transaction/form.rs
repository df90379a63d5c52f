//! Parsing and validation of the transaction fields sent by clients.

use serde::Deserialize;
use serde_json::Value;

use crate::{
    Error,
    extract::non_empty,
    parse_date,
    category::{OTHER_CATEGORY_ID, get_category},
    transaction::{Amount, InvestmentType, TransactionBuilder, TransactionKind, TransactionType},
};

/// The fields of a transaction as sent by the client.
///
/// Every field is optional at this stage so that a missing field is
/// reported as [Error::MissingFields] instead of a malformed body.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionForm {
    /// The title, defaults to the category name.
    #[serde(alias = "title")]
    pub name: Option<String>,
    /// The category ID, defaults to the "other" category.
    #[serde(alias = "category")]
    pub category_id: Option<String>,
    /// The transaction type, defaults to the category's type.
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub investment_type: Option<String>,
    /// A JSON number or a numeric string.
    pub amount: Option<Value>,
    pub method: Option<String>,
    /// A date, e.g. "2024-03-05", or an RFC 3339 timestamp.
    pub date: Option<String>,
}

impl TransactionForm {
    /// Check the fields and turn them into a [TransactionBuilder].
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [Error::MissingFields] if the amount, date or method is missing, or
    ///   the type is missing and cannot be taken from the category,
    /// - [Error::InvalidCategory] if the category is not in the catalog,
    /// - [Error::CategoryTypeMismatch] if the category is meant for another type,
    /// - [Error::InvestmentTypeNotAllowed] if an investment type is given for
    ///   a transaction that is not an investment,
    /// - or the parse error of the offending field.
    pub fn validate(&self) -> Result<TransactionBuilder, Error> {
        let raw_amount = self.amount.as_ref().ok_or(Error::MissingFields)?;
        let raw_date = non_empty(self.date.as_deref()).ok_or(Error::MissingFields)?;
        let method = non_empty(self.method.as_deref()).ok_or(Error::MissingFields)?;

        let amount = Amount::from_json(raw_amount)?;
        let date = parse_date(raw_date)?;

        let category_id = non_empty(self.category_id.as_deref()).unwrap_or(OTHER_CATEGORY_ID);
        let category = get_category(category_id)
            .ok_or_else(|| Error::InvalidCategory(category_id.to_owned()))?;

        let transaction_type = match non_empty(self.transaction_type.as_deref()) {
            Some(raw_type) => raw_type.parse::<TransactionType>()?,
            None => category.affinity.ok_or(Error::MissingFields)?,
        };

        if !category.accepts(transaction_type) {
            return Err(Error::CategoryTypeMismatch {
                category: category.id.to_owned(),
                transaction_type,
            });
        }

        let investment_type = non_empty(self.investment_type.as_deref())
            .map(str::parse::<InvestmentType>)
            .transpose()?;
        let kind = TransactionKind::new(transaction_type, investment_type)?;

        let title = non_empty(self.name.as_deref()).unwrap_or(category.name);

        Ok(TransactionBuilder {
            title: title.to_owned(),
            amount,
            kind,
            method: method.to_owned(),
            category: Some(category.id.to_owned()),
            date,
        })
    }
}
