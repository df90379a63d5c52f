//! The catalog of categories a transaction can be filed under.
//!
//! Categories are defined in code rather than in the database. Transactions
//! store the category ID as plain text and look up the display details here.

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::{Error, extract::AppQuery, transaction::TransactionType};

/// The ID of the category that can be used with any transaction type.
pub const OTHER_CATEGORY_ID: &str = "other";

/// The emoji shown for transactions whose category is not in the catalog.
const FALLBACK_EMOJI: &str = "📝";

/// A category for grouping transactions, e.g. rent or salary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    /// The stable identifier stored on transactions.
    pub id: &'static str,
    /// The name shown to users.
    pub name: &'static str,
    /// A single emoji used as the category's icon.
    pub emoji: &'static str,
    /// A short explanation of what belongs in the category.
    pub description: &'static str,
    /// The transaction type the category is meant for, or `None` if the
    /// category fits every type.
    #[serde(rename = "type")]
    pub affinity: Option<TransactionType>,
}

impl Category {
    /// Whether the category can be used for a transaction of `transaction_type`.
    pub fn accepts(&self, transaction_type: TransactionType) -> bool {
        self.affinity
            .is_none_or(|affinity| affinity == transaction_type)
    }
}

/// Every category, in the order they are shown to users.
pub const CATEGORIES: [Category; 8] = [
    Category {
        id: "salary",
        name: "Salário",
        emoji: "💰",
        description: "Monthly pay from an employer",
        affinity: Some(TransactionType::Income),
    },
    Category {
        id: "freelancing",
        name: "Freelancing",
        emoji: "💼",
        description: "Income from freelance and side projects",
        affinity: Some(TransactionType::Income),
    },
    Category {
        id: "rent",
        name: "Aluguel",
        emoji: "🏠",
        description: "Rent and housing costs",
        affinity: Some(TransactionType::Expense),
    },
    Category {
        id: "market",
        name: "Mercado",
        emoji: "🛒",
        description: "Groceries and supermarket purchases",
        affinity: Some(TransactionType::Expense),
    },
    Category {
        id: "uber",
        name: "Uber",
        emoji: "🚗",
        description: "Rides and transport",
        affinity: Some(TransactionType::Expense),
    },
    Category {
        id: "bitcoin",
        name: "Bitcoin",
        emoji: "₿",
        description: "Bitcoin and other cryptocurrencies",
        affinity: Some(TransactionType::Investment),
    },
    Category {
        id: "cdb",
        name: "CDB",
        emoji: "📈",
        description: "Bank certificates of deposit",
        affinity: Some(TransactionType::Investment),
    },
    Category {
        id: OTHER_CATEGORY_ID,
        name: "Outro",
        emoji: FALLBACK_EMOJI,
        description: "Anything that does not fit another category",
        affinity: None,
    },
];

/// Find the category with the ID `id`.
pub fn get_category(id: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|category| category.id == id)
}

/// The categories that can be used with `transaction_type`, in catalog order.
///
/// Includes the categories that fit every type.
pub fn list_categories_by_type(transaction_type: TransactionType) -> Vec<&'static Category> {
    CATEGORIES
        .iter()
        .filter(|category| category.accepts(transaction_type))
        .collect()
}

/// How a category ID is shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryDisplay {
    /// The category ID as stored on the transaction.
    pub id: String,
    /// The category name, or the raw ID for unknown categories.
    pub name: String,
    /// The category emoji, or a generic emoji for unknown categories.
    pub emoji: &'static str,
}

impl CategoryDisplay {
    /// Resolve the display details of the category `id`.
    ///
    /// This never fails: IDs that are not in the catalog, e.g. from
    /// categories that have since been removed, get a generic emoji and
    /// their raw ID as the name.
    pub fn new(id: &str) -> Self {
        match get_category(id) {
            Some(category) => Self {
                id: category.id.to_owned(),
                name: category.name.to_owned(),
                emoji: category.emoji,
            },
            None => Self {
                id: id.to_owned(),
                name: id.to_owned(),
                emoji: FALLBACK_EMOJI,
            },
        }
    }
}

/// The query parameters for listing categories.
#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    /// Only list the categories usable with this transaction type.
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
}

/// Handler for listing the category catalog.
///
/// # Errors
///
/// Returns [Error::InvalidTransactionType] if the `type` filter is not a transaction type.
pub async fn get_categories(
    AppQuery(query): AppQuery<CategoryQuery>,
) -> Result<Json<Vec<&'static Category>>, Error> {
    let categories = match query.transaction_type.as_deref() {
        Some(raw_type) => list_categories_by_type(raw_type.parse()?),
        None => CATEGORIES.iter().collect(),
    };

    Ok(Json(categories))
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, routing::get};
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::{
        category::{
            CATEGORIES, CategoryDisplay, get_categories, get_category, list_categories_by_type,
        },
        endpoints,
        transaction::TransactionType,
    };

    #[test]
    fn ids_are_unique() {
        for (i, category) in CATEGORIES.iter().enumerate() {
            assert!(
                CATEGORIES[i + 1..].iter().all(|other| other.id != category.id),
                "duplicate category ID {}",
                category.id
            );
        }
    }

    #[test]
    fn get_known_category() {
        let category = get_category("market").unwrap();

        assert_eq!(category.name, "Mercado");
        assert_eq!(category.emoji, "🛒");
        assert_eq!(category.affinity, Some(TransactionType::Expense));
    }

    #[test]
    fn get_unknown_category() {
        assert_eq!(get_category("zzz"), None);
        assert_eq!(get_category(""), None);
    }

    #[test]
    fn list_by_type_includes_other_in_catalog_order() {
        let ids: Vec<_> = list_categories_by_type(TransactionType::Expense)
            .into_iter()
            .map(|category| category.id)
            .collect();

        assert_eq!(ids, vec!["rent", "market", "uber", "other"]);
    }

    #[test]
    fn every_type_has_a_category() {
        for transaction_type in TransactionType::ALL {
            assert!(!list_categories_by_type(transaction_type).is_empty());
        }
    }

    #[test]
    fn other_accepts_every_type() {
        let other = get_category("other").unwrap();

        for transaction_type in TransactionType::ALL {
            assert!(other.accepts(transaction_type));
        }
        assert!(!get_category("rent").unwrap().accepts(TransactionType::Income));
    }

    #[test]
    fn display_falls_back_for_unknown_ids() {
        let display = CategoryDisplay::new("gifts");

        assert_eq!(display.name, "gifts");
        assert_eq!(display.id, "gifts");
        assert_eq!(display.emoji, "📝");
    }

    #[test]
    fn display_uses_catalog_details() {
        let display = CategoryDisplay::new("salary");

        assert_eq!(display.name, "Salário");
        assert_eq!(display.emoji, "💰");
    }

    fn get_test_server() -> TestServer {
        let app = Router::new().route(endpoints::CATEGORIES, get(get_categories));

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn get_categories_returns_catalog() {
        let server = get_test_server();

        let response = server.get(endpoints::CATEGORIES).await;

        response.assert_status_ok();
        let body: Vec<Value> = response.json();
        assert_eq!(body.len(), CATEGORIES.len());
        assert_eq!(
            body[0],
            json!({
                "id": "salary",
                "name": "Salário",
                "emoji": "💰",
                "description": "Monthly pay from an employer",
                "type": "income",
            })
        );
        assert_eq!(body[7]["type"], Value::Null);
    }

    #[tokio::test]
    async fn get_categories_filters_by_type() {
        let server = get_test_server();

        let response = server
            .get(endpoints::CATEGORIES)
            .add_query_param("type", "investment")
            .await;

        response.assert_status_ok();
        let ids: Vec<String> = response
            .json::<Vec<Value>>()
            .iter()
            .map(|category| category["id"].as_str().unwrap().to_owned())
            .collect();
        assert_eq!(ids, vec!["bitcoin", "cdb", "other"]);
    }

    #[tokio::test]
    async fn get_categories_rejects_unknown_type() {
        let server = get_test_server();

        server
            .get(endpoints::CATEGORIES)
            .add_query_param("type", "gift")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
