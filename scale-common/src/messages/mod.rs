use serde::{Deserialize, Serialize};

use crate::models::category::Category;
use crate::models::whitelist_item::WhiteListItem;

/// One direction of a change-set. Either list may be omitted by the client.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetChanges {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub whitelist: Vec<WhiteListItem>,
}

impl BudgetChanges {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.whitelist.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequest {
    #[serde(default, rename = "change")]
    pub update: BudgetChanges,
    // Accepted for compatibility with clients, but removals are not applied yet
    #[serde(default)]
    pub remove: BudgetChanges,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetView {
    pub categories: Vec<Category>,
    pub whitelist: Vec<WhiteListItem>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Success,
    Unauthenticated,
    Persistence,
    InternalError,
}

/// The envelope every endpoint responds with. `status` is zero on success and the HTTP
/// status code otherwise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerResponse<T> {
    pub status: u16,
    pub message: String,
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
}

impl<T> ServerResponse<T> {
    pub fn success(message: &str, result: Option<T>) -> Self {
        Self {
            status: 0,
            message: String::from(message),
            response_type: ResponseType::Success,
            result,
        }
    }
}

impl ServerResponse<()> {
    pub fn error(status: u16, message: &str, response_type: ResponseType) -> Self {
        Self {
            status,
            message: String::from(message),
            response_type,
            result: None,
        }
    }
}
