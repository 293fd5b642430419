use diesel::Queryable;
use serde::{Deserialize, Serialize};

/// A merchant allowed under a category. `category` is the category's name, not its id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Queryable)]
pub struct WhiteListItem {
    pub category: String,
    pub name: String,
    #[serde(default, deserialize_with = "super::null_as_empty")]
    pub id: String,
}
