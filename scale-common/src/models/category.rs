use diesel::Queryable;
use serde::{Deserialize, Serialize};

/// A budgeted spending category. An empty `id` asks the server to create the category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Queryable)]
pub struct Category {
    pub name: String,
    pub budget: f64,
    #[serde(default, deserialize_with = "super::null_as_empty")]
    pub id: String,
}
