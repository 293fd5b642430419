use serde::{Deserialize, Deserializer};

pub mod category;
pub mod whitelist_item;

// Clients send `null` and `""` interchangeably for a row that has no id yet
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
