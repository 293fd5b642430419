use diesel::{ExpressionMethods, QueryDsl, RunQueryDsl};

use crate::db::upsert::{self, UpsertRow};
use crate::db::{BindValue, BudgetLoader, DaoError, DbThreadPool, SqlExecutor};
use crate::messages::{BudgetChanges, BudgetView};
use crate::models::category::Category;
use crate::models::whitelist_item::WhiteListItem;
use crate::schema::categories as category_fields;
use crate::schema::categories::dsl::categories;
use crate::schema::whitelist as whitelist_fields;
use crate::schema::whitelist::dsl::whitelist;

impl UpsertRow for Category {
    const KIND: &'static str = "category";
    const TABLE: &'static str = "categories";
    const COLUMNS: &'static [&'static str] = &["name", "budget", "category_id"];
    const KEY_COLUMNS: &'static [&'static str] = &["name"];

    fn push_binds(&self, binds: &mut Vec<BindValue>) {
        binds.push(BindValue::Text(self.name.clone()));
        binds.push(BindValue::Double(self.budget));
        binds.push(BindValue::Text(self.id.clone()));
    }
}

impl UpsertRow for WhiteListItem {
    const KIND: &'static str = "whitelist";
    const TABLE: &'static str = "whitelist";
    const COLUMNS: &'static [&'static str] = &["category", "name", "item_id"];
    const KEY_COLUMNS: &'static [&'static str] = &["category", "name"];

    fn push_binds(&self, binds: &mut Vec<BindValue>) {
        binds.push(BindValue::Text(self.category.clone()));
        binds.push(BindValue::Text(self.name.clone()));
        binds.push(BindValue::Text(self.id.clone()));
    }
}

pub struct Dao<E: SqlExecutor = DbThreadPool> {
    executor: E,
}

impl<E: SqlExecutor + Clone> Dao<E> {
    pub fn new(executor: &E) -> Self {
        Self {
            executor: executor.clone(),
        }
    }
}

impl<E: SqlExecutor> Dao<E> {
    /// Applies the additions and edits in `changes` for `user_id`. Categories are written
    /// first; if that fails the whitelist is left untouched. The two writes are committed
    /// separately, so a whitelist failure does not undo the categories.
    pub fn update_budget(&self, user_id: &str, changes: &BudgetChanges) -> Result<(), DaoError> {
        upsert::upsert(&self.executor, user_id, &changes.categories)?;
        upsert::upsert(&self.executor, user_id, &changes.whitelist)?;

        Ok(())
    }
}

impl<E: SqlExecutor + BudgetLoader> Dao<E> {
    pub fn get_budget(&self, user_id: &str) -> Result<BudgetView, DaoError> {
        self.executor.load_budget(user_id)
    }
}

impl BudgetLoader for DbThreadPool {
    fn load_budget(&self, user_id: &str) -> Result<BudgetView, DaoError> {
        let mut db_connection = self.get()?;

        let budget = db_connection
            .build_transaction()
            .read_only()
            .run::<_, diesel::result::Error, _>(|conn| {
                let loaded_categories = categories
                    .select((
                        category_fields::name,
                        category_fields::budget,
                        category_fields::category_id,
                    ))
                    .filter(category_fields::user_id.eq(user_id))
                    .order(category_fields::name.asc())
                    .load::<Category>(conn)?;

                let loaded_whitelist = whitelist
                    .select((
                        whitelist_fields::category,
                        whitelist_fields::name,
                        whitelist_fields::item_id,
                    ))
                    .filter(whitelist_fields::user_id.eq(user_id))
                    .order((whitelist_fields::category.asc(), whitelist_fields::name.asc()))
                    .load::<WhiteListItem>(conn)?;

                Ok(BudgetView {
                    categories: loaded_categories,
                    whitelist: loaded_whitelist,
                })
            })?;

        Ok(budget)
    }
}
