//! Database models for the document cache table.

use diesel::prelude::*;

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(primary_key(collection_key))]
#[diesel(table_name = crate::schema::collections)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CollectionRowDB {
    pub collection_key: String,
    pub payload: String,
    pub updated_at: String,
}
