pub mod auth;
pub mod database;
pub mod error;
pub mod giantbomb_models;
pub mod giantbomb_query;
pub mod models;
pub mod routes;
pub mod schema;

#[rocket_sync_db_pools::database("epiclist_db")]
pub struct DbConn(diesel::PgConnection);
