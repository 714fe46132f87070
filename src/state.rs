use crate::db::{DbPool, OrmConn, orm_from_pool};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
}

impl AppState {
    pub fn new(pool: DbPool) -> Self {
        let orm = orm_from_pool(pool.clone());
        Self { pool, orm }
    }
}
