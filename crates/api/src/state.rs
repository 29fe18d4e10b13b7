/// Handler state, cloned into every request via `State<AppState>`.
///
/// Server settings are consumed while the router is built, so only the pool
/// lives here.
#[derive(Clone)]
pub struct AppState {
    pub pool: notes_db::DbPool,
}
