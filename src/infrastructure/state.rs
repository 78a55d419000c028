use std::sync::Arc;

use crate::infrastructure::{auth::JwtKeys, config::Config, repository::Repositories};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub repositories: Repositories,
    pub jwt_keys: JwtKeys,
}

impl AppState {
    pub fn new(config: Arc<Config>, repositories: Repositories) -> Self {
        let jwt_keys = JwtKeys::new(&config.auth.jwt_secret);
        Self {
            config,
            repositories,
            jwt_keys,
        }
    }
}
