use std::sync::Arc;

use crate::application::catalog::CatalogServices;
use crate::application::repos::StoreHealth;

#[derive(Clone)]
pub struct ApiState {
    pub catalog: CatalogServices,
    pub health: Arc<dyn StoreHealth>,
}

impl ApiState {
    pub fn new(catalog: CatalogServices, health: Arc<dyn StoreHealth>) -> Self {
        Self { catalog, health }
    }
}
