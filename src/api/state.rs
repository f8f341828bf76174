use std::collections::HashMap;
use std::sync::Arc;

use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<AppStateInner>,
}

pub struct AppStateInner {
    pub store: Store,
    /// Asset address (lowercase) → fee factor for referral fee attribution.
    pub fee_factors: HashMap<String, f64>,
}

impl AppState {
    pub fn new(store: Store, fee_factors: HashMap<String, f64>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { store, fee_factors }),
        }
    }
}
