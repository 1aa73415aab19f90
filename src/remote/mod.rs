//! Remote Backends
//!
//! Browser bindings of the gateway traits, and the choice between the hosted
//! store and the in-memory demo.

mod connectivity;
mod realtime;
mod rest;

use std::rc::Rc;

use log::{error, info};
use shopping_sync::gateway::{ChangeFeed, RemoteStore};
use shopping_sync::sync::{ConnectivityObserver, ManualConnectivity};
use shopping_sync::RemoteConfig;

pub use connectivity::BrowserConnectivity;
pub use realtime::RealtimeFeed;
pub use rest::PostgrestStore;

use crate::demo;

/// Everything the session layer talks to
#[derive(Clone)]
pub struct Backend {
    pub store: Rc<dyn RemoteStore>,
    pub feed: Rc<dyn ChangeFeed>,
    pub connectivity: Rc<dyn ConnectivityObserver>,
}

impl Backend {
    pub fn remote(config: RemoteConfig) -> Self {
        info!("Using hosted store at {}", config.url);
        Self {
            store: Rc::new(PostgrestStore::new(config.clone())),
            feed: Rc::new(RealtimeFeed::new(config)),
            connectivity: Rc::new(BrowserConnectivity),
        }
    }

    pub fn demo() -> Self {
        let store = Rc::new(demo::seeded_store());
        Self {
            store: store.clone(),
            feed: store,
            connectivity: Rc::new(ManualConnectivity::new(true)),
        }
    }
}

/// Pick the backend from the build-time settings
pub fn connect() -> Backend {
    let config = RemoteConfig::from_values(option_env!("SUPABASE_URL"), option_env!("SUPABASE_ANON_KEY"));
    match config {
        Ok(Some(config)) => Backend::remote(config),
        Ok(None) => {
            info!("No hosted store configured, running on demo data");
            Backend::demo()
        }
        Err(e) => {
            error!("{}; running on demo data", e);
            Backend::demo()
        }
    }
}
