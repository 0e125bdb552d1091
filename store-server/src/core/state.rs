//! Server state - shared handles for all services
//!
//! `ServerState` is cloned into every handler; all members are cheap
//! shared references. Domain services are assembled on demand from the
//! database handle and the shared hub.

use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::JwtService;
use crate::chat::ChatService;
use crate::core::Config;
use crate::db::DbService;
use crate::db::repository::{ChatThreadRepository, OrderRepository, ProductRepository};
use crate::orders::{CheckoutService, OrderStatusService};
use crate::realtime::RealtimeHub;
use crate::services::{Mailer, PaymentGateway};
use crate::stock::StockLedger;
use crate::utils::AppError;

#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: Surreal<Db>,
    pub hub: Arc<RealtimeHub>,
    pub jwt: Arc<JwtService>,
    pub payments: Arc<PaymentGateway>,
    pub mailer: Arc<Mailer>,
}

impl ServerState {
    /// Initialize all services from configuration.
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        let db_service = match &config.data_dir {
            Some(dir) => DbService::open(dir).await?,
            None => {
                tracing::warn!("DATA_DIR not set, using in-memory database");
                DbService::memory().await?
            }
        };

        Ok(Self {
            config: config.clone(),
            db: db_service.db,
            hub: Arc::new(RealtimeHub::with_capacity(
                config.realtime_channel_capacity,
            )),
            jwt: Arc::new(JwtService::new(
                &config.jwt_secret,
                config.jwt_expiration_minutes,
            )),
            payments: Arc::new(PaymentGateway::from_config(config)),
            mailer: Arc::new(Mailer::from_config(config)),
        })
    }

    // ========== Domain service constructors ==========

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.db.clone())
    }

    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.db.clone())
    }

    pub fn stock(&self) -> StockLedger {
        StockLedger::new(self.products(), self.hub.clone())
    }

    pub fn order_status(&self) -> OrderStatusService {
        OrderStatusService::new(
            self.orders(),
            self.stock(),
            self.hub.clone(),
            self.mailer.clone(),
        )
    }

    pub fn checkout(&self) -> CheckoutService {
        CheckoutService::new(
            self.orders(),
            self.products(),
            self.payments.clone(),
            self.mailer.clone(),
            self.hub.clone(),
        )
    }

    pub fn chat(&self) -> ChatService {
        ChatService::new(ChatThreadRepository::new(self.db.clone()), self.hub.clone())
    }
}
