use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use platform_core::error::AppError;
use tokio::net::TcpListener;

use crate::build_router;
use crate::config::PlatformConfig;
use crate::services::{AccessControl, MongoDb, TokenService};

#[derive(Clone)]
pub struct AppState {
    pub config: PlatformConfig,
    pub db: MongoDb,
    pub tokens: TokenService,
    pub access: AccessControl,
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(config: PlatformConfig) -> Result<Self, AppError> {
        let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to MongoDB: {}", e);
                e
            })?;
        db.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            e
        })?;

        let tokens = TokenService::new(
            &config.jwt.secret,
            config.jwt.session_token_expiry_days,
        )?;
        let access = AccessControl::new(tokens.clone(), Arc::new(db.clone()));

        let state = AppState {
            config: config.clone(),
            db,
            tokens,
            access,
        };

        let app = build_router(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
