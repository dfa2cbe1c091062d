// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session registry: one orchestrator per browser session.

use crate::services::orchestrator::{Orchestrator, OrchestratorSettings};
use crate::services::WeatherServices;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const SESSION_ID_BYTES: usize = 16;

struct Session {
    orchestrator: Arc<Orchestrator>,
    last_access: Instant,
}

#[derive(Clone)]
pub struct SessionRegistry {
    services: WeatherServices,
    settings: OrchestratorSettings,
    idle_timeout: Duration,
    sessions: Arc<DashMap<String, Session>>,
    rng: SystemRandom,
}

impl SessionRegistry {
    pub fn new(
        services: WeatherServices,
        settings: OrchestratorSettings,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            services,
            settings,
            idle_timeout,
            sessions: Arc::new(DashMap::new()),
            rng: SystemRandom::new(),
        }
    }

    /// Create a session and return its id.
    pub fn create(&self) -> anyhow::Result<String> {
        let mut bytes = [0u8; SESSION_ID_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| anyhow::anyhow!("Failed to generate session id"))?;
        let id = URL_SAFE_NO_PAD.encode(bytes);

        let orchestrator = Orchestrator::new(self.services.clone(), self.settings);
        self.sessions.insert(
            id.clone(),
            Session {
                orchestrator: Arc::new(orchestrator),
                last_access: Instant::now(),
            },
        );
        tracing::debug!(sessions = self.sessions.len(), "Session created");
        Ok(id)
    }

    /// Look up a session, marking it as recently used.
    pub fn get(&self, id: &str) -> Option<Arc<Orchestrator>> {
        let mut session = self.sessions.get_mut(id)?;
        session.last_access = Instant::now();
        Some(Arc::clone(&session.orchestrator))
    }

    /// Remove a session and stop its background work.
    pub fn remove(&self, id: &str) -> bool {
        match self.sessions.remove(id) {
            Some((_, session)) => {
                session.orchestrator.shutdown();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop sessions idle longer than the timeout.
    pub fn sweep_idle(&self) -> usize {
        self.sweep_idle_at(Instant::now())
    }

    pub fn sweep_idle_at(&self, now: Instant) -> usize {
        let before = self.sessions.len();
        let idle_timeout = self.idle_timeout;
        self.sessions.retain(|_, session| {
            let keep = now.saturating_duration_since(session.last_access) <= idle_timeout;
            if !keep {
                session.orchestrator.shutdown();
            }
            keep
        });
        before.saturating_sub(self.sessions.len())
    }

    pub fn spawn_sweeper(
        &self,
        period: Duration,
        shutdown: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = registry.sweep_idle();
                        if removed > 0 {
                            tracing::info!(removed, "Swept idle sessions");
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn registry(idle: Duration) -> SessionRegistry {
        let services = WeatherServices::from_config(&Config::test_default()).unwrap();
        SessionRegistry::new(services, OrchestratorSettings::default(), idle)
    }

    #[tokio::test]
    async fn test_create_get_remove() {
        let registry = registry(Duration::from_secs(60));
        let id = registry.create().unwrap();
        assert_eq!(id.len(), 22);

        let orchestrator = registry.get(&id).unwrap();
        assert!(registry.remove(&id));
        assert!(orchestrator.is_shut_down());
        assert!(registry.get(&id).is_none());
        assert!(!registry.remove(&id));
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let registry = registry(Duration::from_secs(60));
        let a = registry.create().unwrap();
        let b = registry.create().unwrap();
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_idle_sessions_are_swept() {
        let registry = registry(Duration::from_secs(60));
        let stale = registry.create().unwrap();
        let orchestrator = registry.get(&stale).unwrap();

        let later = Instant::now() + Duration::from_secs(120);
        assert_eq!(registry.sweep_idle_at(later), 1);
        assert!(registry.is_empty());
        assert!(orchestrator.is_shut_down());
    }
}
