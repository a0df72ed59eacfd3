use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::router::AppState;
use crate::application::{
    file_security::FileUploadValidator,
    ports::{Clock, RateLimitBackend, SlidingWindowClient},
    rate_limiting::RateLimiter,
    sanitization::FormDataValidator,
    scheduler::PeriodicSweeper,
};
use crate::config::Config;
use crate::domain::value_objects::RateLimitPolicies;
use crate::infrastructure::{
    clock::SystemClock,
    rate_limit::{DistributedRateLimitBackend, MemoryRateLimitBackend},
};

/// Wired application: HTTP state plus the handles the binary manages
pub struct Application {
    pub state: AppState,
    pub memory_backend: MemoryRateLimitBackend,
    config: Config,
}

impl Application {
    /// Start the background purge if one is configured
    pub fn spawn_sweeper(&self, shutdown: CancellationToken) -> Option<JoinHandle<()>> {
        if self.config.rate_limit_sweep_interval_secs == 0 {
            return None;
        }
        let backend = self.memory_backend.clone();
        let sweeper = PeriodicSweeper::new(
            Duration::from_secs(self.config.rate_limit_sweep_interval_secs),
            "rate_limit_purge",
        );
        Some(sweeper.spawn(shutdown, move || backend.purge_expired()))
    }
}

/// Application builder for dependency injection and setup
pub struct ApplicationBuilder {
    config: Config,
    clock: Option<Arc<dyn Clock>>,
    policies: RateLimitPolicies,
    sliding_window: Option<Arc<dyn SlidingWindowClient>>,
}

impl ApplicationBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            clock: None,
            policies: RateLimitPolicies::default(),
            sliding_window: None,
        }
    }

    /// Replace the wall clock, e.g. with a manual clock in tests
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_policies(mut self, policies: RateLimitPolicies) -> Self {
        self.policies = policies;
        self
    }

    /// Use an external sliding-window limiter as the primary backend
    pub fn with_sliding_window_client(mut self, client: Arc<dyn SlidingWindowClient>) -> Self {
        self.sliding_window = Some(client);
        self
    }

    pub fn build(self) -> Result<Application, String> {
        self.config.validate()?;

        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let memory_backend =
            MemoryRateLimitBackend::new(self.policies.clone(), Arc::clone(&clock));

        let mut rate_limiter = RateLimiter::local(
            Arc::new(memory_backend.clone()) as Arc<dyn RateLimitBackend>,
            self.config.environment,
        )
        .with_policies(self.policies);
        match self.sliding_window {
            Some(client) if !self.config.disable_distributed_rate_limit => {
                rate_limiter =
                    rate_limiter.with_primary(Arc::new(DistributedRateLimitBackend::new(client)));
            }
            Some(_) => info!("Distributed rate limiting disabled by configuration"),
            None => info!("No distributed rate limiter configured, counting in memory"),
        }
        info!(
            backend = rate_limiter.active_backend(),
            environment = %self.config.environment,
            "Rate limiter initialized"
        );

        let state = AppState {
            rate_limiter: Arc::new(rate_limiter),
            form_validator: Arc::new(FormDataValidator::new(self.config.sanitization_config())),
            upload_validator: Arc::new(FileUploadValidator::new(Arc::clone(&clock))),
            file_config: Arc::new(self.config.file_validation_config()),
            clock,
            max_body_size: self.config.max_body_size(),
        };

        Ok(Application {
            state,
            memory_backend,
            config: self.config,
        })
    }
}
