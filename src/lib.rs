use std::sync::Arc;

use api::ApiClient;
use cache::LocalStore;
use config::Config;
use error::AppResult;
use qr::QrGenerator;
use report::{CommandPrinter, DirectoryShare, HtmlPrinter, PrintToFile, ReportGenerator};
use roster::RosterService;
use scan::PresenceConfirmer;
use schedule::{ScheduleCache, SyncScheduler};
use session::SessionStore;

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod navigation;
pub mod qr;
pub mod report;
pub mod roster;
pub mod scan;
pub mod schedule;
pub mod session;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: LocalStore,
    pub api: ApiClient,
    pub session: Arc<SessionStore>,
    pub schedule: Arc<ScheduleCache>,
}

impl AppState {
    /// Opens the on-device store and restores the persisted session.
    pub async fn init(config: Config) -> AppResult<Self> {
        let store = LocalStore::open(&config.database_path()).await?;
        let api = ApiClient::new(&config)?;
        Self::assemble(config, store, api).await
    }

    /// Same as `init` with an already built store and client.
    pub async fn assemble(config: Config, store: LocalStore, api: ApiClient) -> AppResult<Self> {
        let session = Arc::new(SessionStore::new(api.clone(), store.clone()));
        session.restore().await?;
        let schedule = Arc::new(ScheduleCache::new(api.clone(), store.clone()));
        schedule.load().await?;
        Ok(Self {
            config,
            store,
            api,
            session,
            schedule,
        })
    }

    pub fn confirmer(&self) -> PresenceConfirmer {
        PresenceConfirmer::new(self.api.clone(), self.session.clone(), self.schedule.clone())
    }

    pub fn qr_generator(&self) -> QrGenerator {
        QrGenerator::new(self.api.clone(), self.session.clone(), self.schedule.clone())
    }

    pub fn roster(&self) -> RosterService {
        RosterService::new(
            self.api.clone(),
            self.session.clone(),
            Arc::new(self.qr_generator()),
        )
    }

    /// Report generator printing through the configured command, or to plain HTML.
    pub fn reports(&self, html_only: bool, share_dir: std::path::PathBuf) -> ReportGenerator {
        let printer: Box<dyn PrintToFile> = match (&self.config.pdf_command, html_only) {
            (Some(command), false) => Box::new(CommandPrinter::new(command.clone())),
            _ => Box::new(HtmlPrinter),
        };
        ReportGenerator::new(
            self.api.clone(),
            self.session.clone(),
            printer,
            Box::new(DirectoryShare::new(share_dir)),
            self.config.reports_dir(),
        )
    }

    pub fn sync_scheduler(&self) -> SyncScheduler {
        SyncScheduler::new(
            self.schedule.clone(),
            self.session.clone(),
            self.config.sync_interval(),
        )
    }
}
