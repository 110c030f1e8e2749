pub mod download;
pub mod loader;

use log::debug;
use std::time::Duration;

use crate::models::{PrognosisSample, PrognosisSource};
pub use loader::PrognosisLoader;

/// Longest a single downloader run may take before it is killed
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Forecast data as seen by the control loop: refreshed and reloaded on demand
pub struct ForecastFeed {
    sources: Vec<PrognosisSource>,
    downloader: Option<String>,
    loader: PrognosisLoader,
}

impl ForecastFeed {
    /// Analysis uses the first source; all sources are refreshed
    pub fn new(
        sources: Vec<PrognosisSource>,
        items: usize,
        downloader: Option<String>,
    ) -> Result<Self, String> {
        let primary = sources
            .first()
            .cloned()
            .ok_or("No prognosis sources configured")?;
        Ok(ForecastFeed {
            sources,
            downloader,
            loader: PrognosisLoader::new(primary, items),
        })
    }

    /// Download new files (if a downloader is configured) and reload them
    pub async fn refresh(&mut self) -> &[PrognosisSample] {
        match &self.downloader {
            Some(downloader) => {
                download::refresh(downloader, &self.sources, DOWNLOAD_TIMEOUT).await;
            }
            None => debug!("No prognosis downloader configured, re-reading existing files"),
        }
        self.loader.update().await
    }
}
