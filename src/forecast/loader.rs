/// Loading of downloaded prognosis files into samples
use log::{debug, warn};
use std::path::Path;
use tokio::fs;

use crate::models::{PrognosisSample, PrognosisSource};

/// Reads `<file_path><file_name><i>` for each forecast item of one source
#[derive(Debug, Clone)]
pub struct PrognosisLoader {
    source: PrognosisSource,
    items: usize,
    data: Vec<PrognosisSample>,
}

/// Result of checking that the storage directory and all item files exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Integrity {
    pub dir_exists: bool,
    pub files_present: Vec<bool>,
}

impl Integrity {
    pub fn passed(&self) -> bool {
        self.dir_exists && self.files_present.iter().all(|present| *present)
    }
}

impl PrognosisLoader {
    pub fn new(source: PrognosisSource, items: usize) -> Self {
        PrognosisLoader {
            source,
            items,
            data: Vec::new(),
        }
    }

    fn item_path(&self, index: usize) -> String {
        format!("{}{}{}", self.source.file_path, self.source.file_name, index)
    }

    pub async fn self_check(&self) -> Integrity {
        let dir_exists = fs::metadata(&self.source.file_path).await.is_ok();
        let mut files_present = Vec::with_capacity(self.items);

        for index in 0..self.items {
            let present = dir_exists && fs::metadata(self.item_path(index)).await.is_ok();
            files_present.push(present);
        }

        Integrity {
            dir_exists,
            files_present,
        }
    }

    /// Reload every item, substituting the fallback sample where a file is missing or corrupt
    pub async fn update(&mut self) -> &[PrognosisSample] {
        let integrity = self.self_check().await;
        if !integrity.passed() {
            warn!(
                "Prognosis data integrity check failed for {} (directory present: {}, {}/{} files)",
                self.source.file_path,
                integrity.dir_exists,
                integrity.files_present.iter().filter(|p| **p).count(),
                self.items
            );
        }

        let mut data = Vec::with_capacity(self.items);
        for (index, present) in integrity.files_present.iter().enumerate() {
            let sample = if *present {
                load_file(Path::new(&self.item_path(index))).await
            } else {
                None
            };
            data.push(sample.unwrap_or_else(PrognosisSample::fallback));
        }

        self.data = data;
        &self.data
    }
}

/// Parse the five-line file format: validity, wind direction, wind speed, temperature, pressure
pub fn parse_sample(contents: &str) -> Option<PrognosisSample> {
    let mut lines = contents.lines().map(str::trim);
    let valid = lines.next()?.to_string();
    let mut number = || lines.next().and_then(|line| line.parse::<f32>().ok());

    Some(PrognosisSample {
        valid,
        wind_dir: number()?,
        wind_speed: number()?,
        temperature: number()?,
        air_pressure: number()?,
    })
}

async fn load_file(path: &Path) -> Option<PrognosisSample> {
    let contents = match fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) => {
            warn!("Unable to open file {}: {}", path.display(), e);
            return None;
        }
    };

    let sample = parse_sample(&contents);
    match &sample {
        Some(sample) => debug!("Loaded {}: {:?}", path.display(), sample),
        None => warn!("Corrupt prognosis file {}", path.display()),
    }
    sample
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(name: &str) -> PrognosisSource {
        let dir = std::env::temp_dir().join(format!("ecodome-prog-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        PrognosisSource {
            url: "https://www.yr.no/place/Denmark/forecast.xml".to_string(),
            file_path: format!("{}/", dir.display()),
            file_name: "wdat".to_string(),
        }
    }

    #[test]
    fn parses_five_line_file() {
        let sample = parse_sample("Valid at 2018-05-23T15:00:00\n184.3\n4.2\n17.5\n1012.8\n").unwrap();
        assert_eq!(sample.valid, "Valid at 2018-05-23T15:00:00");
        assert_eq!(sample.wind_dir, 184.3);
        assert_eq!(sample.temperature, 17.5);
        assert_eq!(sample.air_pressure, 1012.8);
    }

    #[test]
    fn rejects_short_or_non_numeric_file() {
        assert!(parse_sample("Valid at 2018-05-23T15:00:00\n184.3\n").is_none());
        assert!(parse_sample("Valid\n1\n2\nwarm\n1000\n").is_none());
    }

    #[tokio::test]
    async fn update_fills_missing_items_with_fallback() {
        let source = source("partial");
        std::fs::create_dir_all(&source.file_path).unwrap();
        std::fs::write(
            format!("{}wdat0", source.file_path),
            "Valid at 2018-05-23T15:00:00\n90\n3\n21.5\n1005\n",
        )
        .unwrap();
        std::fs::write(format!("{}wdat2", source.file_path), "garbage").unwrap();

        let mut loader = PrognosisLoader::new(source, 3);
        let integrity = loader.self_check().await;
        assert_eq!(integrity.files_present, vec![true, false, true]);
        assert!(!integrity.passed());

        let data = loader.update().await;
        assert_eq!(data.len(), 3);
        assert_eq!(data[0].temperature, 21.5);
        assert!(data[1].is_fallback());
        assert!(data[2].is_fallback());
    }

    #[tokio::test]
    async fn missing_directory_gives_all_fallbacks() {
        let mut loader = PrognosisLoader::new(source("missing"), 2);
        let integrity = loader.self_check().await;
        assert!(!integrity.dir_exists);

        let data = loader.update().await;
        assert_eq!(data.len(), 2);
        assert!(data.iter().all(PrognosisSample::is_fallback));
    }
}
