/// Refreshing prognosis files through the external downloader
use log::{debug, error, info};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::models::PrognosisSource;

/// Run the downloader once for every source; returns how many succeeded
///
/// `downloader` is a program followed by optional arguments, e.g.
/// `python3 ./DataDown.py`; it is called as `<downloader> -wl <url> -dn <path><name>`.
/// A run that takes longer than `limit` is killed and counted as failed.
pub async fn refresh(downloader: &str, sources: &[PrognosisSource], limit: Duration) -> usize {
    let mut parts = downloader.split_whitespace();
    let program = match parts.next() {
        Some(program) => program,
        None => return 0,
    };
    let base_args: Vec<&str> = parts.collect();

    let mut refreshed = 0;
    for source in sources {
        if let Err(e) = tokio::fs::create_dir_all(&source.file_path).await {
            error!("Failed to create {}: {}", source.file_path, e);
            continue;
        }

        let target = format!("{}{}", source.file_path, source.file_name);
        debug!("Running {} -wl {} -dn {}", downloader, source.url, target);

        let run = Command::new(program)
            .args(&base_args)
            .arg("-wl")
            .arg(&source.url)
            .arg("-dn")
            .arg(&target)
            .kill_on_drop(true)
            .output();

        let result = match timeout(limit, run).await {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Prognosis download for {} timed out after {}s",
                    source.url,
                    limit.as_secs()
                );
                continue;
            }
        };

        match result {
            Ok(output) if output.status.success() => refreshed += 1,
            Ok(output) => error!(
                "Prognosis download for {} failed ({}): {}",
                source.url,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
            Err(e) => error!("Failed to run prognosis downloader '{}': {}", program, e),
        }
    }

    info!("Refreshed {}/{} prognosis dataset(s)", refreshed, sources.len());
    refreshed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(name: &str) -> Vec<PrognosisSource> {
        let dir = std::env::temp_dir().join(format!("ecodome-dl-{}-{}", name, std::process::id()));
        vec![
            PrognosisSource {
                url: "https://example.org/one.xml".to_string(),
                file_path: format!("{}/dataset1/", dir.display()),
                file_name: "wdat".to_string(),
            },
            PrognosisSource {
                url: "https://example.org/two.xml".to_string(),
                file_path: format!("{}/dataset2/", dir.display()),
                file_name: "wdat".to_string(),
            },
        ]
    }

    const LIMIT: Duration = Duration::from_secs(10);

    #[tokio::test]
    async fn counts_successful_runs_and_creates_directories() {
        let sources = sources("ok");
        assert_eq!(refresh("true", &sources, LIMIT).await, 2);
        assert!(std::path::Path::new(&sources[1].file_path).is_dir());
    }

    #[tokio::test]
    async fn failures_are_reported_not_raised() {
        assert_eq!(refresh("false", &sources("fail"), LIMIT).await, 0);
        assert_eq!(refresh("ecodome-no-such-downloader", &sources("missing"), LIMIT).await, 0);
        assert_eq!(refresh("   ", &sources("blank"), LIMIT).await, 0);
    }

    #[tokio::test]
    async fn slow_downloader_is_killed_at_limit() {
        let dir = std::env::temp_dir().join(format!("ecodome-dl-slow-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let script = dir.join("slow.sh");
        std::fs::write(&script, "sleep 30\n").unwrap();

        let started = std::time::Instant::now();
        let refreshed = refresh(
            &format!("sh {}", script.display()),
            &sources("slow"),
            Duration::from_millis(200),
        )
        .await;

        assert_eq!(refreshed, 0);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
