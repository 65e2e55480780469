//! Process-backed extractor speaking JSON lines over stdio.
//!
//! The worker is spawned on first use and kept alive so the model is loaded
//! once. Each request is a single line on the worker's stdin:
//!
//! ```json
//! {"image": "stills/2024-04-27T20_41_44.755476.jpg", "points": [[500.0, 375.0]], "labels": [1], "crop_fraction": 0.3}
//! ```
//!
//! and each answer a single line on its stdout, either `{"mask_size": 183204}`
//! or `{"error": "message"}`. Worker stderr is inherited.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::{Deserialize, Serialize};

use leaven_common::config::ExtractorSettings;
use leaven_common::error::{LeavenError, LeavenResult};
use leaven_series_model::cache::MaskSize;

use crate::extractor::{PointPrompts, SizeExtractor};

#[derive(Debug, Serialize)]
struct WorkerRequest<'a> {
    image: &'a Path,
    points: &'a [[f64; 2]],
    labels: &'a [i32],
    crop_fraction: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WorkerResponse {
    Measured { mask_size: MaskSize },
    Failed { error: String },
}

struct Worker {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl Drop for Worker {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Extractor backed by a long-running segmentation worker process.
pub struct ProcessExtractor {
    program: String,
    args: Vec<String>,
    worker: Option<Worker>,
}

impl ProcessExtractor {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            worker: None,
        }
    }

    pub fn from_settings(settings: &ExtractorSettings) -> Self {
        Self::new(settings.program.clone(), settings.args.clone())
    }

    /// Whether a worker process is currently running.
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    fn ensure_worker(&mut self) -> LeavenResult<&mut Worker> {
        if self.worker.is_none() {
            tracing::info!(program = %self.program, args = ?self.args, "Starting segmentation worker");
            let mut child = Command::new(&self.program)
                .args(&self.args)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::inherit())
                .spawn()
                .map_err(|e| {
                    LeavenError::extraction(format!(
                        "Failed to start segmentation worker '{}': {e}",
                        self.program
                    ))
                })?;

            let stdin = child
                .stdin
                .take()
                .ok_or_else(|| LeavenError::extraction("Failed to capture worker stdin"))?;
            let stdout = child
                .stdout
                .take()
                .ok_or_else(|| LeavenError::extraction("Failed to capture worker stdout"))?;

            tracing::debug!(pid = child.id(), "Segmentation worker started");
            self.worker = Some(Worker {
                child,
                stdin,
                stdout: BufReader::new(stdout),
            });
        }

        self.worker
            .as_mut()
            .ok_or_else(|| LeavenError::extraction("Segmentation worker unavailable"))
    }

    fn round_trip(&mut self, request: &WorkerRequest<'_>) -> LeavenResult<WorkerResponse> {
        let mut line = serde_json::to_string(request)?;
        line.push('\n');

        let worker = self.ensure_worker()?;
        worker
            .stdin
            .write_all(line.as_bytes())
            .and_then(|()| worker.stdin.flush())
            .map_err(|e| LeavenError::extraction(format!("Failed to send request to worker: {e}")))?;

        let mut reply = String::new();
        let bytes = worker
            .stdout
            .read_line(&mut reply)
            .map_err(|e| LeavenError::extraction(format!("Failed to read worker reply: {e}")))?;
        if bytes == 0 {
            let status = worker
                .child
                .wait()
                .map(|s| s.to_string())
                .unwrap_or_else(|e| format!("unknown ({e})"));
            return Err(LeavenError::extraction(format!(
                "Segmentation worker exited without replying (status {status})"
            )));
        }

        serde_json::from_str(reply.trim()).map_err(|e| {
            LeavenError::extraction(format!("Malformed worker reply '{}': {e}", reply.trim()))
        })
    }
}

impl SizeExtractor for ProcessExtractor {
    fn measure(&mut self, image: &Path, prompts: &PointPrompts) -> LeavenResult<MaskSize> {
        if !image.is_file() {
            return Err(LeavenError::FileNotFound {
                path: image.to_path_buf(),
            });
        }

        let request = WorkerRequest {
            image,
            points: &prompts.points,
            labels: &prompts.labels,
            crop_fraction: prompts.crop_fraction,
        };

        let response = match self.round_trip(&request) {
            Ok(response) => response,
            Err(e) => {
                // A broken worker is not reused.
                self.worker = None;
                return Err(e);
            }
        };

        match response {
            WorkerResponse::Measured { mask_size } => {
                tracing::debug!(image = %image.display(), mask_size, "Measured still");
                Ok(mask_size)
            }
            WorkerResponse::Failed { error } => Err(LeavenError::extraction(format!(
                "Worker failed on {}: {error}",
                image.display()
            ))),
        }
    }

    fn name(&self) -> &str {
        &self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn prompts() -> PointPrompts {
        PointPrompts {
            points: vec![[500.0, 375.0]],
            labels: vec![1],
            crop_fraction: 0.3,
        }
    }

    fn temp_image(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("leaven_test_worker_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("2024-04-27T20_41_44.755476.jpg");
        std::fs::write(&path, b"jpeg").unwrap();
        path
    }

    fn shell_worker(script: &str) -> ProcessExtractor {
        ProcessExtractor::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[test]
    fn test_request_serialization() {
        let prompts = prompts();
        let request = WorkerRequest {
            image: Path::new("stills/a.jpg"),
            points: &prompts.points,
            labels: &prompts.labels,
            crop_fraction: prompts.crop_fraction,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "image": "stills/a.jpg",
                "points": [[500.0, 375.0]],
                "labels": [1],
                "crop_fraction": 0.3
            })
        );
    }

    #[test]
    fn test_response_parsing() {
        let ok: WorkerResponse = serde_json::from_str(r#"{"mask_size": 42}"#).unwrap();
        assert!(matches!(ok, WorkerResponse::Measured { mask_size: 42 }));
        let err: WorkerResponse = serde_json::from_str(r#"{"error": "no mask"}"#).unwrap();
        assert!(matches!(err, WorkerResponse::Failed { ref error } if error == "no mask"));
    }

    #[test]
    fn test_missing_image_is_not_sent() {
        let mut extractor = shell_worker("exit 0");
        let err = extractor
            .measure(Path::new("/nonexistent/leaven.jpg"), &prompts())
            .unwrap_err();
        assert!(matches!(err, LeavenError::FileNotFound { .. }));
        assert!(!extractor.is_running());
    }

    #[cfg(unix)]
    #[test]
    fn test_worker_is_reused_across_requests() {
        let image = temp_image("reuse");
        let mut extractor = shell_worker(
            r#"n=0; while read line; do n=$((n+1)); echo "{\"mask_size\": $n}"; done"#,
        );

        assert_eq!(extractor.measure(&image, &prompts()).unwrap(), 1);
        assert_eq!(extractor.measure(&image, &prompts()).unwrap(), 2);
        assert!(extractor.is_running());

        std::fs::remove_dir_all(image.parent().unwrap()).ok();
    }

    #[cfg(unix)]
    #[test]
    fn test_worker_error_reply() {
        let image = temp_image("error");
        let mut extractor =
            shell_worker(r#"while read line; do echo '{"error": "cannot decode"}'; done"#);

        let err = extractor.measure(&image, &prompts()).unwrap_err();
        assert!(err.to_string().contains("cannot decode"));

        std::fs::remove_dir_all(image.parent().unwrap()).ok();
    }

    #[cfg(unix)]
    #[test]
    fn test_worker_exit_is_an_error() {
        let image = temp_image("exit");
        let mut extractor = shell_worker("exit 3");

        let err = extractor.measure(&image, &prompts()).unwrap_err();
        assert!(matches!(err, LeavenError::Extraction { .. }));
        assert!(!extractor.is_running());

        std::fs::remove_dir_all(image.parent().unwrap()).ok();
    }

    #[test]
    fn test_unknown_program_is_an_error() {
        let image = temp_image("unknown");
        let mut extractor = ProcessExtractor::new("leaven-no-such-worker-binary", Vec::new());
        assert!(matches!(
            extractor.measure(&image, &prompts()),
            Err(LeavenError::Extraction { .. })
        ));
        std::fs::remove_dir_all(image.parent().unwrap()).ok();
    }
}
