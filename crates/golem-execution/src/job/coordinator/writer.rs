use std::path::{Path, PathBuf};

use log::{debug, error, warn};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::id::JobId;

pub(super) fn job_file_path(log_dir: &Path, job_id: JobId, suffix: &str) -> PathBuf {
    log_dir.join(format!("{job_id}.{suffix}.txt"))
}

/// Appends text to one job file from a dedicated task.
///
/// The file is created on the first write. If creation fails,
/// everything written to this stream afterwards is discarded.
pub(super) struct OutputWriter {
    path: PathBuf,
    sender: Option<mpsc::UnboundedSender<String>>,
    task: Option<JoinHandle<()>>,
}

impl OutputWriter {
    pub fn spawn(path: PathBuf) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let task = tokio::spawn(Self::run(path.clone(), receiver));
        Self {
            path,
            sender: Some(sender),
            task: Some(task),
        }
    }

    pub fn write(&self, text: impl Into<String>) {
        match &self.sender {
            Some(sender) => {
                if sender.send(text.into()).is_err() {
                    warn!("the writer for {} has stopped", self.path.display());
                }
            }
            None => debug!("discarding output for closed file {}", self.path.display()),
        }
    }

    /// Closes the stream. Pending text is still written.
    pub fn close(&mut self) {
        self.sender = None;
    }

    pub async fn join(mut self) {
        self.close();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("the writer for {} failed: {e}", self.path.display());
            }
        }
    }

    async fn run(path: PathBuf, mut receiver: mpsc::UnboundedReceiver<String>) {
        let mut file: Option<File> = None;
        let mut failed = false;
        while let Some(text) = receiver.recv().await {
            if failed {
                continue;
            }
            if file.is_none() {
                match File::create(&path).await {
                    Ok(x) => file = Some(x),
                    Err(e) => {
                        warn!("failed to create {}: {e}", path.display());
                        failed = true;
                        continue;
                    }
                }
            }
            let Some(out) = file.as_mut() else {
                continue;
            };
            let result = async {
                out.write_all(text.as_bytes()).await?;
                out.flush().await
            }
            .await;
            if let Err(e) = result {
                warn!("failed to write to {}: {e}", path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_output_writer_creates_file_lazily() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        let job_id = JobId::generate();
        let path = job_file_path(dir.path(), job_id, "out");
        assert_eq!(
            path.file_name().and_then(|x| x.to_str()),
            Some(format!("{job_id}.out.txt").as_str())
        );

        let writer = OutputWriter::spawn(path.clone());
        writer.join().await;
        assert!(!path.exists());

        let mut writer = OutputWriter::spawn(path.clone());
        writer.write("a\n");
        writer.write("b\n");
        writer.close();
        writer.write("dropped\n");
        writer.join().await;
        assert_eq!(tokio::fs::read_to_string(&path).await?, "a\nb\n");
        Ok(())
    }

    #[tokio::test]
    async fn test_output_writer_create_failure() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("missing").join("out.txt");
        let writer = OutputWriter::spawn(path.clone());
        writer.write("lost\n");
        writer.join().await;
        assert!(!path.exists());
        Ok(())
    }
}
