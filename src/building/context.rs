use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::config::BuildSettings;
use crate::error::Result;
use crate::gateway::{GenerationGateway, RetryPolicy};
use crate::media::MediaToolkit;
use crate::video::{Video, VideoMetadata};

/// Settings and collaborators shared by every handler of a build
///
/// Cloning is cheap: everything is reference counted, so child builds of a
/// composite run with the same context as their parent.
#[derive(Clone)]
pub struct BuildContext {
    settings: Arc<BuildSettings>,
    gateway: Arc<dyn GenerationGateway>,
    toolkit: Arc<dyn MediaToolkit>,
}

impl BuildContext {
    pub fn new(
        settings: Arc<BuildSettings>,
        gateway: Arc<dyn GenerationGateway>,
        toolkit: Arc<dyn MediaToolkit>,
    ) -> Self {
        Self {
            settings,
            gateway,
            toolkit,
        }
    }

    pub fn settings(&self) -> &Arc<BuildSettings> {
        &self.settings
    }

    pub fn gateway(&self) -> &dyn GenerationGateway {
        self.gateway.as_ref()
    }

    pub fn toolkit(&self) -> &dyn MediaToolkit {
        self.toolkit.as_ref()
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.settings.retry
    }

    /// Directory receiving intermediate artifacts
    pub fn work_dir(&self) -> PathBuf {
        self.settings.work_dir()
    }

    pub async fn ensure_work_dir(&self) -> Result<PathBuf> {
        let dir = self.work_dir();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    /// Path of the artifact `video` produces once `stage` is marked on it
    pub fn next_artifact_path(&self, video: &Video, stage: fn(&mut VideoMetadata)) -> Result<PathBuf> {
        let name = video.file_name_after(&self.settings, stage)?;
        Ok(self.work_dir().join(name))
    }

    /// Mark `stage` on the video and point it at `artifact`
    pub fn commit(&self, video: &mut Video, stage: fn(&mut VideoMetadata), artifact: PathBuf) {
        stage(video.metadata_mut());
        debug!("📦 {} -> {}", video.id(), artifact.display());
        video.set_media_url(artifact);
    }

    /// Move a file written by the gateway to its state name and commit it
    pub async fn adopt(
        &self,
        video: &mut Video,
        produced: &Path,
        stage: fn(&mut VideoMetadata),
    ) -> Result<()> {
        self.ensure_work_dir().await?;
        let target = self.next_artifact_path(video, stage)?;

        if tokio::fs::rename(produced, &target).await.is_err() {
            // Gateways may write outside the work dir, on another device
            tokio::fs::copy(produced, &target).await?;
        }

        self.commit(video, stage, target);
        Ok(())
    }
}
