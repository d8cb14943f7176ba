//! Mount lifecycle - runs the FUSE session for one repository
//!
//! Mounting spawns the (synchronous) fuser session on a blocking task and
//! hands back a handle used to tear the mount down on shutdown.

use anyhow::{anyhow, Context, Result};
use fuser::MountOption;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::fs::ReleaseFilesystem;

/// Handle to the running mount
pub struct MountHandle {
    /// Mount point path
    mountpoint: PathBuf,
    /// Background task running the FUSE session
    task: JoinHandle<()>,
}

/// Mount the filesystem at the specified path
///
/// # Arguments
/// * `filesystem` - The release filesystem to serve
/// * `mountpoint` - Path to mount at (created if missing)
/// * `volume` - Repository name, used to label the volume
pub async fn mount(
    filesystem: ReleaseFilesystem,
    mountpoint: PathBuf,
    volume: &str,
) -> Result<MountHandle> {
    info!(mountpoint = %mountpoint.display(), "Mounting...");

    // Create mountpoint directory if needed
    if !mountpoint.exists() {
        std::fs::create_dir_all(&mountpoint).context("Failed to create mountpoint directory")?;
    }

    // Configure mount options
    let options = vec![
        MountOption::RO, // the tree is read-only, let the kernel enforce it
        MountOption::FSName(format!("relmount-{}", volume.replace('/', "-"))),
        MountOption::Subtype("relmount".to_string()),
        MountOption::NoAtime,     // Don't update access times (performance)
        MountOption::AutoUnmount, // Auto-unmount on process exit
    ];

    let mp = mountpoint.clone();

    // Spawn FUSE mount in a blocking task (fuser is sync)
    let task = tokio::task::spawn_blocking(move || {
        info!("Starting FUSE session...");

        match fuser::mount2(filesystem, &mp, &options) {
            Ok(()) => {
                info!("FUSE session ended normally");
            }
            Err(e) => {
                error!(error = %e, "FUSE session failed");
            }
        }
    });

    // Give the mount a moment to initialize
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

    // Check if the mount task is still running
    if task.is_finished() {
        return Err(anyhow!(
            "Mount failed to start - check that FUSE is installed"
        ));
    }

    info!(mountpoint = %mountpoint.display(), "Mount successful");
    Ok(MountHandle { mountpoint, task })
}

impl MountHandle {
    /// Unmount and wait for the FUSE session to end
    pub async fn unmount(self) -> Result<()> {
        info!(mountpoint = %self.mountpoint.display(), "Unmounting...");

        // Try system unmount command
        let output = std::process::Command::new("umount")
            .arg(&self.mountpoint)
            .output();

        match output {
            Ok(output) if output.status.success() => {
                debug!("umount command succeeded");
            }
            Ok(output) => {
                warn!(
                    "umount command failed: {}",
                    String::from_utf8_lossy(&output.stderr)
                );
            }
            Err(e) => {
                warn!("Failed to run umount: {}", e);
            }
        }

        // Wait for the task to finish with timeout
        let timeout_result =
            tokio::time::timeout(tokio::time::Duration::from_secs(5), self.task).await;

        match timeout_result {
            Ok(Ok(())) => {
                info!("Unmount completed");
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Mount task panicked");
            }
            Err(_) => {
                warn!("Unmount timed out, task may still be running");
            }
        }

        // Clean up mountpoint if empty
        if self.mountpoint.exists() {
            if let Err(e) = std::fs::remove_dir(&self.mountpoint) {
                debug!(
                    mountpoint = %self.mountpoint.display(),
                    error = %e,
                    "Could not remove mountpoint (may not be empty)"
                );
            }
        }

        Ok(())
    }
}
