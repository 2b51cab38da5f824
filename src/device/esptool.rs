//! `esptool.py read_mac` through the PlatformIO install

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::{parse_identifier, DeviceError, DeviceIdentifier};

/// Default limit for the inspection command, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Locations of the PlatformIO tools used for discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub platformio_home: PathBuf,
    pub esptool: PathBuf,
    pub pio: PathBuf,
}

impl ToolPaths {
    /// Tool locations inside a PlatformIO home directory.
    pub fn from_home(home: &Path) -> Self {
        Self {
            platformio_home: home.to_path_buf(),
            esptool: home.join("packages/tool-esptoolpy/esptool.py"),
            pio: home.join("penv/bin/pio"),
        }
    }

    /// `~/.platformio`
    pub fn default_location() -> Result<Self, DeviceError> {
        let home = std::env::var("HOME").map_err(|_| DeviceError::Environment {
            what: "HOME",
            path: PathBuf::from("$HOME"),
        })?;
        Ok(Self::from_home(&PathBuf::from(home).join(".platformio")))
    }

    /// Fail on the first missing tool path.
    fn check(&self) -> Result<(), DeviceError> {
        let required = [
            ("PLATFORMIO_HOME", &self.platformio_home),
            ("ESPTOOL_BIN", &self.esptool),
            ("PIO_BIN", &self.pio),
        ];
        for (what, path) in required {
            if !path.exists() {
                return Err(DeviceError::Environment {
                    what,
                    path: path.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Reads the MAC address of the board attached to the default serial port
#[derive(Debug, Clone)]
pub struct EspTool {
    paths: ToolPaths,
    timeout: Duration,
}

impl EspTool {
    /// Verify the tool paths exist and build the identifier source.
    pub fn new(paths: ToolPaths, timeout: Duration) -> Result<Self, DeviceError> {
        paths.check()?;
        Ok(Self { paths, timeout })
    }

    pub fn paths(&self) -> &ToolPaths {
        &self.paths
    }

    /// Run `esptool.py read_mac` and collect stdout.
    fn run_read_mac(&self) -> Result<String, DeviceError> {
        tracing::debug!(esptool = %self.paths.esptool.display(), "running read_mac");

        let mut child = Command::new(&self.paths.esptool)
            .arg("read_mac")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| DeviceError::NotFound {
                reason: format!("failed to run {}: {}", self.paths.esptool.display(), e),
            })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    kill(&mut child);
                    return Err(DeviceError::NotFound {
                        reason: format!(
                            "`esptool.py read_mac` timed out after {}s",
                            self.timeout.as_secs_f64()
                        ),
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    kill(&mut child);
                    return Err(DeviceError::NotFound {
                        reason: format!("failed to wait for esptool.py: {}", e),
                    });
                }
            }
        };

        // A grandchild can keep the pipes open after esptool exits
        let output = join_until(stdout, deadline).ok_or_else(|| DeviceError::NotFound {
            reason: format!(
                "`esptool.py read_mac` output still open after {}s timeout",
                self.timeout.as_secs_f64()
            ),
        })?;
        let errors = join_until(stderr, deadline).unwrap_or_default();
        if !errors.trim().is_empty() {
            tracing::debug!(stderr = %errors.trim(), "esptool.py stderr");
        }
        if !status.success() {
            tracing::warn!(%status, "esptool.py read_mac exited unsuccessfully");
        }

        Ok(output)
    }
}

impl DeviceIdentifier for EspTool {
    fn read_identifier(&self) -> Result<String, DeviceError> {
        let output = self.run_read_mac()?;
        let mac = parse_identifier(&output).ok_or_else(|| DeviceError::NotFound {
            reason: "please check output of `esptool.py read_mac`".to_string(),
        })?;
        tracing::info!(mac = %mac, "identified connected board");
        Ok(mac)
    }
}

/// Read a pipe to completion on its own thread so the child never blocks on a full pipe.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Join a pipe reader unless `deadline` passes first.
fn join_until(handle: JoinHandle<String>, deadline: Instant) -> Option<String> {
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            return None;
        }
        thread::sleep(POLL_INTERVAL);
    }
    handle.join().ok()
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_home() {
        let paths = ToolPaths::from_home(Path::new("/home/dev/.platformio"));
        assert_eq!(
            paths.esptool,
            PathBuf::from("/home/dev/.platformio/packages/tool-esptoolpy/esptool.py")
        );
        assert_eq!(paths.pio, PathBuf::from("/home/dev/.platformio/penv/bin/pio"));
    }

    #[test]
    fn test_missing_home() {
        let err = EspTool::new(
            ToolPaths::from_home(Path::new("/nonexistent/.platformio")),
            Duration::from_secs(1),
        )
        .unwrap_err();
        match err {
            DeviceError::Environment { what, path } => {
                assert_eq!(what, "PLATFORMIO_HOME");
                assert_eq!(path, PathBuf::from("/nonexistent/.platformio"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_esptool() {
        let home = TempDir::new().unwrap();
        let err = EspTool::new(ToolPaths::from_home(home.path()), Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, DeviceError::Environment { what: "ESPTOOL_BIN", .. }));
        assert!(err.to_string().contains("esptool.py"));
    }
}
