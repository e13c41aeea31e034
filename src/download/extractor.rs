//! Downloads through an external audio extraction tool (youtube-dl / yt-dlp)

use std::{
    io::Read,
    path::{Path, PathBuf},
    process::{Child, Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

use crate::{
    config,
    download::{backend::Backend, error::BackendError},
};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct ExtractorBackend {
    command: String,
    args: Vec<String>,
    audio_format: String,
    audio_quality: String,
    timeout: Duration,
}

impl ExtractorBackend {
    pub fn new(config: &config::Extractor) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            audio_format: config.audio_format.clone(),
            audio_quality: config.audio_quality.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn build_command(&self, url: &str, destination: &Path) -> Command {
        let mut command = Command::new(&self.command);
        command
            .args(&self.args)
            .arg("-x")
            .args(["--audio-format", self.audio_format.as_str()])
            .args(["--audio-quality", self.audio_quality.as_str()])
            .arg("-o")
            .arg(output_template(destination))
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // own process group, so a timeout also takes down ffmpeg and other helpers
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        command
    }

    /// Waits for the child, killing it once the timeout has passed
    fn wait(&self, child: &mut Child) -> Result<ExitStatus, BackendError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                kill_tree(child);
                let _ = child.wait();
                return Err(BackendError::Timeout(self.timeout));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Backend for ExtractorBackend {
    fn name(&self) -> &str {
        "YouTube"
    }

    fn fetch(&self, url: &str, destination: &Path) -> Result<(), BackendError> {
        let mut child = self
            .build_command(url, destination)
            .spawn()
            .map_err(|source| BackendError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        // on timeout the reader threads are left behind: a helper that escaped the kill
        // may still hold the pipes open
        let status = self.wait(&mut child)?;
        let stdout = collect(stdout);
        let stderr = collect(stderr);

        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            log::info!("  {line}");
        }

        if !status.success() {
            return Err(BackendError::ExitStatus {
                command: self.command.clone(),
                code: status.code(),
                output: stderr.trim().to_string(),
            });
        }

        if !destination.exists() {
            return Err(BackendError::NoOutput(destination.to_path_buf()));
        }
        Ok(())
    }
}

/// The tool picks the extension itself, so `a.mp3` becomes `a.%(ext)s`.
///
/// `%` is the tool's template marker and is doubled everywhere else.
fn output_template(destination: &Path) -> PathBuf {
    let stem = destination.with_extension("");
    let escaped = stem.to_string_lossy().replace('%', "%%");
    PathBuf::from(format!("{escaped}.%(ext)s"))
}

#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    match libc::pid_t::try_from(child.id()) {
        // SAFETY: plain syscall; the negative pid targets the group created in build_command
        Ok(pid) => unsafe {
            libc::kill(-pid, libc::SIGKILL);
        },
        Err(_) => {
            let _ = child.kill();
        }
    }
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    let _ = child.kill();
}

/// Reads a pipe to the end on its own thread so the child never blocks on a full pipe
fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn collect(handle: Option<thread::JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}
