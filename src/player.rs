use anyhow::{Context, Result, anyhow};
use std::process::Stdio;
use tokio::{
  io::{AsyncBufReadExt, BufReader as TokioBufReader},
  process::{Child as TokioChild, Command},
  sync::mpsc,
  task::JoinHandle,
};
use tracing::info;

/// mpv wrapper for the movie the search service indexes.
///
/// The player is lazy: nothing is spawned until the first seek. After that,
/// jumps go through mpv's JSON IPC socket so the window stays put.
pub struct ScenePlayer {
  movie_url: String,
  current_process: Option<TokioChild>,
  mpv_monitor_handle: Option<JoinHandle<()>>,
  mpv_status_rx: Option<mpsc::Receiver<String>>,
  last_mpv_status: Option<String>,
  ipc_socket_path: Option<String>,
  pub paused: bool,
}

impl ScenePlayer {
  pub fn new(movie_url: String) -> Self {
    Self {
      movie_url,
      current_process: None,
      mpv_monitor_handle: None,
      mpv_status_rx: None,
      last_mpv_status: None,
      ipc_socket_path: None,
      paused: false,
    }
  }

  pub fn movie_url(&self) -> &str {
    &self.movie_url
  }

  pub fn is_playing(&self) -> bool {
    self.current_process.is_some()
  }

  pub fn check_mpv_status(&mut self) {
    if let Some(rx) = &mut self.mpv_status_rx {
      while let Ok(status) = rx.try_recv() {
        self.last_mpv_status = Some(status);
      }
    }
  }

  pub fn get_last_mpv_status(&self) -> Option<String> {
    self.last_mpv_status.clone()
  }

  /// Jump the movie to `start_sec` and make sure it is playing.
  ///
  /// Spawns mpv at that offset when nothing is running yet; otherwise the
  /// running instance is sought in place over IPC.
  pub async fn seek_and_play(&mut self, start_sec: f64) -> Result<()> {
    if self.is_playing() {
      info!(start_sec, "player: seeking running mpv");
      let seek = serde_json::json!({ "command": ["seek", start_sec, "absolute"] });
      self.send_ipc(&format!("{}\n", seek)).await?;
      self.send_ipc("{\"command\":[\"set_property\",\"pause\",false]}\n").await?;
      self.paused = false;
      return Ok(());
    }
    self.spawn(start_sec).await
  }

  async fn spawn(&mut self, start_sec: f64) -> Result<()> {
    self.paused = false;

    let socket_path = std::env::temp_dir().join(format!("sceneseek-mpv-{}.sock", std::process::id()));
    let socket_path_str = socket_path.to_str().context("Temp dir path is not valid UTF-8")?.to_string();
    // Remove stale socket if it exists from a previous crash.
    let _ = std::fs::remove_file(&socket_path);

    info!(start_sec, url = %self.movie_url, "player: spawning mpv");
    let mut cmd = Command::new("mpv");
    cmd.args([
      &format!("--start={}", start_sec),
      "--term-status-msg=Time: ${time-pos/full} / ${duration/full} | ${pause} ${percent-pos}%",
      &format!("--input-ipc-server={}", socket_path_str),
      &self.movie_url,
    ]);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    // Send stderr to null — if piped but never drained, the pipe buffer
    // fills and mpv blocks.
    cmd.stderr(Stdio::null());

    let mut child = cmd.spawn().map_err(|e| {
      if e.kind() == std::io::ErrorKind::NotFound {
        anyhow!("mpv not found. Install it with: brew install mpv (macOS) or apt install mpv (Linux)")
      } else {
        anyhow!(e).context("Failed to spawn mpv process")
      }
    })?;

    let stdout = child.stdout.take().context("Failed to get mpv stdout")?;
    let (tx, rx) = mpsc::channel::<String>(10);
    self.mpv_status_rx = Some(rx);

    let monitor_handle = tokio::spawn(async move {
      let reader = TokioBufReader::new(stdout);
      let mut lines = reader.lines();
      while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).await.is_err() {
          break;
        }
      }
    });

    self.current_process = Some(child);
    self.mpv_monitor_handle = Some(monitor_handle);
    self.ipc_socket_path = Some(socket_path_str);
    Ok(())
  }

  pub async fn toggle_pause(&mut self) -> Result<()> {
    if !self.is_playing() {
      return Ok(());
    }
    self.send_ipc("{\"command\":[\"cycle\",\"pause\"]}\n").await?;
    self.paused = !self.paused;
    Ok(())
  }

  async fn send_ipc(&self, payload: &str) -> Result<()> {
    let Some(ref socket_path) = self.ipc_socket_path else {
      return Ok(());
    };
    let stream = tokio::net::UnixStream::connect(socket_path).await.context("Failed to connect to mpv IPC socket")?;
    stream.writable().await.context("mpv IPC socket not writable")?;
    let written = stream.try_write(payload.as_bytes()).context("Failed to send command to mpv")?;
    if written < payload.len() {
      return Err(anyhow!("Partial write to mpv IPC socket: wrote {} of {} bytes", written, payload.len()));
    }
    Ok(())
  }

  pub async fn stop(&mut self) -> Result<()> {
    if let Some(handle) = self.mpv_monitor_handle.take() {
      handle.abort();
      let _ = handle.await;
    }
    self.mpv_status_rx = None;
    self.last_mpv_status = None;

    if let Some(mut child) = self.current_process.take() {
      child.kill().await.context("Failed to kill mpv process")?;
      let _ = child.wait().await;
    }

    self.paused = false;

    if let Some(path) = self.ipc_socket_path.take() {
      let _ = std::fs::remove_file(&path);
    }
    Ok(())
  }
}
