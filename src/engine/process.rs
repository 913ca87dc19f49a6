use anyhow::{anyhow, Context, Result};
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs `exe args...` with piped output, killing it after `timeout` when set.
pub fn run_captured(exe: &Path, args: &[String], timeout: Option<Duration>) -> Result<Output> {
    debug!("spawn {} {:?} timeout={:?}", exe.display(), args, timeout);
    let mut child = Command::new(exe)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawning {}", exe.display()))?;

    let Some(timeout) = timeout else {
        return child
            .wait_with_output()
            .with_context(|| format!("waiting for {}", exe.display()));
    };

    // Drained on threads so a chatty child can't block on a full pipe.
    let stdout = drain(child.stdout.take(), "stdout");
    let stderr = drain(child.stderr.take(), "stderr");

    match poll_until(&mut child, timeout)? {
        Some(status) => Ok(Output {
            status,
            stdout: join(stdout)?,
            stderr: join(stderr)?,
        }),
        None => {
            warn!("{} timed out after {:?}", exe.display(), timeout);
            let _ = stdout.join();
            let stderr = join(stderr)?;
            Err(anyhow!(
                "{} exceeded timeout ({:?}); stderr: {}",
                exe.display(),
                timeout,
                String::from_utf8_lossy(&stderr)
            ))
        }
    }
}

/// Like [`run_captured`] but inherits the terminal, for installers that
/// print their own progress or ask questions.
pub fn run_inherited(argv: &[String], timeout: Option<Duration>) -> Result<()> {
    let (exe, args) = argv
        .split_first()
        .ok_or_else(|| anyhow!("empty command"))?;
    debug!("spawn (inherit) {} {:?}", exe, args);
    let mut child = Command::new(exe)
        .args(args)
        .spawn()
        .with_context(|| format!("spawning {exe}"))?;

    let status = match timeout {
        Some(t) => poll_until(&mut child, t)?.ok_or_else(|| {
            warn!("{exe} timed out after {:?}", t);
            anyhow!("{exe} exceeded timeout ({:?})", t)
        })?,
        None => child.wait().with_context(|| format!("waiting for {exe}"))?,
    };

    if !status.success() {
        return Err(anyhow!("{exe} exited with {status}"));
    }
    Ok(())
}

/// Waits for `child` to exit. `None` means the deadline passed and the
/// child was killed and reaped.
fn poll_until(child: &mut Child, timeout: Duration) -> Result<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().with_context(|| "try_wait")? {
            return Ok(Some(status));
        }
        if start.elapsed() > timeout {
            let _ = child.kill();
            child.wait().with_context(|| "wait after kill")?;
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

fn drain<R: Read + Send + 'static>(
    pipe: Option<R>,
    name: &'static str,
) -> JoinHandle<Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf)
                .with_context(|| format!("read {name}"))?;
        }
        Ok(buf)
    })
}

fn join(handle: JoinHandle<Result<Vec<u8>>>) -> Result<Vec<u8>> {
    handle
        .join()
        .map_err(|_| anyhow!("pipe reader thread panicked"))?
}
