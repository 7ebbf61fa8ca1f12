use anyhow::{Context, Result};
use std::io::{self, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use tracing::warn;

pub fn copy_to_clipboard(text: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    let (program, args): (&str, &[&str]) = ("pbcopy", &[]);

    #[cfg(target_os = "linux")]
    let (program, args): (&str, &[&str]) = ("xclip", &["-selection", "clipboard"]);

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        let _ = text;
        return Err(anyhow::anyhow!("Clipboard not supported on this platform"));
    }

    #[cfg(any(target_os = "macos", target_os = "linux"))]
    {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn {program}"))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .with_context(|| format!("Failed to write to {program}"))?;
        }

        child
            .wait()
            .with_context(|| format!("Failed to wait for {program}"))?;
        Ok(())
    }
}

/// Hand `url` to the desktop's opener without waiting for it.
pub fn open_url(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    let program = "open";

    #[cfg(not(target_os = "macos"))]
    let program = "xdg-open";

    let mut command = Command::new(program);
    command
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    spawn_reaped(command).with_context(|| format!("Failed to spawn {program}"))?;
    Ok(())
}

/// Start `command` and wait for it on a background thread so the child is
/// reaped once it exits.
fn spawn_reaped(mut command: Command) -> io::Result<JoinHandle<io::Result<ExitStatus>>> {
    let mut child = command.spawn()?;
    Ok(thread::spawn(move || {
        let status = child.wait();
        if let Err(e) = &status {
            warn!(error = %e, "waiting for child process failed");
        }
        status
    }))
}

/// Fill `{trace_id}`, `{index}` and `{query}` in a web UI URL template.
pub fn expand_url_template(template: &str, trace_id: Option<&str>, index: &str, query: &str) -> String {
    template
        .replace("{trace_id}", &urlencoding::encode(trace_id.unwrap_or_default()))
        .replace("{index}", &urlencoding::encode(index))
        .replace("{query}", &urlencoding::encode(query))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_url_template() {
        let url = expand_url_template(
            "https://ui.example/trace/{trace_id}?index={index}&q={query}",
            Some("abc123"),
            "logs-*",
            "level:error AND timeout",
        );
        assert_eq!(
            url,
            "https://ui.example/trace/abc123?index=logs-%2A&q=level%3Aerror%20AND%20timeout"
        );
    }

    #[test]
    fn test_template_without_trace() {
        assert_eq!(
            expand_url_template("https://ui.example/{trace_id}", None, "", ""),
            "https://ui.example/"
        );
    }

    #[test]
    fn test_template_encodes_non_ascii_and_reserved() {
        assert_eq!(
            expand_url_template("https://ui.example/?q={query}", None, "", "名前 a&b=c/d"),
            "https://ui.example/?q=%E5%90%8D%E5%89%8D%20a%26b%3Dc%2Fd"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_spawned_process_is_waited_on() {
        let handle = spawn_reaped(Command::new("true")).unwrap();
        let status = handle.join().unwrap().unwrap();
        assert!(status.success());
    }

    #[test]
    fn test_spawn_failure_is_reported() {
        assert!(spawn_reaped(Command::new("/nonexistent/obsterm-opener")).is_err());
    }
}
