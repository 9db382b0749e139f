use crate::model::{DedupStatus, Filesystem};
use anyhow::{Context, Result, anyhow, bail};
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{Duration, timeout};
use tracing::warn;

pub const DEFAULT_CTL: &str = "beekeeperman";
const CTL_TIMEOUT: Duration = Duration::from_secs(10);

/// Gateway to the daemon control CLI. Every domain action the toolbar
/// can trigger goes through here; the navigation core never sees a
/// subprocess.
pub struct CtlGateway {
    program: String,
}

impl CtlGateway {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Lists all known filesystems with their dedup status. One line per
    /// filesystem: `<uuid>\t<label>\t<status-token>`.
    pub async fn list(&self) -> Result<Vec<Filesystem>> {
        let output = self.run(&["status", "--all", "--porcelain"]).await?;
        Ok(parse_status_lines(&output))
    }

    pub async fn start(&self, uuids: &[String]) -> Result<String> {
        self.run_on(&["start"], uuids).await
    }

    pub async fn stop(&self, uuids: &[String]) -> Result<String> {
        self.run_on(&["stop"], uuids).await
    }

    pub async fn setup(&self, uuids: &[String]) -> Result<String> {
        self.run_on(&["setup"], uuids).await
    }

    pub async fn remove_config(&self, uuids: &[String]) -> Result<String> {
        self.run_on(&["setup", "--remove"], uuids).await
    }

    pub async fn logs(&self, uuid: &str) -> Result<String> {
        self.run(&["log", uuid]).await
    }

    async fn run_on(&self, args: &[&str], uuids: &[String]) -> Result<String> {
        if uuids.is_empty() {
            bail!("no filesystems given for '{}'", args.join(" "));
        }
        let mut full: Vec<&str> = args.to_vec();
        full.extend(uuids.iter().map(String::as_str));
        self.run(&full).await
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());

        let output = timeout(CTL_TIMEOUT, cmd.output())
            .await
            .map_err(|_| anyhow!("{} {} timed out", self.program, args.join(" ")))?
            .with_context(|| format!("failed to execute {} {}", self.program, args.join(" ")))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            let detail = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            bail!(
                "{} {} exited with {}: {detail}",
                self.program,
                args.join(" "),
                output.status
            );
        }
        Ok(stdout.trim_end().to_string())
    }
}

fn parse_status_lines(output: &str) -> Vec<Filesystem> {
    let mut rows = Vec::new();
    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let (Some(uuid), Some(label), Some(status)) =
            (fields.next(), fields.next(), fields.next())
        else {
            warn!("skipping malformed status line: {line}");
            continue;
        };
        rows.push(Filesystem {
            uuid: uuid.to_string(),
            label: label.to_string(),
            status: DedupStatus::from_token(status),
        });
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::parse_status_lines;
    use crate::model::DedupStatus;

    #[test]
    fn parses_porcelain_status_output() {
        let output = "aaaa-bbbb\troot\trunning:20G:22G\n\
                      cccc-dddd\thome\tstopped\n\
                      eeee-ffff\tscratch\tunconfigured\n";
        let rows = parse_status_lines(output);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].uuid, "aaaa-bbbb");
        assert!(rows[0].status.is_running());
        assert_eq!(rows[1].status, DedupStatus::NotRunning);
        assert_eq!(rows[2].status, DedupStatus::NotConfigured);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let output = "just-a-uuid\n\naaaa\tlabel\tfailed\n";
        let rows = parse_status_lines(output);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, DedupStatus::FailedToRun);
    }
}
