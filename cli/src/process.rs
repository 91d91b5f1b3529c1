use anyhow::{Context, bail};
use async_trait::async_trait;
use commands::{NodeId, RemoteCompletable, Suggestion};
use tokio::process::Command;

/// Fetches suggestions by running an external program.
///
/// Each non-empty stdout line is `text<TAB>description`; a line without a
/// tab is a bare text, and a line with nothing before the tab is a message.
#[derive(Debug, Clone)]
pub struct ProcessCompletable {
    command: NodeId,
    program: String,
    args: Vec<String>,
    children: Vec<NodeId>,
}

impl ProcessCompletable {
    pub fn new(command: NodeId, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command,
            program: program.into(),
            args,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<NodeId>) -> Self {
        self.children = children;
        self
    }
}

#[async_trait]
impl RemoteCompletable for ProcessCompletable {
    fn command(&self) -> NodeId {
        self.command
    }

    async fn fetch(&self) -> anyhow::Result<Vec<Suggestion>> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to run {}", self.program))?;

        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(parse_lines(&String::from_utf8_lossy(&output.stdout)))
    }

    fn completable_children(&self) -> &[NodeId] {
        &self.children
    }
}

pub fn parse_lines(stdout: &str) -> Vec<Suggestion> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| match line.split_once('\t') {
            Some((text, description)) if text.trim().is_empty() => {
                Suggestion::message(description.trim())
            }
            Some((text, description)) => Suggestion::new(text.trim(), description.trim()),
            None => Suggestion::new(line.trim(), ""),
        })
        .filter(|s| !s.is_blank())
        .collect()
}
