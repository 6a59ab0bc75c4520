use std::io::BufRead;

use anyhow::{bail, Context, Result};
use fastcanvas_engine::sync::Completion;
use fastcanvas_engine::{Action, ActionResult, Bridge};
use serde_json::Value;

/// One parsed script line: `["action", [args...]]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLine {
    pub number: usize,
    pub name: String,
    pub args: Value,
}

/// Parses a line; blank lines and `#` comments yield `None`.
pub fn parse_line(number: usize, line: &str) -> Result<Option<ScriptLine>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let value: Value =
        serde_json::from_str(line).with_context(|| format!("line {number}: invalid JSON"))?;
    let Value::Array(mut parts) = value else {
        bail!("line {number}: expected [\"action\", [args...]]");
    };
    if parts.is_empty() || parts.len() > 2 {
        bail!("line {number}: expected [\"action\", [args...]]");
    }

    let args = if parts.len() == 2 { parts.remove(1) } else { Value::Null };
    let name = match parts.remove(0) {
        Value::String(name) => name,
        other => bail!("line {number}: action name must be a string, got {other}"),
    };

    Ok(Some(ScriptLine { number, name, args }))
}

/// Plays a script against `bridge`.
///
/// Frame requests block until the frame resolves, so the script runs at the
/// render rate. Other replies are logged as they arrive. Returns how many
/// actions were executed.
pub fn play(bridge: &Bridge, reader: impl BufRead) -> Result<usize> {
    let mut executed = 0;
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("failed to read script")?;
        let Some(entry) = parse_line(index + 1, &line)? else {
            continue;
        };

        let action = match Action::decode(&entry.name, &entry.args) {
            Ok(action) => action,
            Err(err) => {
                log::error!("line {}: {err}", entry.number);
                continue;
            }
        };
        executed += 1;

        if action == Action::FrameRequest {
            match bridge.execute_blocking(action) {
                Ok(result) => log::debug!("line {}: frame {}", entry.number, result.to_json()),
                Err(err) => {
                    log::warn!("line {}: frame request failed: {err}; stopping script", entry.number);
                    break;
                }
            }
            continue;
        }

        let number = entry.number;
        let label = action.to_string();
        bridge.execute(
            action,
            Completion::new(move |outcome: fastcanvas_engine::Result<ActionResult>| match outcome {
                Ok(ActionResult::Accepted) => {}
                Ok(result) => log::info!("line {number}: {label} -> {}", result.to_json()),
                Err(err) => log::warn!("line {number}: {label} failed: {err}"),
            }),
        );
    }
    Ok(executed)
}
