use std::fmt;
use std::path::PathBuf;

use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::texture::TextureId;

/// A control-layer request, decoded once at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Render {
        payload: String,
    },
    LoadTexture {
        source: String,
        id: TextureId,
    },
    UnloadTexture {
        id: TextureId,
    },
    /// Kept as the raw string; malformed colours are logged, never rejected.
    SetBackgroundColor {
        color: String,
    },
    SetOrtho {
        width: u32,
        height: u32,
    },
    FrameRequest,
    Capture {
        x: u32,
        y: u32,
        width: Option<u32>,
        height: Option<u32>,
        destination: String,
    },
    IsAvailable,
}

impl Action {
    /// Decodes `name` with its positional `args` array.
    ///
    /// `null` stands for "no arguments".
    pub fn decode(name: &str, args: &Value) -> Result<Self> {
        let args = Args::new(name, args)?;

        let action = match name {
            "render" => Action::Render {
                payload: args.string(0)?,
            },
            "loadTexture" => Action::LoadTexture {
                source: args.string(0)?,
                id: args.id(1)?,
            },
            "unloadTexture" => Action::UnloadTexture { id: args.id(0)? },
            "setBackgroundColor" => Action::SetBackgroundColor {
                color: args.string(0)?,
            },
            "setOrtho" => Action::SetOrtho {
                width: args.unsigned(0)?,
                height: args.unsigned(1)?,
            },
            "frameRequest" => Action::FrameRequest,
            "capture" => Action::Capture {
                x: args.opt_unsigned(0)?.unwrap_or(0),
                y: args.opt_unsigned(1)?.unwrap_or(0),
                width: args.extent(2)?,
                height: args.extent(3)?,
                destination: args.string(4)?,
            },
            "isAvailable" => Action::IsAvailable,
            other => {
                return Err(Error::InvalidArgument(format!("unknown action: {other}")));
            }
        };
        Ok(action)
    }

    /// Host-facing name.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Render { .. } => "render",
            Action::LoadTexture { .. } => "loadTexture",
            Action::UnloadTexture { .. } => "unloadTexture",
            Action::SetBackgroundColor { .. } => "setBackgroundColor",
            Action::SetOrtho { .. } => "setOrtho",
            Action::FrameRequest => "frameRequest",
            Action::Capture { .. } => "capture",
            Action::IsAvailable => "isAvailable",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Payloads can be large; keep log lines short.
            Action::Render { payload } => write!(f, "render ({} bytes)", payload.len()),
            Action::LoadTexture { source, id } => write!(f, "loadTexture {source}{id}"),
            Action::UnloadTexture { id } => write!(f, "unloadTexture {id}"),
            Action::SetBackgroundColor { color } => write!(f, "setBackgroundColor {color}"),
            Action::SetOrtho { width, height } => write!(f, "setOrtho {width}x{height}"),
            Action::Capture { destination, .. } => write!(f, "capture -> {destination}"),
            other => f.write_str(other.name()),
        }
    }
}

/// Successful reply to an [`Action`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResult {
    /// Fire-and-forget actions.
    Accepted,
    Dimensions { width: u32, height: u32 },
    /// Index of the frame that satisfied a frame request.
    Frame(u64),
    Captured(PathBuf),
    Available(bool),
}

impl ActionResult {
    /// Renders the reply in the host's shape.
    pub fn to_json(&self) -> Value {
        match self {
            ActionResult::Accepted => Value::Null,
            ActionResult::Dimensions { width, height } => json!([width, height]),
            ActionResult::Frame(index) => json!(index),
            ActionResult::Captured(path) => json!(path.display().to_string()),
            ActionResult::Available(available) => json!(available),
        }
    }
}

/// Positional argument accessor with uniform error messages.
struct Args<'a> {
    action: &'a str,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    fn new(action: &'a str, args: &'a Value) -> Result<Self> {
        let values = match args {
            Value::Array(values) => values.as_slice(),
            Value::Null => &[],
            other => {
                return Err(Error::InvalidArgument(format!(
                    "{action}: arguments must be an array, got {other}"
                )));
            }
        };
        Ok(Self { action, values })
    }

    fn get(&self, index: usize) -> Option<&'a Value> {
        self.values.get(index).filter(|v| !v.is_null())
    }

    fn invalid(&self, index: usize, expected: &str) -> Error {
        Error::InvalidArgument(format!(
            "{}: argument {index} must be {expected}",
            self.action
        ))
    }

    fn string(&self, index: usize) -> Result<String> {
        self.get(index)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| self.invalid(index, "a string"))
    }

    fn integer(&self, index: usize) -> Result<Option<i64>> {
        match self.get(index) {
            None => Ok(None),
            Some(v) => v
                .as_i64()
                .map(Some)
                .ok_or_else(|| self.invalid(index, "an integer")),
        }
    }

    fn id(&self, index: usize) -> Result<TextureId> {
        self.integer(index)?
            .and_then(|v| i32::try_from(v).ok())
            .map(TextureId)
            .ok_or_else(|| self.invalid(index, "a texture id"))
    }

    fn unsigned(&self, index: usize) -> Result<u32> {
        self.opt_unsigned(index)?
            .ok_or_else(|| self.invalid(index, "a non-negative integer"))
    }

    fn opt_unsigned(&self, index: usize) -> Result<Option<u32>> {
        match self.integer(index)? {
            None => Ok(None),
            Some(v) => u32::try_from(v)
                .map(Some)
                .map_err(|_| self.invalid(index, "a non-negative integer")),
        }
    }

    /// Capture extent; absent or negative means "to the surface edge".
    fn extent(&self, index: usize) -> Result<Option<u32>> {
        match self.integer(index)? {
            Some(v) if v >= 0 => u32::try_from(v)
                .map(Some)
                .map_err(|_| self.invalid(index, "a surface extent")),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid(name: &str, args: Value) -> bool {
        matches!(Action::decode(name, &args), Err(Error::InvalidArgument(_)))
    }

    // ── decode ────────────────────────────────────────────────────────────

    #[test]
    fn decodes_every_action() {
        let cases = [
            ("render", json!(["payload"]), Action::Render { payload: "payload".into() }),
            (
                "loadTexture",
                json!(["img/a.png", 3]),
                Action::LoadTexture { source: "img/a.png".into(), id: TextureId(3) },
            ),
            ("unloadTexture", json!([3]), Action::UnloadTexture { id: TextureId(3) }),
            (
                "setBackgroundColor",
                json!(["ff8000"]),
                Action::SetBackgroundColor { color: "ff8000".into() },
            ),
            ("setOrtho", json!([320, 480]), Action::SetOrtho { width: 320, height: 480 }),
            ("frameRequest", json!([]), Action::FrameRequest),
            ("isAvailable", Value::Null, Action::IsAvailable),
        ];
        for (name, args, expected) in cases {
            let action = Action::decode(name, &args).unwrap();
            assert_eq!(action, expected);
            assert_eq!(action.name(), name);
        }
    }

    #[test]
    fn capture_defaults_origin_and_extent() {
        let action = Action::decode("capture", &json!([null, null, -1, -1, "/shots/a.png"])).unwrap();
        assert_eq!(
            action,
            Action::Capture {
                x: 0,
                y: 0,
                width: None,
                height: None,
                destination: "/shots/a.png".into(),
            }
        );

        let action = Action::decode("capture", &json!([10, 20, 30, 40, "b.png"])).unwrap();
        assert!(matches!(
            action,
            Action::Capture { x: 10, y: 20, width: Some(30), height: Some(40), .. }
        ));
    }

    #[test]
    fn rejects_unknown_and_malformed() {
        assert!(invalid("explode", json!([])));
        assert!(invalid("render", json!([])));
        assert!(invalid("render", json!({"payload": "x"})));
        assert!(invalid("loadTexture", json!(["a.png", "one"])));
        assert!(invalid("loadTexture", json!(["a.png", 1u64 << 40])));
        assert!(invalid("setOrtho", json!([-1, 10])));
        assert!(invalid("capture", json!([0, 0, 10, 10])));
    }

    // ── results ───────────────────────────────────────────────────────────

    #[test]
    fn results_render_in_host_shape() {
        assert_eq!(ActionResult::Dimensions { width: 100, height: 60 }.to_json(), json!([100, 60]));
        assert_eq!(ActionResult::Available(true).to_json(), json!(true));
        assert_eq!(ActionResult::Frame(7).to_json(), json!(7));
        assert_eq!(ActionResult::Accepted.to_json(), Value::Null);
        assert_eq!(
            ActionResult::Captured(PathBuf::from("/data/a.png")).to_json(),
            json!("/data/a.png")
        );
    }
}
