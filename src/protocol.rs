//! Wire protocol between the terminal client and the shell server.
//!
//! Every message is a WebSocket text payload holding one JSON object:
//! `{"input": "..."}` from the client, `{"output": "..."}` from the server.
//! Resize frames (`{"resize": {"rows": r, "cols": c}}`) are an optional
//! extension that servers which don't know them simply ignore.

use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::{SessionError, TransportError};
use crate::surface::Geometry;

/// Query parameter carrying the working directory.
pub const PATH_PARAM: &str = "path";

/// Frames sent from the client to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientFrame {
    /// Raw keystroke or paste bytes.
    Input(String),
    /// Local terminal geometry changed.
    Resize(Geometry),
}

impl ClientFrame {
    /// Serialize to the JSON text payload.
    pub fn encode(&self) -> Result<String, TransportError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Frames received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFrame {
    /// Raw bytes to render, possibly containing control sequences.
    Output(String),
    /// Valid JSON object without a recognized key.
    Unknown { keys: Vec<String> },
}

impl ServerFrame {
    /// Decode one text payload.
    ///
    /// Non-JSON payloads, non-object JSON and a non-string `output` value are
    /// malformed. An object without `output` decodes to `Unknown`.
    pub fn decode(text: &str) -> Result<Self, SessionError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| SessionError::MalformedFrame(e.to_string()))?;

        let Value::Object(mut map) = value else {
            return Err(SessionError::MalformedFrame(
                "expected a JSON object".to_string(),
            ));
        };

        match map.remove("output") {
            Some(Value::String(output)) => Ok(ServerFrame::Output(output)),
            Some(other) => Err(SessionError::MalformedFrame(format!(
                "`output` must be a string, got {}",
                json_kind(&other)
            ))),
            None => Ok(ServerFrame::Unknown {
                keys: map.keys().cloned().collect(),
            }),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Where the shell server lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// `host[:port]` of the server.
    pub host: String,
    /// Use `wss`/`https` instead of `ws`/`http`.
    pub secure: bool,
    /// Session endpoint path, e.g. `ws/shell`.
    pub path: String,
}

impl Endpoint {
    /// Build the socket address for a session rooted at `working_directory`.
    pub fn session_url(&self, working_directory: &str) -> Result<Url, url::ParseError> {
        let scheme = if self.secure { "wss" } else { "ws" };
        let mut url = Url::parse(&format!(
            "{}://{}/{}",
            scheme,
            self.host,
            self.path.trim_start_matches('/')
        ))?;
        url.query_pairs_mut()
            .append_pair(PATH_PARAM, working_directory);
        Ok(url)
    }

    /// Build the HTTP address of a server resource with the same transport security.
    pub fn http_url(&self, path: &str) -> Result<Url, url::ParseError> {
        let scheme = if self.secure { "https" } else { "http" };
        Url::parse(&format!(
            "{}://{}/{}",
            scheme,
            self.host,
            path.trim_start_matches('/')
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(secure: bool) -> Endpoint {
        Endpoint {
            host: "localhost:8000".to_string(),
            secure,
            path: "/ws/shell".to_string(),
        }
    }

    #[test]
    fn input_frame_encodes_as_single_key_object() {
        let json = ClientFrame::Input("ls\r".to_string()).encode().unwrap();
        assert_eq!(json, r#"{"input":"ls\r"}"#);
    }

    #[test]
    fn resize_frame_encodes_rows_and_cols() {
        let geometry = Geometry::new(24, 80).unwrap();
        let json = ClientFrame::Resize(geometry).encode().unwrap();
        assert_eq!(json, r#"{"resize":{"rows":24,"cols":80}}"#);
    }

    #[test]
    fn output_frame_decodes_verbatim() {
        let frame = ServerFrame::decode(r#"{"output":"file1.yaml\nfile2.yaml\n"}"#).unwrap();
        assert_eq!(
            frame,
            ServerFrame::Output("file1.yaml\nfile2.yaml\n".to_string())
        );
    }

    #[test]
    fn output_keeps_escape_sequences() {
        let frame = ServerFrame::decode(r#"{"output":"\u001b[31mred\u001b[0m"}"#).unwrap();
        assert_eq!(frame, ServerFrame::Output("\x1b[31mred\x1b[0m".to_string()));
    }

    #[test]
    fn unknown_keys_are_reported_not_rejected() {
        let frame = ServerFrame::decode(r#"{"status":"ok"}"#).unwrap();
        assert_eq!(
            frame,
            ServerFrame::Unknown {
                keys: vec!["status".to_string()]
            }
        );
    }

    #[test]
    fn extra_keys_next_to_output_are_ignored() {
        let frame = ServerFrame::decode(r#"{"output":"x","seq":4}"#).unwrap();
        assert_eq!(frame, ServerFrame::Output("x".to_string()));
    }

    #[test]
    fn non_json_is_malformed() {
        let err = ServerFrame::decode("not json").unwrap_err();
        assert!(matches!(err, SessionError::MalformedFrame(_)));
    }

    #[test]
    fn non_object_json_is_malformed() {
        assert!(matches!(
            ServerFrame::decode("[1,2]"),
            Err(SessionError::MalformedFrame(_))
        ));
        assert!(matches!(
            ServerFrame::decode(r#"{"output":42}"#),
            Err(SessionError::MalformedFrame(_))
        ));
    }

    #[test]
    fn session_url_encodes_working_directory() {
        let url = endpoint(false).session_url("/home/user/playbooks").unwrap();
        assert_eq!(
            url.as_str(),
            "ws://localhost:8000/ws/shell?path=%2Fhome%2Fuser%2Fplaybooks"
        );
    }

    #[test]
    fn secure_endpoint_uses_wss_and_https() {
        let endpoint = endpoint(true);
        assert_eq!(endpoint.session_url("/").unwrap().scheme(), "wss");
        assert_eq!(
            endpoint.http_url("api/config").unwrap().as_str(),
            "https://localhost:8000/api/config"
        );
    }
}
