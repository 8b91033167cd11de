//! Codec de frames STOMP 1.2 sobre mensajes de texto WebSocket.
//!
//! Formato: `COMANDO\n` + `clave:valor\n`* + `\n` + body + `\0`. Los headers
//! se escapan (`\\`, `\n`, `\r`, `\c`) salvo en `CONNECT` y `CONNECTED`.
//! Un mensaje compuesto sólo de fines de línea es un heart-beat.
use crate::errors::AdapterError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StompFrame {
    pub command: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl StompFrame {
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into(),
               headers: Vec::new(),
               body: String::new() }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Primer valor del header (STOMP 1.2: la primera ocurrencia gana).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    fn escapes_headers(&self) -> bool {
        !matches!(self.command.as_str(), "CONNECT" | "CONNECTED")
    }

    pub fn encode(&self) -> String {
        let escape = self.escapes_headers();
        let mut out = String::with_capacity(self.body.len() + 64);
        out.push_str(&self.command);
        out.push('\n');
        for (k, v) in &self.headers {
            if escape {
                out.push_str(&escape_header(k));
                out.push(':');
                out.push_str(&escape_header(v));
            } else {
                out.push_str(k);
                out.push(':');
                out.push_str(v);
            }
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }

    /// `Ok(None)` para heart-beats.
    pub fn decode(text: &str) -> Result<Option<Self>, AdapterError> {
        if text.chars().all(|c| c == '\n' || c == '\r') {
            return Ok(None);
        }
        let text = text.trim_start_matches(['\n', '\r']);
        let (head, rest) = match text.find("\n\n") {
            Some(i) => (&text[..i], &text[i + 2..]),
            None => match text.find("\r\n\r\n") {
                Some(i) => (&text[..i], &text[i + 4..]),
                None => return Err(AdapterError::Stomp("frame without header terminator".into())),
            },
        };
        let mut lines = head.lines();
        let command = lines.next()
                           .map(|l| l.trim_end_matches('\r').to_string())
                           .filter(|c| !c.is_empty())
                           .ok_or_else(|| AdapterError::Stomp("frame without command".into()))?;
        let mut frame = StompFrame::new(command);
        let escape = frame.escapes_headers();
        for line in lines {
            let line = line.trim_end_matches('\r');
            let (k, v) = line.split_once(':')
                             .ok_or_else(|| AdapterError::Stomp(format!("malformed header '{line}'")))?;
            let (k, v) = if escape {
                (unescape_header(k)?, unescape_header(v)?)
            } else {
                (k.to_string(), v.to_string())
            };
            frame.headers.push((k, v));
        }

        let body = match frame.get("content-length").and_then(|l| l.parse::<usize>().ok()) {
            Some(len) if len <= rest.len() && rest.is_char_boundary(len) => &rest[..len],
            _ => rest.split('\0').next().unwrap_or_default(),
        };
        frame.body = body.to_string();
        Ok(Some(frame))
    }
}

fn escape_header(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

fn unescape_header(s: &str) -> Result<String, AdapterError> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            other => return Err(AdapterError::Stomp(format!("invalid header escape '\\{}'", other.unwrap_or(' ')))),
        }
    }
    Ok(out)
}
