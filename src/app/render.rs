// Formats status lines for the terminal.

use std::io::{self, Write};

use crossterm::queue;
use crossterm::style::{Color, Print, PrintStyledContent, Stylize};

use crate::supervisor::{Error, NormalizedStatus, ServiceName};

/// Symbol and colour shown in front of a resolution.
pub fn indicator(result: &Result<NormalizedStatus, Error>) -> (&'static str, Color) {
    match result {
        Ok(NormalizedStatus::Running) => ("●", Color::Green),
        Ok(status) if status.is_transitioning() => ("◐", Color::Yellow),
        Ok(NormalizedStatus::Unknown) => ("?", Color::Magenta),
        Ok(_) => ("○", Color::DarkGrey),
        Err(_) => ("✖", Color::Red),
    }
}

/// Writes one `[timestamp] ● name: Status` line.
pub fn render_status<W: Write>(
    out: &mut W,
    timestamp: &str,
    service: &ServiceName,
    result: &Result<NormalizedStatus, Error>,
) -> io::Result<()> {
    let (symbol, color) = indicator(result);
    let text = match result {
        Ok(status) => status.to_string(),
        Err(err) => format!("error: {err}"),
    };

    queue!(
        out,
        Print(format!("[{timestamp}] ")),
        PrintStyledContent(symbol.with(color)),
        Print(format!(" {service}: {text}\n"))
    )?;
    out.flush()
}

/// Writes the outcome of a start, stop or reset-failed request.
pub fn render_action<W: Write>(
    out: &mut W,
    verb: &str,
    service: &ServiceName,
    result: &Result<(), Error>,
) -> io::Result<()> {
    match result {
        Ok(()) => queue!(
            out,
            PrintStyledContent("✔".with(Color::Green)),
            Print(format!(" {verb} {service}: done\n"))
        )?,
        Err(err) => queue!(
            out,
            PrintStyledContent("✖".with(Color::Red)),
            Print(format!(" {verb} {service}: {err}\n"))
        )?,
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(result: &Result<NormalizedStatus, Error>) -> String {
        let mut out = Vec::new();
        render_status(&mut out, "12:00:00", &ServiceName::new("serval.service"), result).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn indicator_per_status() {
        assert_eq!(indicator(&Ok(NormalizedStatus::Running)).0, "●");
        assert_eq!(indicator(&Ok(NormalizedStatus::Stopping)).0, "◐");
        assert_eq!(indicator(&Ok(NormalizedStatus::Unknown)).0, "?");
        assert_eq!(indicator(&Ok(NormalizedStatus::NotFound)).0, "○");
        assert_eq!(
            indicator(&Err(Error::ConnectionFailed("x".into()))),
            ("✖", Color::Red)
        );
    }

    #[test]
    fn status_line_carries_timestamp_name_and_status() {
        let line = rendered(&Ok(NormalizedStatus::Other("reloading".into())));
        assert!(line.starts_with("[12:00:00] "));
        assert!(line.ends_with(" serval.service: reloading\n"));
    }

    #[test]
    fn error_line_carries_diagnostic() {
        let line = rendered(&Err(Error::RemoteCallFailed {
            method: "GetUnit".into(),
            message: "Access denied".into(),
        }));
        assert!(line.contains("error: GetUnit failed: Access denied"));
    }
}
