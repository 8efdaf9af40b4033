use std::io::{IsTerminal, Write};

use anstyle::{AnsiColor, Effects, Style};
use anyhow::{Context, Result};
use nodeagent_core::Outcome;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

/// Rich only when stderr is a terminal and `NO_COLOR` is unset.
pub(crate) fn current_output_style() -> OutputStyle {
    let no_color = std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty());
    if !no_color && std::io::stderr().is_terminal() {
        OutputStyle::Rich
    } else {
        OutputStyle::Plain
    }
}

/// Writes the outcome as indented JSON followed by a newline.
pub(crate) fn write_outcome<W: Write>(outcome: &Outcome, writer: &mut W) -> Result<()> {
    let rendered = outcome.to_pretty_json()?;
    writer
        .write_all(rendered.as_bytes())
        .with_context(|| "failed writing outcome")?;
    writer
        .write_all(b"\n")
        .with_context(|| "failed writing outcome delimiter")?;
    writer.flush().with_context(|| "failed flushing outcome")?;
    Ok(())
}

/// One-line human summary for interactive terminals; nothing in plain mode.
pub(crate) fn render_status_line(style: OutputStyle, outcome: &Outcome) -> Option<String> {
    if style == OutputStyle::Plain {
        return None;
    }

    let (badge, badge_style) = if outcome.error {
        ("[ERR]", error_style())
    } else {
        ("[OK]", ok_style())
    };
    let mut line = format!(
        "{} {}",
        colorize(badge_style, badge),
        colorize(action_style(), outcome.action.as_str())
    );
    if !outcome.message.is_empty() {
        line.push_str(": ");
        line.push_str(&outcome.message);
    }
    Some(line)
}

fn ok_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightGreen.into()))
        .effects(Effects::BOLD)
}

fn error_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightRed.into()))
        .effects(Effects::BOLD)
}

fn action_style() -> Style {
    Style::new().fg_color(Some(AnsiColor::BrightCyan.into()))
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}
