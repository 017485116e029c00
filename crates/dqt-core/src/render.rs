use crate::command::{Args, Command};

/// Serialize a command sequence back into Dockerfile text, one instruction
/// per line. No escaping happens here beyond the pair-value quoting; list
/// tokens are emitted verbatim, so payloads that need shell-safety must be
/// pre-escaped by whoever builds the command (the transposer does this for
/// the RUN payloads it generates).
pub fn render(commands: &[Command]) -> String {
    let mut out = String::new();
    for command in commands {
        out.push_str(&command.name);
        out.push(' ');
        out.push_str(&render_args(command));
        out.push('\n');
    }
    out
}

fn render_args(command: &Command) -> String {
    match &command.args {
        // ARG takes a single bare KEY or KEY=value token; wrapping it in
        // list/quote syntax would change its meaning.
        Args::List(tokens) if command.name == "ARG" => {
            tokens.first().cloned().unwrap_or_default()
        }
        Args::List(tokens) => render_list(tokens),
        Args::Pairs(pairs) => pairs
            .iter()
            .map(|(key, value)| format!("{key}={}", quote(value)))
            .collect::<Vec<_>>()
            .join(" "),
        Args::Shell(text) => text.clone(),
    }
}

fn render_list(tokens: &[String]) -> String {
    // Meta flags such as --from=stage sit ahead of the quoted argument list.
    if let Some((first, rest)) = tokens.split_first()
        && first.starts_with("--")
    {
        return format!("{first} {}", bracketed(rest));
    }
    bracketed(tokens)
}

fn bracketed(tokens: &[String]) -> String {
    let mut out = String::from("[");
    for (idx, token) in tokens.iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        out.push('"');
        out.push_str(token);
        out.push('"');
    }
    out.push(']');
    out
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}
