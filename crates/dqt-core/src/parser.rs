use dockerfile_parser::{
    BreakableString, BreakableStringComponent, Dockerfile, Instruction as ParsedInstruction,
    ShellOrExecExpr,
};

use crate::command::Command;
use crate::error::Error;

/// Map a Dockerfile onto the neutral command model, comments excluded.
///
/// The grammar itself belongs to the `dockerfile-parser` crate; this adapter
/// only decides which payload shape each instruction carries. Instructions
/// whose arguments must survive verbatim (FROM with flags and aliases, ARG
/// tokens, misc instructions) are sliced from the source text rather than
/// rebuilt from parsed fields.
pub fn parse_commands(input: &str) -> Result<Vec<Command>, Error> {
    let dockerfile =
        Dockerfile::parse(input).map_err(|err| Error::dockerfile_parse(format!("{err}")))?;

    dockerfile
        .instructions
        .iter()
        .map(|instruction| map_instruction(instruction, &dockerfile.content))
        .collect()
}

fn map_instruction(instruction: &ParsedInstruction, content: &str) -> Result<Command, Error> {
    let command = match instruction {
        ParsedInstruction::From(_) => {
            Command::shell("FROM", raw_arguments(instruction, content)?)
        }
        ParsedInstruction::Arg(_) => {
            Command::list("ARG", vec![raw_arguments(instruction, content)?])
        }
        ParsedInstruction::Run(run) => shell_or_exec("RUN", &run.expr),
        ParsedInstruction::Cmd(cmd) => shell_or_exec("CMD", &cmd.expr),
        ParsedInstruction::Entrypoint(entrypoint) => {
            shell_or_exec("ENTRYPOINT", &entrypoint.expr)
        }
        ParsedInstruction::Copy(copy) => {
            let mut tokens: Vec<String> = copy
                .flags
                .iter()
                .map(|flag| format!("--{}={}", flag.name.content, flag.value.content))
                .collect();
            tokens.extend(copy.sources.iter().map(|source| source.content.clone()));
            tokens.push(copy.destination.content.clone());
            Command::list("COPY", tokens)
        }
        ParsedInstruction::Env(env) => Command::pairs(
            "ENV",
            env.vars
                .iter()
                .map(|var| (var.key.content.clone(), flatten(&var.value)))
                .collect(),
        ),
        ParsedInstruction::Label(label) => Command::pairs(
            "LABEL",
            label
                .labels
                .iter()
                .map(|entry| (entry.name.content.clone(), entry.value.content.clone()))
                .collect(),
        ),
        ParsedInstruction::Misc(misc) => Command::shell(
            misc.instruction.content.clone(),
            raw_arguments(instruction, content)?,
        ),
    };

    Ok(command)
}

fn shell_or_exec(name: &str, expr: &ShellOrExecExpr) -> Command {
    match expr {
        ShellOrExecExpr::Shell(text) => Command::shell(name, flatten(text)),
        ShellOrExecExpr::Exec(array) => Command::list(
            name,
            array
                .elements
                .iter()
                .map(|element| element.content.clone())
                .collect(),
        ),
    }
}

/// Shell-form strings may be broken across continuation lines with embedded
/// comments; join the string components and drop the comments.
fn flatten(text: &BreakableString) -> String {
    let mut out = String::new();
    for component in &text.components {
        if let BreakableStringComponent::String(part) = component {
            out.push_str(&part.content);
        }
    }
    out
}

/// The instruction's raw source text with the leading keyword stripped.
fn raw_arguments(instruction: &ParsedInstruction, content: &str) -> Result<String, Error> {
    let span = instruction.span();
    let raw = span_slice(content, span.start, span.end)?;
    Ok(match raw.split_once(char::is_whitespace) {
        Some((_, rest)) => rest.trim().to_string(),
        None => String::new(),
    })
}

fn span_slice(content: &str, start: usize, end: usize) -> Result<String, Error> {
    let bytes = content.as_bytes();
    if start > end || end > bytes.len() {
        return Err(Error::dockerfile_parse(format!(
            "invalid instruction span {start}..{end}"
        )));
    }

    let slice = &bytes[start..end];
    let text = std::str::from_utf8(slice)
        .map_err(|_| Error::dockerfile_parse(format!("invalid utf-8 in span {start}..{end}")))?;
    Ok(text.to_string())
}
