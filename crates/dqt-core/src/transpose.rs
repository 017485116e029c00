use crate::command::{Args, Command};
use crate::error::Error;
use crate::parser::parse_commands;
use crate::render::render;

/// Where the emulator lives on the invoking host and where it is placed
/// inside the image. Both paths are passed through verbatim; existence checks
/// belong to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransposeOptions {
    pub host_qemu_path: String,
    pub container_qemu_path: String,
}

impl TransposeOptions {
    pub fn new(host_qemu_path: impl Into<String>, container_qemu_path: impl Into<String>) -> Self {
        Self {
            host_qemu_path: host_qemu_path.into(),
            container_qemu_path: container_qemu_path.into(),
        }
    }
}

/// Rewrite a Dockerfile so its RUN steps execute under the emulator.
///
/// A `COPY [host, container]` is injected immediately after every FROM, so
/// each stage of a multi-stage build gets its own copy of the emulator
/// before any execution step runs in that stage. Every RUN is rewritten to
/// hand its payload to the emulator as one shell command string; all other
/// instructions pass through untouched.
pub fn transpose(dockerfile: &str, options: &TransposeOptions) -> Result<String, Error> {
    let commands = parse_commands(dockerfile)?;

    let mut output = Vec::with_capacity(commands.len() + 1);
    for command in commands {
        if command.name == "FROM" {
            output.push(command);
            output.push(qemu_copy(options));
            continue;
        }
        output.push(transpose_command(command, options)?);
    }

    Ok(render(&output))
}

fn qemu_copy(options: &TransposeOptions) -> Command {
    Command::list(
        "COPY",
        vec![
            options.host_qemu_path.clone(),
            options.container_qemu_path.clone(),
        ],
    )
}

fn transpose_command(command: Command, options: &TransposeOptions) -> Result<Command, Error> {
    match command.name.as_str() {
        "RUN" => transpose_run(command, options),
        _ => Ok(command),
    }
}

/// `-execve` makes the emulator run the command directly instead of
/// re-executing through its own loader path. The emulator expects one
/// coherent shell command string for `/bin/sh -c`, so exec-form tokens are
/// escaped individually and joined with single spaces.
fn transpose_run(command: Command, options: &TransposeOptions) -> Result<Command, Error> {
    let shell_command = match &command.args {
        Args::List(tokens) => tokens
            .iter()
            .map(|token| escape_double_quotes(token))
            .collect::<Vec<_>>()
            .join(" "),
        Args::Shell(text) => escape_double_quotes(text),
        Args::Pairs(_) => {
            return Err(Error::payload_shape(
                "RUN arguments must be a token list or a shell string",
            ));
        }
    };

    Ok(Command::list(
        "RUN",
        vec![
            options.container_qemu_path.clone(),
            "-execve".to_string(),
            "/bin/sh".to_string(),
            "-c".to_string(),
            shell_command,
        ],
    ))
}

// Escaping is limited to double quotes on purpose: behavior for other shell
// metacharacters is an extension point, not something to redefine here.
fn escape_double_quotes(input: &str) -> String {
    input.replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use crate::command::Command;
    use crate::error::Error;
    use crate::transpose::{TransposeOptions, transpose, transpose_command};

    fn options() -> TransposeOptions {
        TransposeOptions::new("qemu-arm", "/usr/local/bin/qemu")
    }

    #[test]
    fn injects_copy_after_from_and_rewrites_both_run_forms() {
        let dockerfile = "FROM ubuntu\n\
                          RUN apt-get install something\n\
                          RUN [\"ls\",\"-al\"]\n";
        let expected = "FROM ubuntu\n\
                        COPY [\"qemu-arm\",\"/usr/local/bin/qemu\"]\n\
                        RUN [\"/usr/local/bin/qemu\",\"-execve\",\"/bin/sh\",\"-c\",\"apt-get install something\"]\n\
                        RUN [\"/usr/local/bin/qemu\",\"-execve\",\"/bin/sh\",\"-c\",\"ls -al\"]\n";
        let output = transpose(dockerfile, &options()).expect("transpose should succeed");
        assert_eq!(output, expected);
    }

    #[test]
    fn injects_one_copy_per_stage() {
        let dockerfile = "FROM alpine AS builder\n\
                          RUN apk add curl\n\
                          FROM alpine\n\
                          RUN echo done\n";
        let output = transpose(dockerfile, &options()).expect("transpose should succeed");

        let copy_line = "COPY [\"qemu-arm\",\"/usr/local/bin/qemu\"]";
        assert_eq!(output.matches(copy_line).count(), 2);

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "FROM alpine AS builder");
        assert_eq!(lines[1], copy_line);
        assert_eq!(lines[3], "FROM alpine");
        assert_eq!(lines[4], copy_line);
    }

    #[test]
    fn escapes_double_quotes_in_both_run_forms() {
        let dockerfile = "FROM ubuntu\n\
                          RUN bash -c \"ls -l\"\n\
                          RUN [\"bash\", \"-c\", \"echo\", \"a \\\"string\\\" with \\\"quotes\\\"\"]\n";
        let expected = "FROM ubuntu\n\
                        COPY [\"qemu-arm\",\"/usr/local/bin/qemu\"]\n\
                        RUN [\"/usr/local/bin/qemu\",\"-execve\",\"/bin/sh\",\"-c\",\"bash -c \\\"ls -l\\\"\"]\n\
                        RUN [\"/usr/local/bin/qemu\",\"-execve\",\"/bin/sh\",\"-c\",\"bash -c echo a \\\"string\\\" with \\\"quotes\\\"\"]\n";
        let output = transpose(dockerfile, &options()).expect("transpose should succeed");
        assert_eq!(output, expected);
    }

    #[test]
    fn non_run_instructions_keep_their_content() {
        let dockerfile = "FROM ubuntu\n\
                          WORKDIR /usr/src/app\n\
                          COPY my-file my-container-file\n\
                          CMD bash -c \"sleep 12\"\n";
        let output = transpose(dockerfile, &options()).expect("transpose should succeed");

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[2], "WORKDIR /usr/src/app");
        assert_eq!(lines[3], "COPY [\"my-file\",\"my-container-file\"]");
        assert_eq!(lines[4], "CMD bash -c \"sleep 12\"");
    }

    #[test]
    fn dockerfile_without_from_gets_no_injection() {
        let dockerfile = "ARG VERSION=1.0\n";
        let output = transpose(dockerfile, &options()).expect("transpose should succeed");
        assert_eq!(output, "ARG VERSION=1.0\n");
    }

    #[test]
    fn transposing_twice_is_deterministic() {
        let dockerfile = "FROM ubuntu\nRUN apt-get update\n";
        let first = transpose(dockerfile, &options()).expect("transpose should succeed");
        let second = transpose(dockerfile, &options()).expect("transpose should succeed");
        assert_eq!(first, second);
    }

    #[test]
    fn run_with_pair_payload_fails_fast() {
        let command = Command::pairs("RUN", vec![("k".to_string(), "v".to_string())]);
        let err = transpose_command(command, &options())
            .expect_err("pair payload should be rejected");
        assert!(matches!(err, Error::PayloadShape { .. }));
    }

    #[test]
    fn malformed_dockerfile_propagates_parse_error() {
        let err = transpose("FROM\n", &options()).expect_err("bare FROM should not parse");
        assert!(matches!(err, Error::DockerfileParse { .. }));
    }
}
