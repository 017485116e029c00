use std::io::{BufRead, Write};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::Error;

static STEP_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^step \d+(?:/\d+)? ?:\s*").unwrap());

/// Strips the emulator invocation out of a build engine's step announcement
/// lines so an emulated build reads like a native one. Cosmetic only: line
/// order and count are never altered, and lines that are not RUN step
/// announcements pass through untouched.
pub struct BuildLogFilter {
    exec_prefix: String,
    shell_prefix: String,
}

impl BuildLogFilter {
    pub fn new(container_qemu_path: &str) -> Self {
        Self {
            exec_prefix: format!("[\"{container_qemu_path}\",\"-execve\",\"/bin/sh\",\"-c\",\""),
            shell_prefix: format!("{container_qemu_path} -execve /bin/sh -c "),
        }
    }

    pub fn filter_line(&self, line: &str) -> String {
        let Some(matched) = STEP_LINE.find(line) else {
            return line.to_string();
        };
        let Some(body) = strip_run_keyword(&line[matched.end()..]) else {
            return line.to_string();
        };

        if let Some(command) = body
            .strip_prefix(self.exec_prefix.as_str())
            .and_then(|tail| tail.strip_suffix("\"]"))
        {
            return format!(
                "{}RUN {}",
                &line[..matched.end()],
                unescape_double_quotes(command)
            );
        }
        if let Some(command) = body.strip_prefix(self.shell_prefix.as_str()) {
            return format!("{}RUN {}", &line[..matched.end()], command);
        }
        line.to_string()
    }

    pub fn filter<R: BufRead, W: Write>(&self, input: R, mut output: W) -> Result<(), Error> {
        for line in input.lines() {
            let line = line?;
            writeln!(output, "{}", self.filter_line(&line))?;
        }
        Ok(())
    }
}

fn strip_run_keyword(rest: &str) -> Option<&str> {
    let trimmed = rest.trim_start();
    let keyword = trimmed.split_whitespace().next()?;
    if !keyword.eq_ignore_ascii_case("RUN") {
        return None;
    }
    Some(trimmed[keyword.len()..].trim_start())
}

fn unescape_double_quotes(input: &str) -> String {
    input.replace("\\\"", "\"")
}

#[cfg(test)]
mod tests {
    use crate::log_filter::BuildLogFilter;

    fn filter() -> BuildLogFilter {
        BuildLogFilter::new("/usr/local/bin/qemu")
    }

    #[test]
    fn restores_exec_form_run_step_lines() {
        let line = "Step 2/4 : RUN [\"/usr/local/bin/qemu\",\"-execve\",\"/bin/sh\",\"-c\",\"apt-get update\"]";
        assert_eq!(filter().filter_line(line), "Step 2/4 : RUN apt-get update");
    }

    #[test]
    fn unescapes_quotes_in_the_restored_command() {
        let line = "Step 3/4 : RUN [\"/usr/local/bin/qemu\",\"-execve\",\"/bin/sh\",\"-c\",\"bash -c \\\"ls -l\\\"\"]";
        assert_eq!(
            filter().filter_line(line),
            "Step 3/4 : RUN bash -c \"ls -l\""
        );
    }

    #[test]
    fn restores_shell_form_run_step_lines() {
        let line = "Step 2/4 : RUN /usr/local/bin/qemu -execve /bin/sh -c apt-get update";
        assert_eq!(filter().filter_line(line), "Step 2/4 : RUN apt-get update");
    }

    #[test]
    fn step_prefix_matches_case_insensitively_without_total() {
        let line = "step 2 : RUN [\"/usr/local/bin/qemu\",\"-execve\",\"/bin/sh\",\"-c\",\"ls\"]";
        assert_eq!(filter().filter_line(line), "step 2 : RUN ls");
    }

    #[test]
    fn non_run_step_lines_pass_through() {
        let line = "Step 1/4 : FROM ubuntu";
        assert_eq!(filter().filter_line(line), line);
    }

    #[test]
    fn lines_without_a_step_prefix_pass_through() {
        let line = " ---> Running in 0123456789ab";
        assert_eq!(filter().filter_line(line), line);
    }

    #[test]
    fn stream_filter_preserves_line_order_and_count() {
        let input = "Step 1/2 : FROM ubuntu\n\
                     Step 2/2 : RUN [\"/usr/local/bin/qemu\",\"-execve\",\"/bin/sh\",\"-c\",\"ls\"]\n\
                     ---> done\n";
        let mut output = Vec::new();
        filter()
            .filter(input.as_bytes(), &mut output)
            .expect("filtering should succeed");
        assert_eq!(
            String::from_utf8(output).expect("output should be utf-8"),
            "Step 1/2 : FROM ubuntu\nStep 2/2 : RUN ls\n---> done\n"
        );
    }
}
