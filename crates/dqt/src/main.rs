use std::io::{Read, Write};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum, error::ErrorKind};
use clap_complete::{
    generate,
    shells::{Bash, Fish, Zsh},
};

use dqt_core::Error;
use dqt_core::archive::{DEFAULT_DOCKERFILE_NAME, transpose_tar_stream};
use dqt_core::exit_code::ExitCode;
use dqt_core::log_filter::BuildLogFilter;
use dqt_core::transpose::{TransposeOptions, transpose};

const LONG_ABOUT: &str = "Rewrite a Dockerfile so its RUN steps execute under a QEMU user-mode emulator, enabling cross-architecture builds on a mismatched host.\n\nA COPY of the emulator binary is injected after every FROM and each RUN is rewritten to invoke the emulator in direct-execution mode. With --tar the input is treated as a tar build context and the Dockerfile entry is rewritten in place.";

const AFTER_HELP: &str = "Examples:\n  dqt --host-qemu qemu-arm-static --container-qemu /tmp/qemu\n  dqt --host-qemu qemu-arm-static --container-qemu /tmp/qemu -f Dockerfile.arm\n  dqt --stdin --host-qemu qemu-arm-static --container-qemu /tmp/qemu < Dockerfile\n  dqt --tar --host-qemu qemu-arm-static --container-qemu /tmp/qemu < context.tar > out.tar\n  docker build . 2>&1 | dqt filter-log --container-qemu /tmp/qemu";

fn main() {
    let code = match run() {
        Ok(()) => ExitCode::Success,
        Err(app_error) => {
            if !app_error.message.is_empty() {
                eprintln!("{}", app_error.message);
            }
            app_error.code
        }
    };
    std::process::exit(code.as_i32());
}

#[derive(Debug)]
struct AppError {
    code: ExitCode,
    message: String,
}

impl AppError {
    fn usage(message: impl Into<String>) -> Self {
        Self {
            code: ExitCode::Usage,
            message: message.into(),
        }
    }
}

impl From<Error> for AppError {
    fn from(value: Error) -> Self {
        Self {
            code: ExitCode::from(&value),
            message: value.to_string(),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Strip emulator noise from docker build output")]
    FilterLog {
        #[arg(
            long = "container-qemu",
            value_name = "PATH",
            help = "Emulator path inside the image, as passed when transposing"
        )]
        container_qemu: String,
    },
    #[command(about = "Generate shell completion scripts")]
    Completion {
        #[arg(value_enum, value_name = "SHELL")]
        shell: CompletionShell,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Debug, Parser)]
#[command(
    name = "dqt",
    about = "Transpose Dockerfiles for QEMU-emulated builds",
    long_about = LONG_ABOUT,
    after_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(
        long = "host-qemu",
        value_name = "PATH",
        help = "Emulator binary on the host, copied into the image"
    )]
    host_qemu: Option<String>,

    #[arg(
        long = "container-qemu",
        value_name = "PATH",
        help = "Path inside the image where the emulator is placed and invoked"
    )]
    container_qemu: Option<String>,

    #[arg(
        short = 'f',
        long = "file",
        value_name = "PATH",
        help = "Read input from a file path",
        long_help = "Read the Dockerfile (or, with --tar, the build context archive) from PATH. If omitted, dqt uses ./Dockerfile; --tar without --file reads the archive from stdin."
    )]
    file: Option<String>,

    #[arg(
        long = "stdin",
        help = "Read the Dockerfile from stdin",
        long_help = "Read Dockerfile content from stdin. This conflicts with --file."
    )]
    stdin: bool,

    #[arg(
        long = "tar",
        help = "Treat the input as a tar build context",
        long_help = "Treat the input as a tar build context: the Dockerfile entry is transposed, every other entry passes through unchanged, and the rewritten archive is written to stdout."
    )]
    tar: bool,

    #[arg(
        long = "dockerfile-name",
        value_name = "NAME",
        default_value = DEFAULT_DOCKERFILE_NAME,
        help = "Name of the Dockerfile entry inside the archive",
        long_help = "Name of the Dockerfile entry inside the archive, compared after entry-name normalization. Only meaningful with --tar."
    )]
    dockerfile_name: String,
}

fn run() -> Result<(), AppError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if matches!(
                err.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ) {
                print!("{err}");
                return Ok(());
            }
            return Err(AppError::usage(err.to_string()));
        }
    };

    execute(cli)
}

fn execute(cli: Cli) -> Result<(), AppError> {
    if let Some(command) = cli.command {
        return execute_command(command);
    }

    validate_cli(&cli)?;

    let options = TransposeOptions::new(
        cli.host_qemu.as_deref().unwrap_or_default(),
        cli.container_qemu.as_deref().unwrap_or_default(),
    );

    if cli.tar {
        return transpose_archive(&cli, &options);
    }

    let dockerfile = read_dockerfile(&cli)?;
    let transposed = transpose(&dockerfile, &options)?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(transposed.as_bytes())
        .map_err(Error::from)?;
    Ok(())
}

fn execute_command(command: Commands) -> Result<(), AppError> {
    match command {
        Commands::FilterLog { container_qemu } => {
            let filter = BuildLogFilter::new(&container_qemu);
            let stdin = std::io::stdin().lock();
            let stdout = std::io::stdout().lock();
            filter.filter(stdin, stdout).map_err(AppError::from)
        }
        Commands::Completion { shell } => write_completion(shell),
    }
}

fn transpose_archive(cli: &Cli, options: &TransposeOptions) -> Result<(), AppError> {
    let stdout = std::io::stdout().lock();
    match cli.file.as_deref() {
        Some(path) => {
            let input = std::fs::File::open(path).map_err(Error::from)?;
            transpose_tar_stream(input, stdout, options, &cli.dockerfile_name)?;
        }
        None => {
            let input = std::io::stdin().lock();
            transpose_tar_stream(input, stdout, options, &cli.dockerfile_name)?;
        }
    }
    Ok(())
}

fn write_completion(shell: CompletionShell) -> Result<(), AppError> {
    let mut command = Cli::command();
    let mut stdout = std::io::stdout().lock();
    match shell {
        CompletionShell::Bash => generate(Bash, &mut command, "dqt", &mut stdout),
        CompletionShell::Zsh => generate(Zsh, &mut command, "dqt", &mut stdout),
        CompletionShell::Fish => generate(Fish, &mut command, "dqt", &mut stdout),
    }
    stdout.flush().map_err(Error::from).map_err(AppError::from)
}

fn validate_cli(cli: &Cli) -> Result<(), AppError> {
    if cli.host_qemu.as_deref().is_none_or(str::is_empty) {
        return Err(AppError::usage(
            "the following required arguments were not provided:\n  --host-qemu <PATH>",
        ));
    }
    if cli.container_qemu.as_deref().is_none_or(str::is_empty) {
        return Err(AppError::usage(
            "the following required arguments were not provided:\n  --container-qemu <PATH>",
        ));
    }
    if cli.stdin && cli.file.is_some() {
        return Err(AppError::usage("--stdin is mutually exclusive with --file"));
    }
    if cli.stdin && cli.tar {
        return Err(AppError::usage(
            "--tar reads the archive from stdin already; drop --stdin",
        ));
    }
    Ok(())
}

fn read_dockerfile(cli: &Cli) -> Result<String, AppError> {
    if cli.stdin {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .map_err(Error::from)?;
        return Ok(input);
    }

    let path = cli.file.as_deref().unwrap_or(DEFAULT_DOCKERFILE_NAME);
    std::fs::read_to_string(path)
        .map_err(Error::from)
        .map_err(AppError::from)
}
