use core::fmt;

#[derive(Debug)]
pub enum Error {
    DockerfileParse { msg: String },
    PayloadShape { msg: String },
    MissingEntry { name: String },
    Io { source: std::io::Error },
}

impl Error {
    pub fn dockerfile_parse(msg: impl Into<String>) -> Self {
        Self::DockerfileParse { msg: msg.into() }
    }

    pub fn payload_shape(msg: impl Into<String>) -> Self {
        Self::PayloadShape { msg: msg.into() }
    }

    pub fn missing_entry(name: impl Into<String>) -> Self {
        Self::MissingEntry { name: name.into() }
    }

    pub fn io(source: std::io::Error) -> Self {
        Self::Io { source }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DockerfileParse { msg } => write!(f, "dockerfile parse error: {msg}"),
            Self::PayloadShape { msg } => write!(f, "payload shape error: {msg}"),
            Self::MissingEntry { name } => {
                write!(f, "no entry named {name} found in the archive")
            }
            Self::Io { source } => write!(f, "io error: {source}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Self::Io { source } = self {
            Some(source)
        } else {
            None
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::io(value)
    }
}
