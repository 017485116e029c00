/// One Dockerfile instruction: an upper-cased keyword plus its argument
/// payload. Commands are built by the parser adapter (or synthesized by the
/// transposer) and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Args,
}

/// The three historical argument payload shapes. Exactly one shape is active
/// per instruction; `RUN` may carry either `List` (exec form) or `Shell`
/// (shell form), so callers discriminate on the payload, not the keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Args {
    /// Exec-form / list arguments: `RUN ["ls", "-al"]`.
    List(Vec<String>),
    /// Shell-form arguments: `RUN apt-get update`.
    Shell(String),
    /// Multi-key instructions such as `ENV` and `LABEL`, in source order.
    Pairs(Vec<(String, String)>),
}

impl Command {
    pub fn list(name: impl Into<String>, tokens: Vec<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            args: Args::List(tokens),
        }
    }

    pub fn shell(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            args: Args::Shell(text.into()),
        }
    }

    pub fn pairs(name: impl Into<String>, pairs: Vec<(String, String)>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            args: Args::Pairs(pairs),
        }
    }
}

impl Args {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::List(_) => "list",
            Self::Shell(_) => "shell",
            Self::Pairs(_) => "pairs",
        }
    }
}
