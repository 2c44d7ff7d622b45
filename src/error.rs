use thiserror::Error;

/// Which table level a hash function was being selected for.
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum Level {
    Outer,
    Inner,
}
impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Outer => write!(f,"outer"),
            Level::Inner => write!(f,"inner"),
        }
    }
}

#[derive(Debug,Error,PartialEq,Eq)]
pub enum BuildError {
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    #[error("duplicate key {0} in construction input")]
    DuplicateKey(i64),
    #[error("no acceptable {level} hash function after {attempts} attempts")]
    AttemptsExhausted {
        level: Level,
        attempts: usize,
    },
}

#[derive(Debug,Error)]
pub enum FixedSetIoError {
    #[error("failed to write header")]
    WriteHeader,
    #[error("failed to write set data: {0}")]
    WriteData(#[source] bincode::Error),
    #[error("failed to read header")]
    ReadHeader,
    #[error("failed to read set data: {0}")]
    ReadData(#[source] bincode::Error),
    #[error("invalid header")]
    InvalidHeader,
    #[error("unsupported version {0}.{1}")]
    InvalidVersion(u32,u32),
}
