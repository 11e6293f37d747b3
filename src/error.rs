/// Broad failure category, used for exit codes and for deciding whether a
/// failure aborts the run or only drops one sample/role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Usage,
    InputNotFound,
    Schema,
    InsufficientData,
    MalformedValue,
    OutputCollision,
    Io,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Usage | ErrorKind::InputNotFound | ErrorKind::Schema => 2,
            ErrorKind::InsufficientData | ErrorKind::MalformedValue => 3,
            ErrorKind::Io => 4,
            ErrorKind::OutputCollision => 5,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("exit_code", &self.exit_code())
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_kind() {
        assert_eq!(AppError::new(ErrorKind::InputNotFound, "x").exit_code(), 2);
        assert_eq!(AppError::new(ErrorKind::InsufficientData, "x").exit_code(), 3);
        assert_eq!(AppError::new(ErrorKind::OutputCollision, "x").exit_code(), 5);
    }
}
