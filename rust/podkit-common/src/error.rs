use std::alloc::Layout;

use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn capacity_overflow(capacity: usize, element_size: usize) -> Error {
        Error(
            ErrorKind::CapacityOverflow {
                capacity,
                element_size,
            }
            .into(),
        )
    }

    pub fn allocation_failed(layout: Layout) -> Error {
        Error(
            ErrorKind::AllocationFailed {
                size: layout.size(),
                align: layout.align(),
            }
            .into(),
        )
    }

    /// Returns `true` if the error was raised by an allocator that could not
    /// satisfy a well-formed request.
    pub fn is_allocation_failure(&self) -> bool {
        matches!(self.kind(), ErrorKind::AllocationFailed { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("capacity overflow: {capacity} elements of {element_size} bytes")]
    CapacityOverflow {
        capacity: usize,
        element_size: usize,
    },

    #[error("memory allocation of {size} bytes (align {align}) failed")]
    AllocationFailed { size: usize, align: usize },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}
