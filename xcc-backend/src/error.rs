use thiserror::Error;
use xcc_codegen::AbiError;
use xcc_common::CompilerError;
use xcc_ir::NodeId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    /// A node reached lowering that has no instruction sequence
    #[error("cannot lower {node} ({kind}) in {block}: {message}")]
    Internal {
        function: String,
        node: NodeId,
        kind: String,
        block: NodeId,
        message: String,
    },

    #[error("{node} has no location")]
    Unallocated { function: String, node: NodeId },

    #[error("{source}")]
    Frame {
        function: String,
        #[source]
        source: AbiError,
    },
}

impl BackendError {
    pub fn function(&self) -> &str {
        match self {
            BackendError::Internal { function, .. }
            | BackendError::Unallocated { function, .. }
            | BackendError::Frame { function, .. } => function,
        }
    }
}

impl From<BackendError> for CompilerError {
    fn from(err: BackendError) -> Self {
        CompilerError::CodegenError {
            function: err.function().to_string(),
            message: err.to_string(),
        }
    }
}
