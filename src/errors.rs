use std::any::Any;

#[derive(Debug, PartialEq, PartialOrd, Eq, Ord, Clone, thiserror::Error)]
pub enum SpawnError {
    /// The pool was already shut down when the task was submitted.
    #[error("pool is shut down, task rejected")]
    Rejected,

    #[error("task panicked: {0}")]
    Panic(String),

    /// The task was dropped without ever running. Only observable once the
    /// pool that held it in its queue has been dropped.
    #[error("task abandoned before it ran")]
    Abandoned,

    #[error("timed out waiting for task result")]
    Timeout,

    /// The result was already moved out of the handle.
    #[error("result already taken")]
    ChannelClosed,

    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(String),

    #[error("config error: {0}")]
    Config(String),
}

impl SpawnError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        SpawnError::Config(msg.into())
    }

    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let msg = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        SpawnError::Panic(msg)
    }
}
