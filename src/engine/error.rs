use ulid::Ulid;

#[derive(Debug)]
pub enum EngineError {
    /// Input rejected before any write took place: malformed interval,
    /// empty date set, over-limit batch.
    Validation(&'static str),
    /// A mutation targeted a staff member that is not registered.
    /// Resolution reads never raise this — missing data resolves to
    /// `Unscheduled` or an empty roster.
    NotFound(Ulid),
    AlreadyExists(Ulid),
    /// Failure surfaced by the persistence layer, propagated unchanged.
    /// A batch that hits this is entirely not applied.
    Store(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Validation(msg) => write!(f, "invalid input: {msg}"),
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::AlreadyExists(id) => write!(f, "already exists: {id}"),
            EngineError::Store(e) => write!(f, "store error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
