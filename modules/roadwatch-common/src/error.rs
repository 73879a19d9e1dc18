use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoadWatchError {
    #[error("Invalid stored row: {0}")]
    InvalidRow(String),

    #[error("Session for {0} kept changing, gave up after retries")]
    SessionConflict(String),
}
