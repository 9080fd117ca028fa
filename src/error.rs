/// Errors raised while turning roster data into alerts.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("intern {intern_id} has a malformed end date: {value:?}")]
    MalformedDate { intern_id: String, value: String },

    #[error("unknown intern status: {0:?}")]
    UnknownStatus(String),
}
