use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Tool {tool} failed with HTTP status {status}")]
    Status { tool: String, status: u16 },

    #[error("Could not decode {tool} response: {message}")]
    Decode { tool: String, message: String },
}

impl ToolError {
    /// HTTP status carried by a non-success response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ToolError::Status { status, .. } => Some(*status),
            ToolError::Http(err) => err.status().map(|s| s.as_u16()),
            ToolError::Decode { .. } => None,
        }
    }
}
