use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriveError {
    #[error("Request to the API failed with status 401")]
    Unauthorized,
    #[error("Error managing folder: {0}")]
    Folder(String),
    #[error("Upload failed: {0}")]
    Upload(String),
}
