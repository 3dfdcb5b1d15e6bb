use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("no OAuth client credentials file found.\nChecked: {hidden}\nChecked: {visible}")]
    MissingCredentials { hidden: String, visible: String },
    #[error("port {0} is already in use by another process")]
    PortInUse(u16),
    #[error("authorization was denied: {0}")]
    ConsentDenied(String),
}
