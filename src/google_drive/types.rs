use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug, Clone)]
pub struct FileList {
    pub files: Vec<File>,
}

#[derive(Serialize, Debug, Clone)]
pub struct FileUploadBody {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct File {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "webViewLink")]
    pub web_view_link: Option<String>,
}
