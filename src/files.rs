use anyhow::{bail, Result};
use std::{fs, io::prelude::*, path::PathBuf};

pub fn read_json<T>(path: PathBuf) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    match fs::OpenOptions::new().read(true).open(&path) {
        Ok(mut f) => {
            let mut contents = String::new();
            if let Err(e) = f.read_to_string(&mut contents) {
                bail!(
                    "Unable to read file contents. (File: '{}')\nDetails: {}",
                    path.display(),
                    e
                );
            }
            let r = serde_json::from_str::<T>(&contents)?;

            Ok(r)
        }
        Err(e) => bail!(
            "Failed to open file. (File: '{}')\nDetails: {}",
            path.display(),
            e
        ),
    }
}

pub fn write_json<T>(data: &T, path: PathBuf) -> Result<()>
where
    T: serde::ser::Serialize,
{
    match fs::OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&path)
    {
        Ok(mut f) => {
            let json = serde_json::to_string_pretty(data)?;

            if let Err(e) = f.write_all(json.as_bytes()) {
                bail!(
                    "Failed to write contents to file `{}`.\nDetails: {}",
                    path.display(),
                    e
                );
            }

            Ok(())
        }
        Err(e) => bail!(
            "Failed to open file. (File: '{}')\nDetails: {}",
            path.display(),
            e
        ),
    }
}
