use crate::models::error::ModError;
use crate::utils::file::FileUtils;
use camino::Utf8Path;

pub struct Toml;

impl Toml {
    pub fn write<T: serde::Serialize>(path: &Utf8Path, data: &T) -> Result<(), ModError> {
        let text = toml::to_string(data)?;
        FileUtils::write_atomic(path, text.as_bytes())
    }

    pub fn read<T: serde::de::DeserializeOwned>(path: &Utf8Path) -> Result<T, ModError> {
        let s = std::fs::read_to_string(path)?;
        Ok(toml::from_str::<T>(&s)?)
    }
}
