use ::config::{ConfigError, Map, Source, Value, ValueKind};

/// Config source that reads values from files, for every environment variable of the form
/// `SMARTHOME__<KEY>__FILE=<path>`, e.g. `SMARTHOME__OAUTH__CLIENT_SECRET__FILE=/run/secrets/client_secret`
#[derive(Debug, Clone, Default)]
pub struct EnvironmentSecretFile {}

const SUFFIX: &str = "__file";
const PREFIX: &str = concat!(std::env!("CARGO_PKG_NAME"), "__");

impl EnvironmentSecretFile {
    fn collect_from(
        vars: impl Iterator<Item = (String, String)>,
    ) -> Result<Map<String, Value>, ConfigError> {
        vars.filter_map(|(key, path)| {
            let key = key.to_lowercase();
            let key = key.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?.replace("__", ".");

            if key.is_empty() {
                return None;
            }

            Some(read_secret(&path).map(|content| {
                (key, Value::new(Some(&path), ValueKind::String(content)))
            }))
        })
        .collect()
    }
}

fn read_secret(path: &str) -> Result<String, ConfigError> {
    let content =
        std::fs::read_to_string(path).map_err(|err| ConfigError::Foreign(Box::new(err)))?;

    // Secret files usually end with a newline that is not part of the secret
    Ok(content.trim_end_matches(['\r', '\n']).to_owned())
}

impl Source for EnvironmentSecretFile {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new((*self).clone())
    }

    fn collect(&self) -> Result<Map<String, Value>, ConfigError> {
        Self::collect_from(std::env::vars())
    }
}
