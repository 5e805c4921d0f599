use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub store: StoreSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreSettings {
    pub host: String,
    #[serde(default)]
    pub auth_token: Option<String>,
    pub device_id: String,
}

pub fn load_store_config() -> anyhow::Result<StoreConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/store"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Replace template variables in a subscription path
pub fn prepare_path(path: &str, vars: &HashMap<String, String>) -> String {
    let mut result = path.to_string();
    for (key, value) in vars {
        let placeholder = format!("${{{}}}", key);
        result = result.replace(&placeholder, value);
    }
    result
}

/// The vehicle-position path for a given device
pub fn device_telemetry_path(device_id: &str) -> String {
    let mut vars = HashMap::new();
    vars.insert("device".to_string(), device_id.to_string());
    prepare_path("telemetry/${device}/current", &vars)
}
