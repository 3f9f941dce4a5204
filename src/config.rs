use std::env::VarError;

use anyhow::anyhow;

pub const REQUIRED_VARIABLES: &[&str] = &["OCM_API_KEY", "TEXTGEN_URL"];

const DEFAULT_LISTEN_PORT: u16 = 3030;
const DEFAULT_OCM_BASE_URL: &str = "https://api.openchargemap.io/v3/poi/";

pub struct Config {
    pub listen_port: u16,
    pub ocm_api_key: String,
    pub ocm_base_url: String,
    pub textgen_url: String,
}

impl Config {
    pub fn env() -> anyhow::Result<Self> {
        let ocm_api_key = env("OCM_API_KEY")?;
        let textgen_url = env("TEXTGEN_URL")?;

        let listen_port = match optional_env("LISTEN_PORT") {
            Some(port) => port
                .parse()
                .map_err(|_| anyhow!("LISTEN_PORT is not a valid port number: {port}"))?,
            None => DEFAULT_LISTEN_PORT,
        };

        let ocm_base_url =
            optional_env("OCM_BASE_URL").unwrap_or_else(|| DEFAULT_OCM_BASE_URL.to_string());

        Ok(Self {
            listen_port,
            ocm_api_key,
            ocm_base_url,
            textgen_url,
        })
    }
}

fn env(name: &str) -> anyhow::Result<String> {
    std::env::var(name).map_err(|e| match e {
        VarError::NotPresent => anyhow!("{name} not set"),
        VarError::NotUnicode(_) => anyhow!("{name} value is not valid unicode"),
    })
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
