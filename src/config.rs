use once_cell::sync::Lazy;
use serde::Deserialize;

/// The static config instance.
pub static INSTANCE: Lazy<Config> = Lazy::new(|| {
    #[cfg(not(test))]
    {
        use std::{fs::File, io::Read};

        return toml::from_str(&{
            let mut string = String::new();
            File::open("./data/config.toml")
                .unwrap()
                .read_to_string(&mut string)
                .unwrap();
            string
        })
        .unwrap();
    }

    #[cfg(test)]
    Config::default()
});

/// Describing the server configuration.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub bootstrap: Bootstrap,
    pub ai: AiConfig,
}

/// Where the document store lives.
#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    pub data_dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
        }
    }
}

/// Accounts guaranteed to exist after seeding.
#[derive(Deserialize, Clone, Default)]
#[serde(default)]
pub struct Bootstrap {
    pub admin: AdminSeed,
    pub super_user: SuperUserSeed,
}

#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct AdminSeed {
    pub username: String,
    pub phone: String,
    pub password: String,
    pub nickname: String,
}

impl Default for AdminSeed {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            phone: "19900000000".to_string(),
            password: "Admin@123".to_string(),
            nickname: "管理员".to_string(),
        }
    }
}

#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct SuperUserSeed {
    pub phone: String,
    /// Fixed code accepted for this phone instead of the demo default.
    pub sms_code: String,
    pub password: String,
    pub nickname: String,
}

impl Default for SuperUserSeed {
    fn default() -> Self {
        Self {
            phone: "18800000000".to_string(),
            sms_code: "000000".to_string(),
            password: "Admin@123".to_string(),
            nickname: "超级用户".to_string(),
        }
    }
}

/// Describing the text-generation service used by AI tasks.
#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct AiConfig {
    /// Base url of an OpenAI-style chat completion service, for example
    /// `https://api.deepseek.com`. Leave unset to run the built-in
    /// offline heuristics instead.
    pub endpoint: Option<String>,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: String::new(),
            model: "deepseek-chat".to_string(),
            temperature: 0.2,
        }
    }
}
