use crate::encoder::DEFAULT_CHUNK_SIZE;

/// Composition settings shared by the messages built with them
///
/// **NOTE**: Enable feature "serde" to load it from configuration files.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Text put in front of every generated multipart boundary
    pub boundary_prefix: String,

    /// Host name used in generated Message-IDs before asking the OS
    pub server_name: Option<String>,

    /// Default `X-Mailer:` value
    pub x_mailer: String,

    /// Size of chunks read from body and attachment sources
    pub chunk_size: usize,
}

impl Config {
    #[inline]
    pub fn with_boundary_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.boundary_prefix = prefix.into();
        self
    }

    #[inline]
    pub fn with_server_name<S: Into<String>>(mut self, name: S) -> Self {
        self.server_name = Some(name.into());
        self
    }

    #[inline]
    pub fn with_x_mailer<S: Into<String>>(mut self, x_mailer: S) -> Self {
        self.x_mailer = x_mailer.into();
        self
    }

    #[inline]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            boundary_prefix: "_Part_".into(),
            server_name: None,
            x_mailer: concat!("emailbuilder/", env!("CARGO_PKG_VERSION")).into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[cfg(all(test, feature = "serde"))]
mod test {
    use super::Config;

    #[test]
    fn load_partial_config() {
        let config: Config =
            serde_json::from_str(r#"{ "server_name": "mail.example.com", "chunk_size": 1024 }"#)
                .unwrap();

        assert_eq!(config.server_name.as_deref(), Some("mail.example.com"));
        assert_eq!(config.chunk_size, 1024);
        assert_eq!(config.boundary_prefix, Config::default().boundary_prefix);
    }
}
