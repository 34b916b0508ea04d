//! Codec configuration types and builders.

use crate::constants::DEFAULT_CHUNK_SIZE;

/// Default maximum nesting of composite values.
const DEFAULT_MAX_DEPTH: usize = 512;
/// Smallest chunk size that can always make progress past a surrogate pair.
const MIN_CHUNK_SIZE: usize = 2;
/// Largest chunk size the 16-bit chunk length field can carry.
const MAX_CHUNK_SIZE: usize = 0xffff;

/// Configuration error returned when validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Settings shared by an [`Encoder`](crate::Encoder) and a
/// [`Decoder`](crate::Decoder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    chunk_size: usize,
    max_depth: usize,
    compact_doubles: bool,
}

impl CodecConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> CodecConfigBuilder {
        CodecConfigBuilder::new()
    }

    /// Returns the maximum length of a single string or binary chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the maximum nesting of lists, maps, and objects.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Returns whether doubles use the short wire forms.
    pub fn compact_doubles(&self) -> bool {
        self.compact_doubles
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
            compact_doubles: true,
        }
    }
}

impl From<CodecConfig> for CodecConfigBuilder {
    fn from(config: CodecConfig) -> Self {
        Self {
            chunk_size: Some(config.chunk_size),
            max_depth: Some(config.max_depth),
            compact_doubles: Some(config.compact_doubles),
        }
    }
}

/// Builder for `CodecConfig`.
#[derive(Debug, Clone, Default)]
pub struct CodecConfigBuilder {
    chunk_size: Option<usize>,
    max_depth: Option<usize>,
    compact_doubles: Option<bool>,
}

impl CodecConfigBuilder {
    /// Creates a new codec configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum string or binary chunk length.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    /// Sets the maximum nesting depth.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Enables or disables the short double forms.
    pub fn compact_doubles(mut self, enabled: bool) -> Self {
        self.compact_doubles = Some(enabled);
        self
    }

    /// Builds the codec configuration, returning an error if validation fails.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `chunk_size` is outside `2..=0xFFFF`
    /// - `max_depth` is zero
    pub fn build(self) -> Result<CodecConfig, ConfigError> {
        let chunk_size = self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE);
        let max_depth = self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH);

        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&chunk_size) {
            return Err(ConfigError::new(format!(
                "chunk_size must be between {} and {}, got {}",
                MIN_CHUNK_SIZE, MAX_CHUNK_SIZE, chunk_size
            )));
        }

        if max_depth == 0 {
            return Err(ConfigError::new("max_depth must be at least 1"));
        }

        Ok(CodecConfig {
            chunk_size,
            max_depth,
            compact_doubles: self.compact_doubles.unwrap_or(true),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CodecConfig::default();
        assert_eq!(config.chunk_size(), 0x8000);
        assert_eq!(config.max_depth(), 512);
        assert!(config.compact_doubles());
    }

    #[test]
    fn test_builder_matches_default() {
        let config = CodecConfig::builder().build().unwrap();
        assert_eq!(config, CodecConfig::default());
    }

    #[test]
    fn test_builder_overrides() {
        let config = CodecConfigBuilder::new()
            .chunk_size(1024)
            .max_depth(8)
            .compact_doubles(false)
            .build()
            .unwrap();
        assert_eq!(config.chunk_size(), 1024);
        assert_eq!(config.max_depth(), 8);
        assert!(!config.compact_doubles());
    }

    #[test]
    fn test_chunk_size_bounds() {
        assert!(CodecConfig::builder().chunk_size(1).build().is_err());
        assert!(CodecConfig::builder().chunk_size(2).build().is_ok());
        assert!(CodecConfig::builder().chunk_size(0xffff).build().is_ok());
        let err = CodecConfig::builder().chunk_size(0x10000).build().unwrap_err();
        assert!(err.to_string().contains("chunk_size"));
    }

    #[test]
    fn test_zero_depth_fails() {
        let err = CodecConfig::builder().max_depth(0).build().unwrap_err();
        assert_eq!(
            err.to_string(),
            "configuration error: max_depth must be at least 1"
        );
    }

    #[test]
    fn test_builder_from_config() {
        let config = CodecConfig::builder().max_depth(3).build().unwrap();
        let rebuilt = CodecConfigBuilder::from(config.clone()).build().unwrap();
        assert_eq!(rebuilt, config);
    }
}
