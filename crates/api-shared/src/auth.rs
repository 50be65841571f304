/// Expected API key for gRPC callers, read once at startup.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    /// Interpret the raw value of `API_KEY`. Unset or blank means no key is configured.
    pub fn from_env_value(value: Option<String>) -> Option<Self> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(Self)
    }

    /// Validates the key a caller sent.
    ///
    /// Returns `Ok(())` if the key matches, or `unauthenticated` otherwise.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self, provided_key: Option<&str>) -> Result<(), tonic::Status> {
        match provided_key {
            Some(key) if key == self.0 => Ok(()),
            Some(_) => Err(tonic::Status::unauthenticated("Invalid API key")),
            None => Err(tonic::Status::unauthenticated("Missing API key")),
        }
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(..)")
    }
}
