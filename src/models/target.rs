use super::QueryOptions;

/// The `(options, resource id)` pair accepted by every handle operation.
///
/// Both fields are optional. A missing id falls back to the handle's own id and missing
/// options mean an empty option bag.
///
/// # Examples
///
/// ```
/// use docker_modem::models::{QueryOptions, Target};
///
/// // Operate on the handle's own container with no options.
/// let (id, options) = Target::default().resolve("abc123");
/// assert_eq!(id, "abc123");
/// assert!(options.is_empty());
///
/// // Operate on another container by id.
/// let (id, _) = Target::id("def456").resolve("abc123");
/// assert_eq!(id, "def456");
///
/// // Pass query options.
/// let target = Target::builder()
///     .options(QueryOptions::new().set("t", 5))
///     .build();
/// let (_, options) = target.resolve("abc123");
/// assert_eq!(options.to_query_string().as_deref(), Some("t=5"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, typed_builder::TypedBuilder)]
#[builder(doc)]
pub struct Target {
    /// Query options for the call
    #[builder(default, setter(strip_option, into))]
    pub options: Option<QueryOptions>,
    /// Identifier overriding the handle's own id
    #[builder(default, setter(strip_option, into))]
    pub resource_id: Option<String>,
}

impl Target {
    /// Targets a specific resource with no options.
    pub fn id(resource_id: impl Into<String>) -> Self {
        Target {
            options: None,
            resource_id: Some(resource_id.into()),
        }
    }

    /// Targets the handle's own resource with the given options.
    pub fn options(options: impl Into<QueryOptions>) -> Self {
        Target {
            options: Some(options.into()),
            resource_id: None,
        }
    }

    /// Resolves the identifier and option bag for a call.
    pub fn resolve(self, default_id: &str) -> (String, QueryOptions) {
        (
            self.resource_id.unwrap_or_else(|| default_id.to_string()),
            self.options.unwrap_or_default(),
        )
    }

    /// Resolves only the identifier, discarding options.
    ///
    /// Used by operations that never send query options.
    pub fn resolve_id(self, default_id: &str) -> String {
        self.resolve(default_id).0
    }
}

impl From<&str> for Target {
    fn from(resource_id: &str) -> Self {
        Target::id(resource_id)
    }
}

impl From<String> for Target {
    fn from(resource_id: String) -> Self {
        Target::id(resource_id)
    }
}

impl From<QueryOptions> for Target {
    fn from(options: QueryOptions) -> Self {
        Target::options(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_id_means_no_options() {
        let (id, options) = Target::from("other").resolve("own");
        assert_eq!(id, "other");
        assert_eq!(options, QueryOptions::new());
    }

    #[test]
    fn test_absent_everything_uses_own_id() {
        let (id, options) = Target::default().resolve("own");
        assert_eq!(id, "own");
        assert!(options.is_empty());
    }

    #[test]
    fn test_options_only_uses_own_id() {
        let (id, options) = Target::from(QueryOptions::new().set("force", true)).resolve("own");
        assert_eq!(id, "own");
        assert!(options.flag("force"));
    }

    #[test]
    fn test_both_supplied() {
        let target = Target::builder()
            .options(QueryOptions::new().set("v", true))
            .resource_id("other")
            .build();
        let (id, options) = target.resolve("own");
        assert_eq!(id, "other");
        assert!(options.flag("v"));
    }

    #[test]
    fn test_resolve_id_drops_options() {
        let target = Target::builder()
            .options(QueryOptions::new().set("ignored", 1))
            .build();
        assert_eq!(target.resolve_id("own"), "own");
    }
}
