//! Run configuration for the engine and console output

/// Run configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Print one line per test instead of one letter
    pub verbose: bool,
    /// Emit ANSI colour codes in console output
    pub color: bool,
    /// Only run tests whose display name contains this keyword
    pub filter: Option<String>,
    /// Stop after the first failed or errored test
    pub stop_on_failure: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            color: true,
            filter: None,
            stop_on_failure: false,
        }
    }
}

impl RunConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Restrict the run to display names containing `keyword`
    pub fn with_filter(mut self, keyword: impl Into<String>) -> Self {
        self.filter = Some(keyword.into());
        self
    }

    pub fn with_stop_on_failure(mut self, stop: bool) -> Self {
        self.stop_on_failure = stop;
        self
    }

    /// Whether a test with display name `name` is selected
    pub fn selects(&self, name: &str) -> bool {
        self.filter.as_deref().is_none_or(|keyword| name.contains(keyword))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================
    // Default config tests
    // ========================================

    #[test]
    fn test_default_config_is_terse() {
        assert!(!RunConfig::default().verbose);
    }

    #[test]
    fn test_default_config_color() {
        assert!(RunConfig::default().color);
    }

    #[test]
    fn test_default_config_runs_everything() {
        let config = RunConfig::default();
        assert_eq!(config.filter, None);
        assert!(config.selects("anything"));
        assert!(!config.stop_on_failure);
    }

    #[test]
    fn test_new_equals_default() {
        assert_eq!(RunConfig::new(), RunConfig::default());
    }

    // ========================================
    // Builder tests
    // ========================================

    #[test]
    fn test_with_filter() {
        let config = RunConfig::new().with_filter("add");
        assert!(config.selects("adds(1, 2)"));
        assert!(!config.selects("subtracts"));
    }

    #[test]
    fn test_with_empty_filter_selects_everything() {
        assert!(RunConfig::new().with_filter("").selects("subtracts"));
    }

    #[test]
    fn test_builder_chain_all() {
        let config = RunConfig::new()
            .with_verbose(true)
            .with_color(false)
            .with_filter("x")
            .with_stop_on_failure(true);
        assert!(config.verbose);
        assert!(!config.color);
        assert_eq!(config.filter.as_deref(), Some("x"));
        assert!(config.stop_on_failure);
    }

    #[test]
    fn test_builder_override() {
        let config = RunConfig::new().with_verbose(true).with_verbose(false);
        assert!(!config.verbose);
    }
}
