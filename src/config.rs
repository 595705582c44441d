//! Runtime configuration.

use std::fmt;
use std::rc::Rc;

use crate::error::Error;

/// Receives handler errors isolated by [`guarded`](crate::error::guarded).
pub type ErrorHandler = Rc<dyn Fn(&Error)>;

/// External CSS compiler: `(scope_selector, css) -> scoped css`.
pub type StyleCompiler = Rc<dyn Fn(&str, &str) -> String>;

/// Configuration for a [`Runtime`](crate::pipeline::Runtime).
#[derive(Clone)]
pub struct RuntimeConfig {
    /// Attribute marking a container as server-rendered. `render()` hydrates
    /// such containers instead of mounting, then removes the attribute.
    pub hydrate_attribute: String,
    /// Attribute carrying a component type's stylesheet scope id.
    pub scope_attribute: String,
    /// Deep-clone children that are already mounted elsewhere before attaching.
    pub clone_hoisted: bool,
    /// Called with every isolated handler error.
    pub on_error: Option<ErrorHandler>,
    /// Compiles component stylesheets. Identity when absent.
    pub style_compiler: Option<StyleCompiler>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            hydrate_attribute: "hydrate".to_string(),
            scope_attribute: "data-scope".to_string(),
            clone_hoisted: true,
            on_error: None,
            style_compiler: None,
        }
    }
}

impl RuntimeConfig {
    pub fn with_hydrate_attribute(mut self, name: impl Into<String>) -> Self {
        self.hydrate_attribute = name.into();
        self
    }

    pub fn with_scope_attribute(mut self, name: impl Into<String>) -> Self {
        self.scope_attribute = name.into();
        self
    }

    pub fn with_clone_hoisted(mut self, enabled: bool) -> Self {
        self.clone_hoisted = enabled;
        self
    }

    pub fn with_error_handler(mut self, handler: impl Fn(&Error) + 'static) -> Self {
        self.on_error = Some(Rc::new(handler));
        self
    }

    pub fn with_style_compiler(
        mut self,
        compiler: impl Fn(&str, &str) -> String + 'static,
    ) -> Self {
        self.style_compiler = Some(Rc::new(compiler));
        self
    }

    /// Compile `css` for the given scope selector.
    pub(crate) fn compile_style(&self, selector: &str, css: &str) -> String {
        match &self.style_compiler {
            Some(compile) => compile(selector, css),
            None => css.to_string(),
        }
    }
}

impl fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("hydrate_attribute", &self.hydrate_attribute)
            .field("scope_attribute", &self.scope_attribute)
            .field("clone_hoisted", &self.clone_hoisted)
            .field("on_error", &self.on_error.is_some())
            .field("style_compiler", &self.style_compiler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.hydrate_attribute, "hydrate");
        assert_eq!(config.scope_attribute, "data-scope");
        assert!(config.clone_hoisted);
        assert!(config.on_error.is_none());
    }

    #[test]
    fn test_style_compiler_identity_without_compiler() {
        let config = RuntimeConfig::default();
        assert_eq!(config.compile_style("[data-scope=abc]", "color: red"), "color: red");

        let config = config.with_style_compiler(|selector, css| format!("{selector}{{{css}}}"));
        assert_eq!(
            config.compile_style("[data-scope=abc]", "color: red"),
            "[data-scope=abc]{color: red}"
        );
    }
}
