//! Link-click policy for proxied pages.
//!
//! Decides where the browser should go when a hyperlink inside proxied
//! content is followed. Two address shapes are rewritten:
//!
//! - **Foreign-scheme links** (`gemini://host/path`) become proxy paths
//!   (`/host/path`).
//! - **Host-relative links** (`/path`) keep the first segment of the current
//!   proxy path, so `/foo` on a page under `/example.org/...` stays inside
//!   `/example.org`.
//!
//! Everything else is left to the browser.
//!
//! The decision itself is the pure function [`rewrite_link`]. Event plumbing
//! lives in [`LinkInterceptor`], which reads the clicked anchor from a
//! [`ClickEvent`] and drives an injected [`BrowsingContext`].

/// Scheme prefix of links that are routed through the proxy.
pub const GEMINI_SCHEME_PREFIX: &str = "gemini://";

/// Computes the rewritten navigation target for a followed link.
///
/// # Arguments
///
/// - `resolved` - the link's absolute address after resolution against the page
/// - `literal` - the `href` exactly as authored in markup
/// - `current_path` - path of the page currently displayed
///
/// # Returns
///
/// `Some(target)` when navigation should be redirected, `None` when the
/// browser's default behavior should proceed.
///
/// # Examples
///
/// ```
/// use gemini_proxy::domain::link_policy::rewrite_link;
///
/// assert_eq!(
///     rewrite_link("gemini://example.org/foo", "gemini://example.org/foo", "/"),
///     Some("/example.org/foo".to_string())
/// );
/// assert_eq!(
///     rewrite_link("http://proxy.local/bar/baz", "/bar/baz", "/example.org/current"),
///     Some("/example.org/bar/baz".to_string())
/// );
/// assert_eq!(
///     rewrite_link("https://other.example/page", "https://other.example/page", "/a/b"),
///     None
/// );
/// ```
pub fn rewrite_link(resolved: &str, literal: &str, current_path: &str) -> Option<String> {
    if resolved.is_empty() {
        return None;
    }

    if let Some(rest) = resolved.strip_prefix(GEMINI_SCHEME_PREFIX) {
        return Some(format!("/{rest}"));
    }

    if literal.starts_with('/') {
        return Some(format!("{}{}", path_prefix(current_path), literal));
    }

    None
}

/// Returns the first segment of `current_path`, including its leading slash.
///
/// The boundary is the first `/` at or after index 1. A path without such a
/// slash is a single segment and is returned whole; `/` and the empty path
/// have no prefix.
pub fn path_prefix(current_path: &str) -> &str {
    if current_path.len() <= 1 {
        return "";
    }

    match current_path.get(1..).and_then(|rest| rest.find('/')) {
        Some(index) => &current_path[..index + 1],
        None => current_path,
    }
}

/// A hyperlink element as seen by the click handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorElement {
    /// Address after resolution against the document base. Empty when the
    /// anchor has no `href`.
    pub resolved_href: String,
    /// The `href` attribute as written, if present.
    pub href_attribute: Option<String>,
}

impl AnchorElement {
    pub fn new(resolved_href: impl Into<String>, href_attribute: Option<&str>) -> Self {
        Self {
            resolved_href: resolved_href.into(),
            href_attribute: href_attribute.map(str::to_string),
        }
    }
}

/// The element a click landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickTarget {
    Anchor(AnchorElement),
    /// Any non-hyperlink element, identified by its tag name.
    Other(String),
}

/// A single click delivered to the interceptor.
///
/// Tracks whether default handling and propagation have been suppressed.
#[derive(Debug, Clone)]
pub struct ClickEvent {
    target: ClickTarget,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl ClickEvent {
    pub fn new(target: ClickTarget) -> Self {
        Self {
            target,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub fn target(&self) -> &ClickTarget {
        &self.target
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Capabilities of the page hosting the interceptor.
pub trait BrowsingContext {
    /// Path of the currently displayed page.
    fn current_path(&self) -> String;

    /// Starts navigation to `target`.
    fn navigate(&mut self, target: &str);
}

/// Adapter between click events and [`rewrite_link`].
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkInterceptor;

impl LinkInterceptor {
    pub fn new() -> Self {
        Self
    }

    /// Handles one click.
    ///
    /// Returns `true` when the click was rewritten. A rewritten click has its
    /// default action and propagation suppressed and triggers exactly one
    /// call to [`BrowsingContext::navigate`]. Events already suppressed by an
    /// earlier handler are ignored.
    pub fn handle<C: BrowsingContext + ?Sized>(
        &self,
        event: &mut ClickEvent,
        context: &mut C,
    ) -> bool {
        if event.default_prevented() {
            return false;
        }

        let ClickTarget::Anchor(anchor) = event.target() else {
            return false;
        };

        let literal = anchor.href_attribute.as_deref().unwrap_or("");
        let current_path = context.current_path();

        let Some(target) = rewrite_link(&anchor.resolved_href, literal, &current_path) else {
            return false;
        };

        tracing::debug!(href = %anchor.resolved_href, %target, "Link rewritten");

        event.prevent_default();
        event.stop_propagation();
        context.navigate(&target);

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingContext {
        path: String,
        navigations: Vec<String>,
    }

    impl RecordingContext {
        fn at(path: &str) -> Self {
            Self {
                path: path.to_string(),
                navigations: Vec::new(),
            }
        }
    }

    impl BrowsingContext for RecordingContext {
        fn current_path(&self) -> String {
            self.path.clone()
        }

        fn navigate(&mut self, target: &str) {
            self.navigations.push(target.to_string());
        }
    }

    fn anchor_click(resolved: &str, literal: Option<&str>) -> ClickEvent {
        ClickEvent::new(ClickTarget::Anchor(AnchorElement::new(resolved, literal)))
    }

    #[test]
    fn test_rewrite_gemini_link() {
        assert_eq!(
            rewrite_link("gemini://example.org/foo", "gemini://example.org/foo", "/x/y"),
            Some("/example.org/foo".to_string())
        );
    }

    #[test]
    fn test_rewrite_gemini_link_ignores_literal() {
        assert_eq!(
            rewrite_link("gemini://example.com/path", "path", "/example.com/"),
            Some("/example.com/path".to_string())
        );
    }

    #[test]
    fn test_rewrite_host_relative_link() {
        assert_eq!(
            rewrite_link(
                "http://localhost:8965/bar/baz",
                "/bar/baz",
                "/example.org/current"
            ),
            Some("/example.org/bar/baz".to_string())
        );
    }

    #[test]
    fn test_rewrite_host_relative_single_segment_path() {
        assert_eq!(
            rewrite_link("http://localhost/bar", "/bar", "/onlysegment"),
            Some("/onlysegment/bar".to_string())
        );
    }

    #[test]
    fn test_rewrite_host_relative_from_root() {
        assert_eq!(
            rewrite_link("http://localhost/bar", "/bar", "/"),
            Some("/bar".to_string())
        );
    }

    #[test]
    fn test_external_link_not_rewritten() {
        assert_eq!(
            rewrite_link(
                "https://other.example/page",
                "https://other.example/page",
                "/example.org/current"
            ),
            None
        );
    }

    #[test]
    fn test_document_relative_link_not_rewritten() {
        assert_eq!(
            rewrite_link("http://localhost/example.org/a/b", "b", "/example.org/a/"),
            None
        );
    }

    #[test]
    fn test_empty_resolved_not_rewritten() {
        assert_eq!(rewrite_link("", "/bar", "/example.org/current"), None);
    }

    #[test]
    fn test_path_prefix() {
        assert_eq!(path_prefix("/example.org/a/b"), "/example.org");
        assert_eq!(path_prefix("/example.org/"), "/example.org");
        assert_eq!(path_prefix("/onlysegment"), "/onlysegment");
        assert_eq!(path_prefix("/"), "");
        assert_eq!(path_prefix(""), "");
    }

    #[test]
    fn test_path_prefix_multibyte() {
        assert_eq!(path_prefix("/é/x"), "/é");
        assert_eq!(path_prefix("/日本/語"), "/日本");
    }

    #[test]
    fn test_interceptor_ignores_non_anchor() {
        let mut context = RecordingContext::at("/example.org/current");
        let mut event = ClickEvent::new(ClickTarget::Other("BUTTON".to_string()));

        let handled = LinkInterceptor::new().handle(&mut event, &mut context);

        assert!(!handled);
        assert!(!event.default_prevented());
        assert!(!event.propagation_stopped());
        assert!(context.navigations.is_empty());
    }

    #[test]
    fn test_interceptor_gemini_link() {
        let mut context = RecordingContext::at("/example.org/current");
        let mut event = anchor_click("gemini://example.org/foo", Some("gemini://example.org/foo"));

        let handled = LinkInterceptor::new().handle(&mut event, &mut context);

        assert!(handled);
        assert!(event.default_prevented());
        assert!(event.propagation_stopped());
        assert_eq!(context.navigations, vec!["/example.org/foo"]);
    }

    #[test]
    fn test_interceptor_host_relative_link() {
        let mut context = RecordingContext::at("/example.org/current");
        let mut event = anchor_click("http://localhost:8965/bar/baz", Some("/bar/baz"));

        LinkInterceptor::new().handle(&mut event, &mut context);

        assert_eq!(context.navigations, vec!["/example.org/bar/baz"]);
    }

    #[test]
    fn test_interceptor_external_link_passes_through() {
        let mut context = RecordingContext::at("/example.org/current");
        let mut event = anchor_click(
            "https://other.example/page",
            Some("https://other.example/page"),
        );

        let handled = LinkInterceptor::new().handle(&mut event, &mut context);

        assert!(!handled);
        assert!(!event.default_prevented());
        assert!(context.navigations.is_empty());
    }

    #[test]
    fn test_interceptor_anchor_without_href() {
        let mut context = RecordingContext::at("/example.org/current");
        let mut event = anchor_click("", None);

        let handled = LinkInterceptor::new().handle(&mut event, &mut context);

        assert!(!handled);
        assert!(context.navigations.is_empty());
    }

    #[test]
    fn test_interceptor_does_not_navigate_twice() {
        let mut context = RecordingContext::at("/example.org/current");
        let mut event = anchor_click("gemini://example.org/foo", Some("gemini://example.org/foo"));
        let interceptor = LinkInterceptor::new();

        assert!(interceptor.handle(&mut event, &mut context));
        assert!(!interceptor.handle(&mut event, &mut context));

        assert_eq!(context.navigations.len(), 1);
    }
}
