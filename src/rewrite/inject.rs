//! Client-side navigation interceptor.
//!
//! Markup rewriting only sees URLs present in the document. Scripts build
//! URLs at runtime, so a small script appended to `<head>` wraps the browser
//! APIs that take a URL and applies the same remapping rule in the page.

use super::RewriteContext;

/// Attribute placed on `<head>` once the interceptor has been injected.
pub const INTERCEPTOR_MARKER: &str = "data-siteproxy";

const INTERCEPTOR_BODY: &str = r"
  function rewriteUrl(url) {
    if (!url || typeof url !== 'string' || url.startsWith(proxy)) return url;
    if (url.startsWith('http')) return proxy + '/' + url;
    if (url.startsWith('//')) return proxy + '/https:' + url;
    if (url.startsWith('/')) return proxy + '/' + target + url;
    return url;
  }
  document.addEventListener('click', function (e) {
    var a = e.target && e.target.closest ? e.target.closest('a') : null;
    if (!a || !a.href) return;
    var href = a.href;
    if (href.startsWith('http') && !href.startsWith(proxy)) {
      e.preventDefault();
      window.location.href = proxy + '/' + href;
    }
  }, true);
  var originalOpen = window.open;
  window.open = function (url) {
    var args = Array.prototype.slice.call(arguments);
    args[0] = rewriteUrl(url);
    return originalOpen.apply(window, args);
  };
  var originalFetch = window.fetch;
  if (originalFetch) {
    window.fetch = function (input, init) {
      if (typeof input === 'string') {
        input = rewriteUrl(input);
      } else if (input instanceof Request) {
        var rewritten = rewriteUrl(input.url);
        if (rewritten !== input.url) input = new Request(rewritten, input);
      }
      return originalFetch.call(window, input, init);
    };
  }
  var originalXhrOpen = XMLHttpRequest.prototype.open;
  XMLHttpRequest.prototype.open = function (method, url) {
    var args = Array.prototype.slice.call(arguments);
    args[1] = rewriteUrl(url);
    return originalXhrOpen.apply(this, args);
  };
  if (navigator.sendBeacon) {
    var originalBeacon = navigator.sendBeacon;
    navigator.sendBeacon = function (url, data) {
      return originalBeacon.call(navigator, rewriteUrl(url), data);
    };
  }
";

/// Renders the `<script>` block appended to `<head>`.
#[must_use]
pub fn interceptor_script(cx: &RewriteContext) -> String {
    format!(
        "<script>(function () {{\n  var proxy = {};\n  var target = {};\n{INTERCEPTOR_BODY}}})();</script>",
        js_string(&cx.proxy_origin),
        js_string(&cx.target_origin),
    )
}

/// Encodes a value as a JavaScript string literal that is safe inside `<script>`.
fn js_string(value: &str) -> String {
    serde_json::Value::from(value)
        .to_string()
        .replace("</", "<\\/")
}
