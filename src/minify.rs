//! Text asset minification for the `js`, `css` and `html` tasks.
//!
//! | Task | Crate |
//! |---|---|
//! | JavaScript | [`minify_js`] (global top-level mode) |
//! | CSS | [`lightningcss`] parse → minify → print, with browser targets |
//! | HTML | [`minify_html`], inline `<script>`/`<style>` optionally minified |
//!
//! A syntax error fails the file; nothing is written for it.

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MinifyError {
    #[error("JavaScript syntax error: {0}")]
    Js(String),
    #[error("CSS error: {0}")]
    Css(String),
    #[error("Input is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("Unknown CSS compatibility target: {0} (expected \"*\" or e.g. \"ie11\")")]
    Compatibility(String),
}

/// Minify a JavaScript source as a classic (non-module) script.
pub fn minify_js(source: &[u8]) -> Result<Vec<u8>, MinifyError> {
    let session = minify_js::Session::new();
    let mut out = Vec::with_capacity(source.len());
    minify_js::minify(&session, minify_js::TopLevelMode::Global, source, &mut out)
        .map_err(|e| MinifyError::Js(format!("{e:?}")))?;
    Ok(out)
}

/// Parse a compatibility string into lightningcss browser targets.
///
/// - `"*"` or `""` → no down-levelling
/// - `"ie11"`, `"ie10"`, … → keep output working in that Internet Explorer version
pub fn css_browsers(compatibility: &str) -> Result<Option<Browsers>, MinifyError> {
    let compat = compatibility.trim().to_ascii_lowercase();
    if compat.is_empty() || compat == "*" {
        return Ok(None);
    }
    let version = compat
        .strip_prefix("ie")
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|v| (6..=11).contains(v))
        .ok_or_else(|| MinifyError::Compatibility(compatibility.to_string()))?;
    Ok(Some(Browsers {
        // lightningcss encodes versions as major << 16 | minor << 8 | patch
        ie: Some(version << 16),
        ..Browsers::default()
    }))
}

/// Minify a stylesheet.
pub fn minify_css(source: &[u8], browsers: Option<Browsers>) -> Result<Vec<u8>, MinifyError> {
    let code = std::str::from_utf8(source)?;
    let targets = browsers.map(Targets::from).unwrap_or_default();

    let mut sheet = StyleSheet::parse(code, ParserOptions::default())
        .map_err(|e| MinifyError::Css(e.to_string()))?;
    sheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| MinifyError::Css(e.to_string()))?;
    let printed = sheet
        .to_css(PrinterOptions {
            minify: true,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| MinifyError::Css(e.to_string()))?;
    Ok(printed.code.into_bytes())
}

/// HTML minification switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HtmlOptions {
    pub remove_comments: bool,
    pub minify_js: bool,
    pub minify_css: bool,
}

/// Minify an HTML document. minify-html is error tolerant, so this cannot fail.
pub fn minify_html(source: &[u8], options: &HtmlOptions) -> Vec<u8> {
    let cfg = minify_html::Cfg {
        keep_comments: !options.remove_comments,
        minify_js: options.minify_js,
        minify_css: options.minify_css,
        ..minify_html::Cfg::default()
    };
    minify_html::minify(source, &cfg)
}
