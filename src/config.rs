//! Pipeline configuration module.
//!
//! Handles loading, validating, and merging `asset-press.toml`. Stock
//! defaults are serialized to a TOML table and the user's file is merged on
//! top of it, so a config file only needs the keys it wants to change.
//!
//! ## Config File Location
//!
//! `asset-press.toml` in the working directory, or any file passed with
//! `--config`. Without either, the stock defaults apply. A file named
//! explicitly with `--config` must exist.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! public_dir = "public"                 # Built site to process in place
//! default_tasks = ["images", "vectors"] # What `asset-press default` runs
//!
//! [js]
//! include = ["**/*.js"]
//! exclude = ["**/*.min.js", "**/*-min.js"]
//!
//! [css]
//! include = ["**/*.css"]
//! exclude = ["**/*.min.css", "**/*-min.css"]
//! compatibility = "ie11"                # "*" for no down-levelling
//!
//! [html]
//! include = ["**/*.html"]
//! exclude = []
//! remove_comments = true
//! minify_js = true                      # Inline <script>
//! minify_css = true                     # Inline <style>
//!
//! [images]
//! include = ["**/*.jpg", "**/*.jpeg", "**/*.png"]
//! exclude = []
//! bounds = "fixed"                      # or "fraction"
//! max_width = 1920                      # bounds = "fixed"
//! max_height = 1080
//! divisor = 2                           # bounds = "fraction"
//! fit = "inside"
//! quality = 100                         # Scale-stage quality (1-100)
//! metadata = true                       # Keep ICC profiles
//! suffix = []                           # e.g. ["width", "height"]
//! # format = "webp"                     # Convert; omit to keep each source's format
//!
//! [compress]
//! jpeg_quality = 80                     # Final JPEG quality (1-100)
//! png_level = 5                         # oxipng preset (0-6)
//!
//! [vectors]
//! include = ["**/*.gif", "**/*.svg"]
//! exclude = []
//! gif_level = 3                         # 1 = fastest, 3 = smallest
//!
//! [processing]
//! max_processes = 4                     # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{
    BoundsPolicy, CompressParams, FitMode, Quality, RescalePlanner, TargetFormat,
};
use crate::minify::{HtmlOptions, MinifyError, css_browsers};
use crate::naming::SuffixToken;
use crate::scan::{ScanError, Selector};
use crate::tasks::Task;
use lightningcss::targets::Browsers;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory when `--config` is not given.
pub const CONFIG_FILENAME: &str = "asset-press.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration loaded from `asset-press.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetConfig {
    /// Root of the built site. Relative paths resolve against the working directory.
    pub public_dir: String,
    /// Tasks run by the `default` command, concurrently.
    pub default_tasks: Vec<Task>,
    pub js: JsConfig,
    pub css: CssConfig,
    pub html: HtmlConfig,
    pub images: ImagesConfig,
    pub compress: CompressConfig,
    pub vectors: VectorsConfig,
    pub processing: ProcessingConfig,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            public_dir: "public".to_string(),
            default_tasks: vec![Task::Images, Task::Vectors],
            js: JsConfig::default(),
            css: CssConfig::default(),
            html: HtmlConfig::default(),
            images: ImagesConfig::default(),
            compress: CompressConfig::default(),
            vectors: VectorsConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

fn patterns(list: &[&str]) -> Vec<String> {
    list.iter().map(|p| p.to_string()).collect()
}

impl AssetConfig {
    /// Include and exclude patterns of a task.
    pub fn patterns(&self, task: Task) -> (&[String], &[String]) {
        match task {
            Task::Js => (&self.js.include, &self.js.exclude),
            Task::Css => (&self.css.include, &self.css.exclude),
            Task::Html => (&self.html.include, &self.html.exclude),
            Task::Images => (&self.images.include, &self.images.exclude),
            Task::Vectors => (&self.vectors.include, &self.vectors.exclude),
        }
    }

    pub fn selector(&self, task: Task) -> Result<Selector, ScanError> {
        let (include, exclude) = self.patterns(task);
        Selector::new(include, exclude)
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.public_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "public_dir must not be empty".into(),
            ));
        }
        if self.default_tasks.is_empty() {
            return Err(ConfigError::Validation(
                "default_tasks must not be empty".into(),
            ));
        }
        for (i, task) in self.default_tasks.iter().enumerate() {
            if self.default_tasks[..i].contains(task) {
                return Err(ConfigError::Validation(format!(
                    "default_tasks lists {task} more than once"
                )));
            }
        }
        for task in Task::ALL {
            if self.patterns(task).0.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{task}.include must not be empty"
                )));
            }
            self.selector(task)
                .map_err(|e| ConfigError::Validation(format!("{task}: {e}")))?;
        }
        self.css
            .browsers()
            .map_err(|e| ConfigError::Validation(format!("css.compatibility: {e}")))?;
        self.images.validate()?;
        self.compress.validate()?;
        if !(1..=3).contains(&self.vectors.gif_level) {
            return Err(ConfigError::Validation(
                "vectors.gif_level must be 1-3".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JsConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Default for JsConfig {
    fn default() -> Self {
        Self {
            include: patterns(&["**/*.js"]),
            exclude: patterns(&["**/*.min.js", "**/*-min.js"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CssConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Oldest browser the output must keep working in (`"ie11"`), or `"*"`.
    pub compatibility: String,
}

impl Default for CssConfig {
    fn default() -> Self {
        Self {
            include: patterns(&["**/*.css"]),
            exclude: patterns(&["**/*.min.css", "**/*-min.css"]),
            compatibility: "ie11".to_string(),
        }
    }
}

impl CssConfig {
    pub fn browsers(&self) -> Result<Option<Browsers>, MinifyError> {
        css_browsers(&self.compatibility)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HtmlConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub remove_comments: bool,
    pub minify_js: bool,
    pub minify_css: bool,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            include: patterns(&["**/*.html"]),
            exclude: Vec::new(),
            remove_comments: true,
            minify_js: true,
            minify_css: true,
        }
    }
}

impl HtmlConfig {
    pub fn options(&self) -> HtmlOptions {
        HtmlOptions {
            remove_comments: self.remove_comments,
            minify_js: self.minify_js,
            minify_css: self.minify_css,
        }
    }
}

/// How image bounds are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundsMode {
    /// `max_width` × `max_height` for every image.
    #[default]
    Fixed,
    /// Each image's own size divided by `divisor`.
    Fraction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub bounds: BoundsMode,
    pub max_width: u32,
    pub max_height: u32,
    pub divisor: u32,
    pub fit: FitMode,
    /// Scale-stage quality; the compress stage applies the real lossy pass.
    pub quality: u32,
    pub metadata: bool,
    pub suffix: Vec<SuffixToken>,
    pub format: Option<TargetFormat>,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            include: patterns(&["**/*.jpg", "**/*.jpeg", "**/*.png"]),
            exclude: Vec::new(),
            bounds: BoundsMode::Fixed,
            max_width: 1920,
            max_height: 1080,
            divisor: 2,
            fit: FitMode::Inside,
            quality: 100,
            metadata: true,
            suffix: Vec::new(),
            format: None,
        }
    }
}

impl ImagesConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.quality) {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        match self.bounds {
            BoundsMode::Fixed if self.max_width == 0 || self.max_height == 0 => {
                Err(ConfigError::Validation(
                    "images.max_width and images.max_height must be non-zero".into(),
                ))
            }
            BoundsMode::Fraction if self.divisor == 0 => Err(ConfigError::Validation(
                "images.divisor must be non-zero".into(),
            )),
            _ => Ok(()),
        }
    }

    pub fn bounds_policy(&self) -> BoundsPolicy {
        match self.bounds {
            BoundsMode::Fixed => BoundsPolicy::Fixed {
                max_width: self.max_width,
                max_height: self.max_height,
            },
            BoundsMode::Fraction => BoundsPolicy::Fraction {
                divisor: self.divisor,
            },
        }
    }

    pub fn planner(&self) -> RescalePlanner {
        RescalePlanner {
            bounds: self.bounds_policy(),
            fit: self.fit,
            metadata: self.metadata,
            quality: Quality::new(self.quality),
            format: self.format,
            suffixes: self.suffix.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressConfig {
    pub jpeg_quality: u32,
    pub png_level: u8,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 80,
            png_level: 5,
        }
    }
}

impl CompressConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::Validation(
                "compress.jpeg_quality must be 1-100".into(),
            ));
        }
        if self.png_level > 6 {
            return Err(ConfigError::Validation(
                "compress.png_level must be 0-6".into(),
            ));
        }
        Ok(())
    }

    pub fn params(&self) -> CompressParams {
        CompressParams {
            jpeg_quality: Quality::new(self.jpeg_quality),
            png_level: self.png_level,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VectorsConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub gif_level: u8,
}

impl Default for VectorsConfig {
    fn default() -> Self {
        Self {
            include: patterns(&["**/*.gif", "**/*.svg"]),
            exclude: Vec::new(),
            gif_level: 3,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers. When absent, defaults to the
    /// number of CPU cores. Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Stock defaults as a TOML table, the base every user file merges onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AssetConfig::default()).expect("default config must serialize")
}

/// Deep-merge two TOML values. Tables merge key by key; anything else in
/// `overlay` replaces `base`.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value. `Ok(None)` when it does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge `overlay` onto `base`, deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AssetConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AssetConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective config.
///
/// `explicit` is the `--config` argument; it must exist. Without it,
/// [`CONFIG_FILENAME`] in the working directory is used when present.
pub fn load_config(explicit: Option<&Path>) -> Result<AssetConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => Some(
            load_raw_config(path)?.ok_or_else(|| ConfigError::NotFound(path.to_path_buf()))?,
        ),
        None => load_raw_config(Path::new(CONFIG_FILENAME))?,
    };
    resolve_config(stock_defaults_value(), overlay)
}

/// A fully documented stock config, printed by `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# asset-press configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# asset-press reads ./asset-press.toml, or the file given with --config.
# Unknown keys will cause an error.

# Built site to process. Every task rewrites files inside this tree.
public_dir = "public"

# Tasks run (concurrently) by `asset-press default`.
# Choices: "js", "css", "html", "images", "vectors".
default_tasks = ["images", "vectors"]

# ---------------------------------------------------------------------------
# JavaScript
# ---------------------------------------------------------------------------
[js]
include = ["**/*.js"]
# Already minified files are left alone.
exclude = ["**/*.min.js", "**/*-min.js"]

# ---------------------------------------------------------------------------
# CSS
# ---------------------------------------------------------------------------
[css]
include = ["**/*.css"]
exclude = ["**/*.min.css", "**/*-min.css"]

# Oldest browser the output must keep working in ("ie6" to "ie11"),
# or "*" to allow any modern syntax.
compatibility = "ie11"

# ---------------------------------------------------------------------------
# HTML
# ---------------------------------------------------------------------------
[html]
include = ["**/*.html"]
exclude = []
remove_comments = true

# Also minify inline <script> and <style> contents.
minify_js = true
minify_css = true

# ---------------------------------------------------------------------------
# Raster images (JPEG, PNG)
# ---------------------------------------------------------------------------
[images]
include = ["**/*.jpg", "**/*.jpeg", "**/*.png"]
exclude = []

# "fixed": every image is shrunk to fit max_width x max_height.
# "fraction": every image is shrunk to its own size divided by `divisor`.
bounds = "fixed"
max_width = 1920
max_height = 1080
divisor = 2

# "inside" keeps the aspect ratio and never enlarges.
# "cover" crops to exactly fill the bounds, "fill" stretches.
fit = "inside"

# Quality of the scaling step. Keep at 100: [compress] applies the
# real lossy pass afterwards.
quality = 100

# Carry embedded ICC color profiles over to the output.
metadata = true

# Tokens added to output names, e.g. ["width", "height"] turns
# photo.jpg into photo.1920w-1080h.jpg (the original stays in place).
suffix = []

# Convert every image to "jpg", "png", "webp" or "avif".
# Omit to keep each image's own format.
# format = "webp"

# ---------------------------------------------------------------------------
# Recompression after scaling
# ---------------------------------------------------------------------------
[compress]
# JPEG re-encode quality (1-100).
jpeg_quality = 80

# Lossless PNG optimization preset (0 = fastest, 6 = smallest).
png_level = 5

# ---------------------------------------------------------------------------
# Animated and vector images (GIF, SVG)
# ---------------------------------------------------------------------------
[vectors]
include = ["**/*.gif", "**/*.svg"]
exclude = []

# GIF encoder effort (1 = fastest, 3 = smallest).
gif_level = 3

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn default_config_values() {
        let config = AssetConfig::default();
        assert_eq!(config.public_dir, "public");
        assert_eq!(config.default_tasks, vec![Task::Images, Task::Vectors]);
        assert_eq!(config.css.compatibility, "ie11");
        assert_eq!(config.compress.jpeg_quality, 80);
        assert_eq!(config.compress.png_level, 5);
        assert_eq!(config.vectors.gif_level, 3);
    }

    #[test]
    fn default_planner_is_stock_plan() {
        let planner = AssetConfig::default().images.planner();
        assert_eq!(
            planner.bounds,
            BoundsPolicy::Fixed {
                max_width: 1920,
                max_height: 1080
            }
        );
        assert_eq!(planner.fit, FitMode::Inside);
        assert!(planner.metadata);
        assert_eq!(planner.quality, Quality::max());
        assert_eq!(planner.format, None);
        assert!(planner.suffixes.is_empty());
    }

    #[test]
    fn fraction_bounds_from_config() {
        let config: AssetConfig = toml::from_str(
            r#"
[images]
bounds = "fraction"
divisor = 4
"#,
        )
        .unwrap();
        assert_eq!(
            config.images.bounds_policy(),
            BoundsPolicy::Fraction { divisor: 4 }
        );
    }

    #[test]
    fn parse_format_and_suffix() {
        let config: AssetConfig = toml::from_str(
            r#"
[images]
format = "webp"
suffix = ["width", "height"]
"#,
        )
        .unwrap();
        assert_eq!(config.images.format, Some(TargetFormat::WebP));
        assert_eq!(
            config.images.suffix,
            vec![SuffixToken::Width, SuffixToken::Height]
        );
    }

    #[test]
    fn parse_default_tasks_accepts_aliases() {
        let config: AssetConfig =
            toml::from_str(r#"default_tasks = ["jpg|png", "css", "gif|svg"]"#).unwrap();
        assert_eq!(
            config.default_tasks,
            vec![Task::Images, Task::Css, Task::Vectors]
        );
    }

    #[test]
    fn compress_params_from_config() {
        let params = CompressConfig {
            jpeg_quality: 70,
            png_level: 2,
        }
        .params();
        assert_eq!(params.jpeg_quality, Quality::new(70));
        assert_eq!(params.png_level, 2);
    }

    #[test]
    fn html_options_from_config() {
        let config = HtmlConfig {
            minify_css: false,
            ..HtmlConfig::default()
        };
        let options = config.options();
        assert!(options.remove_comments);
        assert!(options.minify_js);
        assert!(!options.minify_css);
    }

    #[test]
    fn selector_for_each_task() {
        let config = AssetConfig::default();
        assert!(config.selector(Task::Js).unwrap().matches("a/app.js"));
        assert!(!config.selector(Task::Js).unwrap().matches("a/app.min.js"));
        assert!(config.selector(Task::Css).unwrap().matches("style.css"));
        assert!(config.selector(Task::Html).unwrap().matches("blog/index.html"));
        assert!(config.selector(Task::Images).unwrap().matches("img/a.png"));
        assert!(config.selector(Task::Vectors).unwrap().matches("logo.svg"));
        assert!(!config.selector(Task::Images).unwrap().matches("logo.svg"));
    }

    // =========================================================================
    // Processing config
    // =========================================================================

    #[test]
    fn effective_threads_auto() {
        let config = ProcessingConfig {
            max_processes: None,
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let config = ProcessingConfig {
            max_processes: Some(99999),
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"png_level = 5"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"png_level = 2"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("png_level").unwrap().as_integer(), Some(2));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[images]
max_width = 1920
max_height = 1080
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[images]
max_width = 800
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let images = merged.get("images").unwrap();
        assert_eq!(images.get("max_width").unwrap().as_integer(), Some(800));
        assert_eq!(images.get("max_height").unwrap().as_integer(), Some(1080));
    }

    #[test]
    fn merge_toml_replaces_arrays() {
        let base: toml::Value = toml::from_str(r#"include = ["**/*.js", "**/*.mjs"]"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"include = ["app/**/*.js"]"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("include").unwrap().as_array().unwrap().len(), 1);
    }

    // =========================================================================
    // Unknown key rejection tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let result: Result<AssetConfig, _> = toml::from_str(
            r#"
[images]
max_widht = 800
"#,
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<AssetConfig, _> = toml::from_str("[imagez]\nquality = 90\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_task_rejected() {
        let result: Result<AssetConfig, _> = toml::from_str(r#"default_tasks = ["fonts"]"#);
        assert!(result.is_err());
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(AssetConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_quality_bounds() {
        let mut config = AssetConfig::default();
        config.images.quality = 0;
        assert!(config.validate().unwrap_err().to_string().contains("images.quality"));

        let mut config = AssetConfig::default();
        config.compress.jpeg_quality = 101;
        assert!(config.validate().unwrap_err().to_string().contains("jpeg_quality"));
    }

    #[test]
    fn validate_png_and_gif_levels() {
        let mut config = AssetConfig::default();
        config.compress.png_level = 7;
        assert!(config.validate().is_err());

        let mut config = AssetConfig::default();
        config.vectors.gif_level = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_bounds() {
        let mut config = AssetConfig::default();
        config.images.max_width = 0;
        assert!(config.validate().is_err());

        // max_width is irrelevant in fraction mode
        config.images.bounds = BoundsMode::Fraction;
        assert!(config.validate().is_ok());
        config.images.divisor = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_globs_and_empty_include() {
        let mut config = AssetConfig::default();
        config.js.include = vec!["**/*.{js".into()];
        assert!(config.validate().unwrap_err().to_string().contains("js"));

        let mut config = AssetConfig::default();
        config.html.include.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_compatibility() {
        let mut config = AssetConfig::default();
        config.css.compatibility = "netscape4".into();
        assert!(config.validate().unwrap_err().to_string().contains("css.compatibility"));
    }

    #[test]
    fn validate_rejects_zero_processes_and_empty_defaults() {
        let mut config = AssetConfig::default();
        config.processing.max_processes = Some(0);
        assert!(config.validate().is_err());

        let mut config = AssetConfig::default();
        config.default_tasks.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_default_tasks_after_aliases() {
        let config: AssetConfig =
            toml::from_str(r#"default_tasks = ["images", "jpg|png"]"#).unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("default_tasks lists images more than once"), "{err}");
    }

    // =========================================================================
    // Loading
    // =========================================================================

    #[test]
    fn load_config_explicit_file() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            &tmp,
            r#"
public_dir = "dist"

[compress]
jpeg_quality = 65
"#,
        );
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.public_dir, "dist");
        assert_eq!(config.compress.jpeg_quality, 65);
        // Untouched keys keep stock values
        assert_eq!(config.compress.png_level, 5);
        assert_eq!(config.images.max_width, 1920);
    }

    #[test]
    fn load_config_explicit_missing_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(Some(&tmp.path().join("missing.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "this is not valid toml [[[");
        let result = load_config(Some(&path));
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "[images]\nquality = 200\n");
        let result = load_config(Some(&path));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn load_raw_config_returns_none_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let result = load_raw_config(&tmp.path().join(CONFIG_FILENAME)).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn resolve_config_with_no_overlay() {
        let config = resolve_config(stock_defaults_value(), None).unwrap();
        assert_eq!(config.images.max_height, 1080);
    }

    #[test]
    fn resolve_config_rejects_invalid_values() {
        let overlay: toml::Value = toml::from_str("[vectors]\ngif_level = 9\n").unwrap();
        let result = resolve_config(stock_defaults_value(), Some(overlay));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // stock_config_toml / stock_defaults_value tests
    // =========================================================================

    #[test]
    fn stock_config_toml_is_valid_toml() {
        let _: toml::Value =
            toml::from_str(stock_config_toml()).expect("stock config must be valid TOML");
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let parsed: toml::Value = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(parsed, stock_defaults_value());
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value();
        let table = val.as_table().unwrap();
        for key in [
            "public_dir",
            "default_tasks",
            "js",
            "css",
            "html",
            "images",
            "compress",
            "vectors",
            "processing",
        ] {
            assert!(table.contains_key(key), "missing {key}");
        }
    }
}
