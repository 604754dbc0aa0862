//! Configuration schema types for `vivliostyle.config.*`
//!
//! Defines both the structural schema used to validate a raw config value and
//! the typed structures it deserializes into. A config is either a single
//! build task object or a non-empty array of them.
//!
//! The structural schema is a JSON Schema document. Alternatives are written
//! as `anyOf` and every subschema is inline, so each alternative can be
//! validated on its own.

use crate::schema::{JsonSchema, SchemaError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::OnceLock;

/// A value that may be given once or as a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Borrow all values as a list.
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::One(value) => std::slice::from_ref(value),
            OneOrMany::Many(values) => values,
        }
    }
}

/// Theme specifier: a package name, path or URL, optionally with imports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThemeConfig {
    Specifier(String),
    Object {
        specifier: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        import: Option<OneOrMany<String>>,
    },
}

/// Page progression direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingProgression {
    Ltr,
    Rtl,
}

/// Role of an entry that is generated rather than read from a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialEntryRel {
    Contents,
    Cover,
}

/// A manuscript file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleEntry {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<OneOrMany<ThemeConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<OneOrMany<String>>,
}

/// A generated table of contents or cover page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialEntry {
    pub rel: SpecialEntryRel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<OneOrMany<ThemeConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_break_before: Option<String>,
}

/// One entry of the publication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryConfig {
    Path(String),
    Article(ArticleEntry),
    Special(SpecialEntry),
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Pdf,
    Epub,
    Webpub,
}

/// Where PDF rendering runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    Local,
    Docker,
}

/// PDF post-processing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preflight {
    PressReady,
    PressReadyLocal,
}

/// Detailed output target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputObject {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_mode: Option<RenderMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preflight: Option<Preflight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preflight_option: Option<Vec<String>>,
}

/// Output target: a path or a detailed object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputConfig {
    Path(String),
    Object(OutputObject),
}

/// Table of contents settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TocConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_depth: Option<u8>,
}

/// `toc`: enabled flag, output path, or detailed settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TocOption {
    Enabled(bool),
    HtmlPath(String),
    Config(TocConfig),
}

/// Cover settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverConfig {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_path: Option<String>,
}

/// `cover`: image path or detailed settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoverOption {
    Src(String),
    Config(CoverConfig),
}

/// Asset copy filters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyAssetConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub includes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excludes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_file_extensions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_file_extensions: Option<Vec<String>>,
}

/// One build task: a publication and how to produce it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<OneOrMany<ThemeConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<OneOrMany<EntryConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OneOrMany<OutputConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_dir: Option<String>,
    /// Deprecated: use `copy_asset.includes`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_assets: Option<OneOrMany<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy_asset: Option<CopyAssetConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub press_ready: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_progression: Option<ReadingProgression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toc: Option<TocOption>,
    /// Deprecated: use `toc.title`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toc_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<CoverOption>,
    /// Timeout in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Deprecated: always enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer_param: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,
}

/// Raw config shape: a single task or a list of tasks
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum VivliostyleConfig {
    Many(Vec<BuildTask>),
    One(Box<BuildTask>),
}

impl VivliostyleConfig {
    /// Normalize into an ordered task list.
    pub fn into_tasks(self) -> Vec<BuildTask> {
        match self {
            VivliostyleConfig::Many(tasks) => tasks,
            VivliostyleConfig::One(task) => vec![*task],
        }
    }
}

/// Options that apply across all tasks of a load
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineOptions {
    /// Working directory the config was resolved against
    pub cwd: PathBuf,
    /// Absolute path of the config file, if one was loaded from disk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<PathBuf>,
}

/// A validated config, ready for the build pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedConfig {
    pub tasks: Vec<BuildTask>,
    pub inline_options: InlineOptions,
}

fn string() -> Value {
    json!({"type": "string"})
}

fn string_array() -> Value {
    json!({"type": "array", "items": string()})
}

fn one_or_many(item: Value) -> Value {
    json!({"anyOf": [item.clone(), {"type": "array", "items": item}]})
}

fn theme_schema() -> Value {
    one_or_many(json!({
        "anyOf": [
            string(),
            {
                "type": "object",
                "properties": {
                    "specifier": string(),
                    "import": one_or_many(string()),
                },
                "required": ["specifier"],
            },
        ]
    }))
}

fn entry_item_schema() -> Value {
    json!({
        "anyOf": [
            string(),
            {
                "type": "object",
                "properties": {
                    "path": string(),
                    "title": string(),
                    "theme": theme_schema(),
                    "encodingFormat": string(),
                    "rel": one_or_many(string()),
                },
                "required": ["path"],
            },
            {
                "type": "object",
                "properties": {
                    "rel": {"enum": ["contents", "cover"]},
                    "title": string(),
                    "theme": theme_schema(),
                    "pageBreakBefore": {"enum": ["left", "right", "recto", "verso"]},
                },
                "required": ["rel"],
            },
        ]
    })
}

fn output_item_schema() -> Value {
    json!({
        "anyOf": [
            string(),
            {
                "type": "object",
                "properties": {
                    "path": string(),
                    "format": {"enum": ["pdf", "epub", "webpub"]},
                    "renderMode": {"enum": ["local", "docker"]},
                    "preflight": {"enum": ["press-ready", "press-ready-local"]},
                    "preflightOption": string_array(),
                },
                "required": ["path"],
            },
        ]
    })
}

/// Schema of a single build task.
pub fn build_task_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": string(),
            "author": string(),
            "theme": theme_schema(),
            "entry": {
                "anyOf": [
                    entry_item_schema(),
                    {"type": "array", "items": entry_item_schema(), "minItems": 1},
                ]
            },
            "entryContext": string(),
            "output": one_or_many(output_item_schema()),
            "workspaceDir": string(),
            "includeAssets": one_or_many(string()),
            "copyAsset": {
                "type": "object",
                "properties": {
                    "includes": string_array(),
                    "excludes": string_array(),
                    "includeFileExtensions": string_array(),
                    "excludeFileExtensions": string_array(),
                },
            },
            "size": string(),
            "pressReady": {"type": "boolean"},
            "language": string(),
            "readingProgression": {"enum": ["ltr", "rtl"]},
            "toc": {
                "anyOf": [
                    {"type": "boolean"},
                    string(),
                    {
                        "type": "object",
                        "properties": {
                            "title": string(),
                            "htmlPath": string(),
                            "sectionDepth": {"type": "integer", "minimum": 0, "maximum": 6},
                        },
                    },
                ]
            },
            "tocTitle": string(),
            "cover": {
                "anyOf": [
                    string(),
                    {
                        "type": "object",
                        "properties": {
                            "src": string(),
                            "name": string(),
                            "htmlPath": string(),
                        },
                        "required": ["src"],
                    },
                ]
            },
            "timeout": {"type": "integer", "minimum": 0},
            "image": string(),
            "http": {"type": "boolean"},
            "viewer": string(),
            "viewerParam": string(),
            "browser": string(),
        },
    })
}

/// Schema of a whole config: a non-empty list of tasks or one task.
pub fn vivliostyle_config_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "anyOf": [
            {"type": "array", "items": build_task_schema(), "minItems": 1},
            build_task_schema(),
        ]
    })
}

static CONFIG_SCHEMA: OnceLock<Result<JsonSchema, SchemaError>> = OnceLock::new();

/// The compiled config schema, built on first use.
pub fn compiled_config_schema() -> Result<&'static JsonSchema, SchemaError> {
    CONFIG_SCHEMA.get_or_init(|| JsonSchema::new(vivliostyle_config_schema())).as_ref().map_err(Clone::clone)
}
