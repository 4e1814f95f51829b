//! Core type definitions for csjava

use crate::interpreter::Fields;
use crate::suffix::SuffixMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Marker placed in `translated_code` when the completion call failed
pub const CONVERSION_ERROR_MARKER: &str = "// Conversion failed";

/// Warning attached to results built from an unparseable reply
pub const DEGRADED_WARNING: &str = "Response was not valid JSON; details are limited.";

/// Supported completion providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Azure,
    OpenAI,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Azure => "azure",
            Provider::OpenAI => "openai",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "azure" => Some(Provider::Azure),
            "openai" => Some(Provider::OpenAI),
            _ => None,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One piece of C# source text to translate or analyze
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUnit {
    /// Path within the project (or the uploaded file name)
    pub name: String,
    pub content: String,
    /// Upload name of the archive this unit came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive: Option<String>,
}

impl SourceUnit {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            archive: None,
        }
    }
}

/// Where an archive member's bytes live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberData {
    /// Uncompressed bytes held in memory
    Inline(Vec<u8>),
    /// Member `index` of an uploaded archive, still in its original encoding
    Stored { archive: Arc<[u8]>, index: usize },
}

/// One non-directory member of an uploaded archive, kept byte-for-byte
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub data: MemberData,
    pub is_text: bool,
}

impl ArchiveEntry {
    pub fn inline(path: impl Into<String>, bytes: impl Into<Vec<u8>>, is_text: bool) -> Self {
        Self {
            path: path.into(),
            data: MemberData::Inline(bytes.into()),
            is_text,
        }
    }
}

/// Every member of the archives in one upload, in archive order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectLayout {
    /// First archive's file name without `.zip`
    pub name: Option<String>,
    pub entries: Vec<ArchiveEntry>,
}

impl ProjectLayout {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Translated text for one source path, input to the re-packager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub source_path: String,
    pub content: String,
}

/// Conversion switches forwarded to the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOptions {
    pub include_comments: bool,
    pub generate_getters_setters: bool,
    pub use_java_conventions: bool,
    pub use_project_context: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            include_comments: true,
            generate_getters_setters: true,
            use_java_conventions: true,
            use_project_context: false,
        }
    }
}

impl ConversionOptions {
    /// Options echoed back in `applied_options` (project context excluded)
    pub fn applied(&self) -> BTreeMap<String, bool> {
        BTreeMap::from([
            ("include_comments".to_string(), self.include_comments),
            (
                "generate_getters_setters".to_string(),
                self.generate_getters_setters,
            ),
            ("use_java_conventions".to_string(), self.use_java_conventions),
        ])
    }
}

/// Translation of one source unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub source_name: String,
    pub target_name: String,
    pub translated_code: String,
    #[serde(default)]
    pub package_declaration: String,
    #[serde(default)]
    pub imports: Vec<String>,
    pub notes: String,
    pub warnings: Vec<String>,
    #[serde(default)]
    pub type_mappings: BTreeMap<String, String>,
    pub applied_options: BTreeMap<String, bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive: Option<String>,
    #[serde(default)]
    pub original_content: String,
}

impl ConversionResult {
    /// Build a result from an interpreted reply, defaulting missing fields
    pub fn from_payload(
        unit: &SourceUnit,
        payload: &Value,
        options: &ConversionOptions,
        suffixes: &SuffixMap,
    ) -> Self {
        let fields = Fields::new(payload);
        let mut applied_options = fields.bool_map("applied_options");
        if applied_options.is_empty() {
            applied_options = options.applied();
        }

        Self {
            source_name: unit.name.clone(),
            target_name: suffixes.target_path_or_same(&unit.name),
            translated_code: fields.str_or("java_code", ""),
            package_declaration: fields.str_or("package_declaration", ""),
            imports: fields.strings("imports"),
            notes: fields
                .first_str(&["conversion_notes", "notes"])
                .unwrap_or_default(),
            warnings: fields.strings("warnings"),
            type_mappings: fields.string_map("type_mappings"),
            applied_options,
            archive: unit.archive.clone(),
            original_content: unit.content.clone(),
        }
    }

    /// Default payload used when the reply cannot be interpreted: the raw
    /// reply becomes the translated code.
    pub fn fallback_payload(raw_reply: &str, options: &ConversionOptions) -> Value {
        json!({
            "java_code": raw_reply,
            "package_declaration": "",
            "imports": [],
            "conversion_notes": "AI-generated conversion result.",
            "warnings": [DEGRADED_WARNING],
            "type_mappings": {},
            "applied_options": options.applied(),
        })
    }

    /// Placeholder for a unit whose completion call failed
    pub fn failed(unit: &SourceUnit, options: &ConversionOptions, suffixes: &SuffixMap) -> Self {
        Self {
            source_name: unit.name.clone(),
            target_name: suffixes.target_path_or_same(&unit.name),
            translated_code: CONVERSION_ERROR_MARKER.to_string(),
            package_declaration: String::new(),
            imports: Vec::new(),
            notes: "Conversion failed".to_string(),
            warnings: vec!["Conversion failed".to_string()],
            type_mappings: BTreeMap::new(),
            applied_options: options.applied(),
            archive: unit.archive.clone(),
            original_content: unit.content.clone(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.translated_code.contains(CONVERSION_ERROR_MARKER)
    }

    pub fn translation(&self) -> Translation {
        Translation {
            source_path: self.source_name.clone(),
            content: self.translated_code.clone(),
        }
    }
}

/// Summary of one conversion batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub total_files: usize,
    pub succeeded: usize,
    /// Percentage of results without the error marker
    pub success_rate: f64,
    pub total_warnings: usize,
    pub finished_at: DateTime<Utc>,
    pub used_project_context: bool,
    pub options: ConversionOptions,
}

impl ConversionStats {
    pub fn from_results(
        results: &[ConversionResult],
        used_project_context: bool,
        options: ConversionOptions,
    ) -> Self {
        let total_files = results.len();
        let succeeded = results.iter().filter(|r| !r.is_failure()).count();
        let success_rate = if total_files == 0 {
            0.0
        } else {
            succeeded as f64 / total_files as f64 * 100.0
        };

        Self {
            total_files,
            succeeded,
            success_rate,
            total_warnings: results.iter().map(|r| r.warnings.len()).sum(),
            finished_at: Utc::now(),
            used_project_context,
            options,
        }
    }
}

/// Results of the most recent batch, with what is needed to repackage them
#[derive(Debug, Clone)]
pub struct ConversionBatch {
    pub results: Vec<ConversionResult>,
    pub stats: ConversionStats,
    pub layout: Option<ProjectLayout>,
    pub warnings: Vec<String>,
}

impl ConversionBatch {
    pub fn translations(&self) -> Vec<Translation> {
        self.results.iter().map(ConversionResult::translation).collect()
    }

    /// Base name for downloads: the archive name, else the first source
    /// name without its suffix, else `converted_files`.
    pub fn download_base_name(&self, suffixes: &SuffixMap) -> String {
        if let Some(name) = self.layout.as_ref().and_then(|l| l.name.clone()) {
            return name;
        }
        self.results
            .first()
            .map(|r| {
                let name = suffixes.strip_source_suffix(&r.source_name);
                name.rsplit('/').next().unwrap_or(name).to_string()
            })
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "converted_files".to_string())
    }
}

/// One problem reported by an analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: String,
    pub description: String,
    pub severity: String,
    #[serde(default)]
    pub line_info: String,
}

/// One refactoring suggestion reported by an analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub category: String,
    pub text: String,
    #[serde(default)]
    pub benefit: String,
    pub priority: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeMetrics {
    pub lines_of_code: Option<u64>,
    pub methods_count: Option<u64>,
    pub classes_count: Option<u64>,
    pub estimated_maintainability: Option<String>,
}

/// Code-quality analysis of one C# snippet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub complexity_score: u64,
    pub quality_score: u64,
    pub code_patterns: Vec<String>,
    pub issues: Vec<Issue>,
    pub suggestions: Vec<Suggestion>,
    pub java_conversion_notes: Vec<String>,
    pub metrics: CodeMetrics,
    pub summary: String,
}

impl AnalysisResult {
    /// Default payload used when the reply cannot be interpreted
    pub fn fallback_payload() -> Value {
        json!({
            "complexity_score": 5,
            "quality_score": 70,
            "code_patterns": [],
            "potential_issues": [],
            "refactoring_suggestions": [],
            "java_conversion_notes": [],
            "code_metrics": {},
            "summary": "An error occurred during analysis.",
        })
    }

    pub fn from_payload(payload: &Value) -> Self {
        let fields = Fields::new(payload);

        let issues = fields
            .objects(&["potential_issues", "issues"])
            .into_iter()
            .map(|issue| Issue {
                kind: issue
                    .first_str(&["type", "kind"])
                    .unwrap_or_else(|| "Unknown".to_string()),
                description: issue.str_or("description", "No description"),
                severity: issue.str_or("severity", "medium"),
                line_info: issue.str_or("line_info", ""),
            })
            .collect();

        let suggestions = fields
            .objects(&["refactoring_suggestions", "suggestions"])
            .into_iter()
            .map(|s| Suggestion {
                category: s.str_or("category", "General"),
                text: s
                    .first_str(&["suggestion", "text"])
                    .unwrap_or_default(),
                benefit: s.str_or("benefit", ""),
                priority: s.str_or("priority", "medium"),
            })
            .collect();

        let metrics = fields
            .object("code_metrics")
            .map(|m| CodeMetrics {
                lines_of_code: m.text("lines_of_code").and_then(|v| v.parse().ok()),
                methods_count: m.text("methods_count").and_then(|v| v.parse().ok()),
                classes_count: m.text("classes_count").and_then(|v| v.parse().ok()),
                estimated_maintainability: m.first_str(&["estimated_maintainability"]),
            })
            .unwrap_or_default();

        Self {
            complexity_score: fields.u64_or("complexity_score", 5),
            quality_score: fields.u64_or("quality_score", 70),
            code_patterns: fields.strings("code_patterns"),
            issues,
            suggestions,
            java_conversion_notes: fields.strings("java_conversion_notes"),
            metrics,
            summary: fields.str_or("summary", ""),
        }
    }
}

/// One entry of the analysis history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    #[serde(flatten)]
    pub analysis: AnalysisResult,
    pub filename: String,
    pub analyzed_at: DateTime<Utc>,
    pub code_length: usize,
}

impl AnalysisRecord {
    pub fn new(analysis: AnalysisResult, filename: impl Into<String>, code: &str) -> Self {
        Self {
            analysis,
            filename: filename.into(),
            analyzed_at: Utc::now(),
            code_length: code.chars().count(),
        }
    }
}

/// Configuration validation result
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn with_error(mut self, error: ValidationError) -> Self {
        self.valid = false;
        self.errors.push(error);
        self
    }

    pub fn with_warning(mut self, warning: ValidationWarning) -> Self {
        self.warnings.push(warning);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub code: String,
}

#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}
