//! Prompt construction for conversion, analysis and project context

use crate::types::{ConversionOptions, SourceUnit};
use serde_json::Value;

/// Files summarized for the project-context pass
pub const CONTEXT_FILE_LIMIT: usize = 10;

/// Declaration keywords kept when summarizing a file for project context
const CONTEXT_KEYWORDS: &[&str] = &["class ", "interface ", "public ", "private ", "protected "];

pub const ANALYSIS_SYSTEM_PROMPT: &str = "You are a senior C# developer and code reviewer with 20 years of experience. Provide accurate and practical analysis.";

pub const CONTEXT_SYSTEM_PROMPT: &str = r#"Analyze the following C# project and provide the information needed for a Java conversion as JSON:

{
    "namespaces": ["namespace list"],
    "interfaces": [{"name": "interface name", "methods": ["methods"]}],
    "base_classes": [{"name": "class name", "properties": ["properties"]}],
    "custom_types": ["custom types"],
    "dependencies": [{"from": "ClassA", "to": "ClassB", "type": "inheritance|implementation|dependency"}]
}"#;

/// System prompt for a conversion, one rule per option
pub fn conversion_system_prompt(options: &ConversionOptions) -> String {
    let mut rules = Vec::with_capacity(3);

    rules.push(if options.include_comments {
        "- Convert the original C# comments to Java style and keep them"
    } else {
        "- Drop comments and convert only the code"
    });
    rules.push(if options.generate_getters_setters {
        "- Convert C# properties to private fields with public getter/setter methods"
    } else {
        "- Convert C# properties to plain public fields"
    });
    rules.push(if options.use_java_conventions {
        "- Apply Java naming conventions (camelCase members, lowercase package names)"
    } else {
        "- Keep the original C# names as far as possible"
    });

    format!(
        "You are an expert in converting C# code to Java.\n\nConversion options:\n{}",
        rules.join("\n")
    )
}

fn applied_options_json(options: &ConversionOptions) -> String {
    format!(
        r#"{{"include_comments": {}, "generate_getters_setters": {}, "use_java_conventions": {}}}"#,
        options.include_comments, options.generate_getters_setters, options.use_java_conventions
    )
}

/// User prompt for a conversion without project context
pub fn conversion_user_prompt(unit: &SourceUnit, options: &ConversionOptions) -> String {
    format!(
        r#"Convert the following C# code to Java.

File name: {name}
C# code:
```csharp
{code}
```

Respond in JSON:
{{
    "java_code": "converted Java code",
    "imports": ["required import statements"],
    "conversion_notes": "summary of the main conversion changes",
    "warnings": ["parts that need attention"],
    "applied_options": {applied}
}}
"#,
        name = unit.name,
        code = unit.content,
        applied = applied_options_json(options),
    )
}

/// System prompt extended with the project context and consistency rules
pub fn context_system_prompt(options: &ConversionOptions, context: &Value) -> String {
    let context_json =
        serde_json::to_string_pretty(context).unwrap_or_else(|_| context.to_string());

    format!(
        r#"{base}

Project context:
{context_json}

Use this information to keep type conversions consistent.

Follow these rules:
1. Convert class names consistently
2. Keep interface implementation relationships
3. Map custom types to suitable Java types
4. Convert namespaces to packages"#,
        base = conversion_system_prompt(options),
    )
}

/// User prompt for a conversion that uses project context
pub fn context_user_prompt(unit: &SourceUnit, options: &ConversionOptions) -> String {
    format!(
        r#"Convert the following C# code to Java.

File name: {name}
C# code:
```csharp
{code}
```

Respond in JSON:
{{
    "java_code": "converted Java code",
    "package_declaration": "package declaration",
    "imports": ["required import statements"],
    "conversion_notes": "summary of the main conversion changes",
    "warnings": ["parts that need attention"],
    "type_mappings": {{"C# type": "Java type"}},
    "applied_options": {applied}
}}
"#,
        name = unit.name,
        code = unit.content,
        applied = applied_options_json(options),
    )
}

/// User prompt for a code-quality analysis
pub fn analysis_user_prompt(code: &str, filename: &str) -> String {
    format!(
        r#"Analyze the following C# code.

File name: {filename}
C# code:
```csharp
{code}
```

Respond in this JSON format:
{{
    "complexity_score": number (1-10),
    "quality_score": number (1-100),
    "code_patterns": ["pattern1", "pattern2"],
    "potential_issues": [
        {{"type": "performance|security|readability|maintainability", "description": "problem", "severity": "low|medium|high", "line_info": "affected lines"}}
    ],
    "refactoring_suggestions": [
        {{"category": "performance|structure|naming|security", "suggestion": "concrete improvement", "benefit": "expected effect", "priority": "low|medium|high"}}
    ],
    "java_conversion_notes": ["Java conversion note 1", "Java conversion note 2"],
    "code_metrics": {{"lines_of_code": number, "methods_count": number, "classes_count": number, "estimated_maintainability": "low|medium|high"}},
    "summary": "overall assessment"
}}
"#
    )
}

/// Declaration-only summary of up to [`CONTEXT_FILE_LIMIT`] files
pub fn project_summary(units: &[SourceUnit]) -> String {
    units
        .iter()
        .take(CONTEXT_FILE_LIMIT)
        .map(|unit| {
            let mut summary = format!("// {}\n", unit.name);
            for line in unit.content.lines() {
                if CONTEXT_KEYWORDS.iter().any(|kw| line.contains(kw)) {
                    summary.push_str(line.trim());
                    summary.push('\n');
                }
            }
            summary
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_system_prompt_follows_options() {
        let prompt = conversion_system_prompt(&ConversionOptions::default());
        assert!(prompt.contains("Java style"));
        assert!(prompt.contains("getter/setter"));
        assert!(prompt.contains("camelCase"));

        let prompt = conversion_system_prompt(&ConversionOptions {
            include_comments: false,
            generate_getters_setters: false,
            use_java_conventions: false,
            use_project_context: false,
        });
        assert!(prompt.contains("Drop comments"));
        assert!(prompt.contains("plain public fields"));
        assert!(prompt.contains("original C# names"));
    }

    #[test]
    fn test_user_prompt_embeds_code_and_options() {
        let unit = SourceUnit::new("Person.cs", "public class Person {}");
        let options = ConversionOptions {
            include_comments: false,
            ..ConversionOptions::default()
        };
        let prompt = conversion_user_prompt(&unit, &options);
        assert!(prompt.contains("File name: Person.cs"));
        assert!(prompt.contains("```csharp\npublic class Person {}\n```"));
        assert!(prompt.contains(r#""include_comments": false"#));
        assert!(prompt.contains(r#""java_code""#));
    }

    #[test]
    fn test_context_prompts() {
        let context = json!({"namespaces": ["Shop.Models"]});
        let system = context_system_prompt(&ConversionOptions::default(), &context);
        assert!(system.contains("Shop.Models"));
        assert!(system.contains("Convert namespaces to packages"));

        let user = context_user_prompt(&SourceUnit::new("A.cs", "class A {}"), &ConversionOptions::default());
        assert!(user.contains("package_declaration"));
        assert!(user.contains("type_mappings"));
    }

    #[test]
    fn test_project_summary_keeps_declarations() {
        let units: Vec<SourceUnit> = (0..12)
            .map(|i| {
                SourceUnit::new(
                    format!("F{}.cs", i),
                    "using System;\npublic class A\n{\n    private int x;\n    return x;\n}",
                )
            })
            .collect();
        let summary = project_summary(&units);

        assert!(summary.starts_with("// F0.cs\npublic class A\nprivate int x;\n"));
        assert!(!summary.contains("using System"));
        assert!(!summary.contains("return x"));
        assert!(summary.contains("// F9.cs"));
        assert!(!summary.contains("// F10.cs"));
    }
}
