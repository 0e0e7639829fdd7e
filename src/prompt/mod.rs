//! Prompt construction for README, comment and quality-analysis calls.

use crate::languages;
use crate::models::{GenerationRequest, Purpose, SourceInput};

/// Build the prompt for a README or comment request.
pub fn build_generation_prompt(request: &GenerationRequest) -> String {
    match request.purpose {
        Purpose::Readme => build_readme_prompt(request),
        Purpose::Comment => build_comment_prompt(request),
    }
}

fn build_readme_prompt(request: &GenerationRequest) -> String {
    let (mut prompt, body) = match &request.input {
        SourceInput::Files(files) => {
            let sections: Vec<String> = files
                .iter()
                .map(|(path, content)| file_section(path, content))
                .collect();
            (
                format!(
                    "You are an AI documentation assistant. Generate a technical README for the project '{}':",
                    request.name
                ),
                sections.join("\n\n"),
            )
        }
        SourceInput::Single(content) => (
            "You are an AI documentation assistant. Generate a technical README for the following code:"
                .to_string(),
            content.clone(),
        ),
    };

    push_instructions(&mut prompt, &request.custom_instructions);
    prompt.push_str("\n\n");
    prompt.push_str(&body);
    prompt
}

fn build_comment_prompt(request: &GenerationRequest) -> String {
    let ext = languages::extension(&request.name).unwrap_or("");
    let language = languages::language_for_path(&request.name);

    let mut prompt = format!(
        "You are an AI assistant. Add comments to this {language} code:\n```{ext}\n{}\n```",
        request.single_code()
    );
    push_instructions(&mut prompt, &request.custom_instructions);
    prompt
}

/// A labelled, fenced section for one file of a multi-file README prompt.
fn file_section(path: &str, content: &str) -> String {
    let ext = languages::extension(path).unwrap_or("");
    let language = languages::language_for_path(path);
    format!("## File: {path} ({language})\n```{ext}\n{content}\n```")
}

fn push_instructions(prompt: &mut String, instructions: &str) {
    if !instructions.is_empty() {
        prompt.push_str(&format!("\n\nAdditional instructions: {instructions}"));
    }
}

/// Label used for the quality prompt: the raw extension, or `"unknown"`.
pub fn quality_language(filename: &str) -> &str {
    match languages::extension(filename) {
        Some(ext) if !ext.is_empty() => ext,
        _ => "unknown",
    }
}

/// Build the code-quality prompt asking for a JSON report.
pub fn build_quality_prompt(code: &str, filename: &str) -> String {
    let language = quality_language(filename);
    format!(
        r#"Analyze the following {language} code for quality issues:

```{language}
{code}
```

Provide a JSON response with the following structure:
{{
    "issues": [
        {{
            "line": <line_number>,
            "message": "<description of the issue>",
            "severity": "<info|warning|error>",
            "type": "<code_smell|security|performance|style|bug>"
        }}
    ],
    "suggestions": [
        "<suggestion for improvement>"
    ],
    "summary": "<brief summary of code quality>"
}}

Focus on:
- Code smells
- Security issues
- Performance optimizations
- Best practices
- Deprecated API usage
"#
    )
}
