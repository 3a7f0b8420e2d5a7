use std::path::Path;

/// Longest title derived from a document's first line
const MAX_TITLE_CHARS: usize = 80;
const MARKDOWN: &str = "text/markdown";

/// Title, type and file name inferred for a published document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTraits {
    pub title: String,
    pub file_type: String,
    pub file_name: String,
}

impl DocumentTraits {
    /// Infer traits from content and an optional file name.
    ///
    /// The title is the first `# ` heading, else the first non-empty line,
    /// else the file stem, else "Untitled". Without a file name one is made
    /// from the title.
    pub fn detect(plaintext: &[u8], file_name: Option<&str>) -> Self {
        let text = String::from_utf8_lossy(plaintext);
        let file_name = file_name.map(str::trim).filter(|name| !name.is_empty());

        let title = heading_title(&text)
            .or_else(|| first_line_title(&text))
            .or_else(|| file_name.and_then(file_stem))
            .unwrap_or_else(|| "Untitled".to_string());

        let file_type = file_name
            .map(guess_type)
            .unwrap_or_else(|| MARKDOWN.to_string());
        let file_name = file_name
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}.md", slug(&title)));

        Self {
            title,
            file_type,
            file_name,
        }
    }
}

fn heading_title(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("# "))
        .map(|heading| truncate(heading.trim()))
        .filter(|title| !title.is_empty())
}

fn first_line_title(text: &str) -> Option<String> {
    text.lines()
        .map(|line| line.trim().trim_start_matches('#').trim())
        .find(|line| !line.is_empty())
        .map(truncate)
}

fn file_stem(name: &str) -> Option<String> {
    Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
}

fn guess_type(name: &str) -> String {
    let extension = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("md") | Some("markdown") => MARKDOWN.to_string(),
        _ => mime_guess::from_path(name)
            .first_raw()
            .unwrap_or(MARKDOWN)
            .to_string(),
    }
}

fn truncate(line: &str) -> String {
    line.chars().take(MAX_TITLE_CHARS).collect::<String>().trim_end().to_string()
}

fn slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug.to_string()
    }
}
