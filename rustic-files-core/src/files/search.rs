use std::fs;
use std::ops::ControlFlow;
use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::files::format::human_size;
use crate::files::info::extension_of;
use crate::files::paths::{file_name_of, require_directory, resolve_path};
use crate::files::walk::{visit_entries, WalkEnd, WalkOptions};
use crate::files::FileManager;

const BINARY_SNIFF_BYTES: usize = 8 * 1024;
const MAX_MATCH_LINE_CHARS: usize = 200;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    pub search_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(default)]
    pub include_hidden: bool,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub path: String,
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub size_human: String,
    pub matches: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub search_path: String,
    pub criteria: SearchRequest,
    pub count: usize,
    pub truncated: bool,
    pub results: Vec<SearchResult>,
}

/// The value as given, unless it is missing or only whitespace.
fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .filter(|value| !value.trim().is_empty())
}

fn has_glob_syntax(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

/// Builds a matcher for entry names. Patterns without glob syntax match as
/// substrings.
pub(crate) fn name_matcher(pattern: &str, case_sensitive: bool) -> Result<GlobMatcher> {
    let effective = if has_glob_syntax(pattern) {
        pattern.to_owned()
    } else {
        format!("*{pattern}*")
    };

    GlobBuilder::new(&effective)
        .case_insensitive(!case_sensitive)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|err| Error::Validation(format!("invalid name pattern '{pattern}': {err}")))
}

fn normalize_extension(raw: &str) -> String {
    format!(".{}", raw.trim().trim_start_matches('.').to_lowercase())
}

struct ContentNeedle {
    needle: String,
    case_sensitive: bool,
    max_bytes: u64,
    max_lines: usize,
}

impl ContentNeedle {
    /// Returns matching lines, or `None` when the file is skipped or has no hit.
    fn scan(&self, path: &Path, size: u64) -> Option<Vec<String>> {
        if size > self.max_bytes {
            debug!(path = %path.display(), size, "content search skipped oversized file");
            return None;
        }

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!(path = %path.display(), "content search skipped unreadable file: {err}");
                return None;
            }
        };
        let sniff = &bytes[..bytes.len().min(BINARY_SNIFF_BYTES)];
        if sniff.contains(&0) {
            return None;
        }

        let text = String::from_utf8_lossy(&bytes);
        let needle = if self.case_sensitive {
            self.needle.clone()
        } else {
            self.needle.to_lowercase()
        };

        let mut matches = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let hit = if self.case_sensitive {
                line.contains(&needle)
            } else {
                line.to_lowercase().contains(&needle)
            };
            if !hit {
                continue;
            }
            let snippet = line.trim().chars().take(MAX_MATCH_LINE_CHARS).collect::<String>();
            matches.push(format!("line {}: {snippet}", index + 1));
            if matches.len() >= self.max_lines {
                break;
            }
        }

        if matches.is_empty() {
            None
        } else {
            Some(matches)
        }
    }
}

impl FileManager {
    pub fn search(&self, request: &SearchRequest) -> Result<SearchReport> {
        let name_pattern = non_blank(&request.name_pattern);
        let content = non_blank(&request.content_search);
        let extension = non_blank(&request.extension).map(normalize_extension);

        if name_pattern.is_none() && content.is_none() && extension.is_none() {
            return Err(Error::Validation(
                "at least one of name_pattern, content_search or extension is required"
                    .to_owned(),
            ));
        }

        let root = resolve_path(&request.search_path)?;
        require_directory(&root)?;

        let matcher = name_pattern
            .map(|pattern| name_matcher(pattern, request.case_sensitive))
            .transpose()?;
        let needle = content.map(|needle| ContentNeedle {
            needle: needle.to_owned(),
            case_sensitive: request.case_sensitive,
            max_bytes: self.limits().max_content_search_bytes,
            max_lines: self.limits().content_match_lines,
        });
        let max_results = request
            .max_results
            .unwrap_or(self.limits().max_search_results)
            .max(1);

        let options = WalkOptions {
            skip_errors: true,
            ..self.walk_options(true, request.include_hidden)
        };

        let mut results = Vec::new();
        let mut truncated = false;
        let end = visit_entries(&root, options, |path| {
            let name = file_name_of(&path);
            if let Some(matcher) = &matcher {
                if !matcher.is_match(&name) {
                    return ControlFlow::Continue(());
                }
            }

            let metadata = match fs::metadata(&path) {
                Ok(metadata) => metadata,
                Err(err) => {
                    debug!(path = %path.display(), "search skipped entry: {err}");
                    return ControlFlow::Continue(());
                }
            };
            let is_dir = metadata.is_dir();

            if let Some(extension) = &extension {
                if is_dir || &extension_of(&path) != extension {
                    return ControlFlow::Continue(());
                }
            }

            let matches = match &needle {
                Some(_) if is_dir => return ControlFlow::Continue(()),
                Some(needle) => match needle.scan(&path, metadata.len()) {
                    Some(matches) => matches,
                    None => return ControlFlow::Continue(()),
                },
                None => Vec::new(),
            };

            if results.len() >= max_results {
                truncated = true;
                return ControlFlow::Break(());
            }
            results.push(SearchResult {
                path: path.to_string_lossy().into_owned(),
                name,
                is_dir,
                size: metadata.len(),
                size_human: human_size(metadata.len()),
                matches,
            });
            ControlFlow::Continue(())
        })?;

        if end == WalkEnd::EntryLimit {
            debug!(root = %root.display(), "search stopped at the walk entry limit");
            truncated = true;
        }

        Ok(SearchReport {
            search_path: root.to_string_lossy().into_owned(),
            criteria: request.clone(),
            count: results.len(),
            truncated,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LimitsConfig;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("readme.txt"),
            "This is a README file with some text content.",
        )
        .expect("write");
        fs::write(
            dir.path().join("data.json"),
            r#"{"message": "Hello World", "status": "test"}"#,
        )
        .expect("write");
        fs::write(dir.path().join("main.py"), "print('hello world')\n").expect("write");
        fs::create_dir(dir.path().join("docs")).expect("mkdir");
        fs::write(dir.path().join("docs").join("guide.md"), "# Guide\nhello there\n")
            .expect("write");
        fs::write(dir.path().join("blob.bin"), b"Hello World\0\x01\x02").expect("write");
        dir
    }

    fn request(dir: &tempfile::TempDir) -> SearchRequest {
        SearchRequest {
            search_path: dir.path().to_string_lossy().into_owned(),
            ..SearchRequest::default()
        }
    }

    fn names(report: &SearchReport) -> Vec<&str> {
        let mut names = report
            .results
            .iter()
            .map(|result| result.name.as_str())
            .collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    #[test]
    fn name_pattern_returns_only_matching_names() {
        let dir = fixture();
        let mut req = request(&dir);
        req.name_pattern = Some("*.py".to_owned());

        let report = FileManager::default().search(&req).expect("search");
        assert_eq!(names(&report), vec!["main.py"]);
        let matcher = name_matcher("*.py", false).expect("matcher");
        assert!(report.results.iter().all(|result| matcher.is_match(&result.name)));
    }

    #[test]
    fn bare_pattern_matches_as_substring() {
        let dir = fixture();
        let mut req = request(&dir);
        req.name_pattern = Some("READ".to_owned());

        let report = FileManager::default().search(&req).expect("search");
        assert_eq!(names(&report), vec!["readme.txt"]);
    }

    #[test]
    fn content_search_reports_matching_lines_and_skips_binary() {
        let dir = fixture();
        let mut req = request(&dir);
        req.content_search = Some("Hello World".to_owned());

        let report = FileManager::default().search(&req).expect("search");
        assert_eq!(names(&report), vec!["data.json", "main.py"]);
        let json = report
            .results
            .iter()
            .find(|result| result.name == "data.json")
            .expect("json hit");
        assert_eq!(json.matches.len(), 1);
        assert!(json.matches[0].starts_with("line 1: "));
    }

    #[test]
    fn case_sensitive_content_search_is_strict() {
        let dir = fixture();
        let mut req = request(&dir);
        req.content_search = Some("Hello World".to_owned());
        req.case_sensitive = true;

        let report = FileManager::default().search(&req).expect("search");
        assert_eq!(names(&report), vec!["data.json"]);
    }

    #[test]
    fn extension_filter_accepts_with_or_without_dot() {
        let dir = fixture();
        for raw in [".json", "JSON"] {
            let mut req = request(&dir);
            req.extension = Some(raw.to_owned());
            let report = FileManager::default().search(&req).expect("search");
            assert_eq!(names(&report), vec!["data.json"]);
        }
    }

    #[test]
    fn criteria_combine_and_recurse() {
        let dir = fixture();
        let mut req = request(&dir);
        req.content_search = Some("hello".to_owned());
        req.extension = Some("md".to_owned());

        let report = FileManager::default().search(&req).expect("search");
        assert_eq!(names(&report), vec!["guide.md"]);
        assert_eq!(report.results[0].matches, vec!["line 2: hello there".to_owned()]);
    }

    #[test]
    fn requires_a_criterion() {
        let dir = fixture();
        let mut req = request(&dir);
        req.name_pattern = Some("   ".to_owned());
        let error = FileManager::default().search(&req).expect_err("no criteria");
        assert!(matches!(error, Error::Validation(_)));
    }

    #[test]
    fn truncates_at_max_results() {
        let dir = fixture();
        let mut req = request(&dir);
        req.name_pattern = Some("*".to_owned());
        req.max_results = Some(2);

        let report = FileManager::default().search(&req).expect("search");
        assert_eq!(report.count, 2);
        assert!(report.truncated);
    }

    #[test]
    fn skips_files_over_content_limit() {
        let dir = fixture();
        let manager = FileManager::new(LimitsConfig {
            max_content_search_bytes: 8,
            ..LimitsConfig::default()
        });
        let mut req = request(&dir);
        req.content_search = Some("hello".to_owned());

        let report = manager.search(&req).expect("search");
        assert!(report.results.is_empty());
    }

    fn numbered_files(count: usize) -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        for index in 0..count {
            fs::write(dir.path().join(format!("f{index:03}.txt")), "x").expect("write");
        }
        dir
    }

    #[test]
    fn stops_walking_once_results_are_full() {
        let dir = numbered_files(20);
        let manager = FileManager::new(LimitsConfig {
            max_walk_entries: 10,
            ..LimitsConfig::default()
        });
        let mut req = request(&dir);
        req.name_pattern = Some("f00".to_owned());
        req.max_results = Some(1);

        let report = manager.search(&req).expect("search");
        assert_eq!(names(&report), vec!["f000.txt"]);
        assert!(report.truncated);
    }

    #[test]
    fn entry_limit_truncates_instead_of_failing() {
        let dir = numbered_files(20);
        let manager = FileManager::new(LimitsConfig {
            max_walk_entries: 10,
            ..LimitsConfig::default()
        });
        let mut req = request(&dir);
        req.name_pattern = Some("f00".to_owned());

        let report = manager.search(&req).expect("search");
        assert_eq!(report.count, 10);
        assert!(report.truncated);
    }

    #[test]
    fn content_needle_keeps_surrounding_whitespace() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("spaced.txt"), "alpha beta\n").expect("write");
        fs::write(dir.path().join("joined.txt"), "alphabeta\n").expect("write");
        let mut req = request(&dir);
        req.content_search = Some(" beta".to_owned());

        let report = FileManager::default().search(&req).expect("search");
        assert_eq!(names(&report), vec!["spaced.txt"]);
    }
}
