//! YouTube search through the external `yt-dlp` tool

use reelsmith_core::{ReelError, Result};
use std::process::Command;

pub const DEFAULT_SEARCH_LIMIT: u32 = 5;

/// One tab-separated line per result
const PRINT_TEMPLATE: &str = "%(id)s\t%(title)s\t%(webpage_url)s\t%(duration_string)s\t%(channel)s";

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub url: String,
    pub duration: String,
    pub channel: String,
}

pub fn search_args(query: &str, limit: u32) -> Vec<String> {
    vec![
        format!("ytsearch{}:{}", limit, query),
        "--print".to_string(),
        PRINT_TEMPLATE.to_string(),
        "--no-download".to_string(),
        "--no-warnings".to_string(),
    ]
}

/// Parse one printed line. Titles may themselves contain tabs, so the
/// id is taken from the front and url, duration and channel from the back.
pub fn parse_line(line: &str) -> Option<SearchResult> {
    let (id, rest) = line.split_once('\t')?;
    let mut tail = rest.rsplitn(4, '\t');
    let channel = tail.next()?;
    let duration = tail.next()?;
    let url = tail.next()?;
    let title = tail.next()?;
    if id.trim().is_empty() || url.trim().is_empty() {
        return None;
    }
    Some(SearchResult {
        id: id.trim().to_string(),
        title: title.trim().to_string(),
        url: url.trim().to_string(),
        duration: duration.trim().to_string(),
        channel: channel.trim().to_string(),
    })
}

/// Results from `yt-dlp` stdout; blank and malformed lines are skipped
pub fn parse_results(stdout: &str) -> Vec<SearchResult> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let parsed = parse_line(line);
            if parsed.is_none() {
                tracing::warn!("Skipping unexpected yt-dlp line: {}", line);
            }
            parsed
        })
        .collect()
}

pub fn yt_dlp_available() -> bool {
    Command::new("yt-dlp")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

pub fn search(query: &str, limit: u32) -> Result<Vec<SearchResult>> {
    if limit == 0 {
        return Err(ReelError::Validation("--limit must be at least 1".to_string()));
    }
    if !yt_dlp_available() {
        return Err(ReelError::Config(
            "yt-dlp is not installed (https://github.com/yt-dlp/yt-dlp)".to_string(),
        ));
    }
    let output = Command::new("yt-dlp").args(search_args(query, limit)).output()?;
    if !output.status.success() {
        return Err(ReelError::Generation(format!(
            "yt-dlp search failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(parse_results(&String::from_utf8_lossy(&output.stdout)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_args() {
        let args = search_args("indian railway footage", 10);
        assert_eq!(args[0], "ytsearch10:indian railway footage");
        assert_eq!(args[1], "--print");
        assert!(args[2].starts_with("%(id)s\t%(title)s"));
        assert!(args.contains(&"--no-download".to_string()));
    }

    #[test]
    fn test_parse_results() {
        let stdout = "abc123\tSteam Engines of India\thttps://www.youtube.com/watch?v=abc123\t12:04\tRail Archive\n\
                      \n\
                      def456\tMonsoon B-roll\thttps://www.youtube.com/watch?v=def456\t3:10\tNA\n";
        let results = parse_results(stdout);
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0],
            SearchResult {
                id: "abc123".into(),
                title: "Steam Engines of India".into(),
                url: "https://www.youtube.com/watch?v=abc123".into(),
                duration: "12:04".into(),
                channel: "Rail Archive".into(),
            }
        );
        assert_eq!(results[1].channel, "NA");
    }

    #[test]
    fn test_title_with_tab_is_kept_whole() {
        let line = "x1\tPart 1\tThe Bridge\thttps://youtu.be/x1\t1:00\tChannel";
        let result = parse_line(line).unwrap();
        assert_eq!(result.title, "Part 1\tThe Bridge");
        assert_eq!(result.url, "https://youtu.be/x1");
    }

    #[test]
    fn test_short_and_malformed_lines_skipped() {
        assert_eq!(parse_line("just-an-id"), None);
        assert_eq!(parse_line("id\ttitle\turl\t1:00"), None);
        assert_eq!(parse_line("\ttitle\turl\t1:00\tchan"), None);
        assert_eq!(parse_line("id\ttitle\t\t1:00\tchan"), None);

        let stdout = "ERROR: something\nok1\tTitle\thttps://youtu.be/ok1\t0:30\tChan\nid\ttitle";
        let results = parse_results(stdout);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "ok1");
    }

    #[test]
    fn test_zero_limit_rejected() {
        assert!(matches!(search("anything", 0), Err(ReelError::Validation(_))));
    }
}
