use crate::models::Priority;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static PRIORITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)!(low|medium|high|\d+)\b\s*").expect("valid regex"));
static DUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(\d{4}-\d{2}-\d{2})\b\s*").expect("valid regex"));
static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

#[derive(Debug, PartialEq)]
pub struct ParsedTask {
    pub title: String,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
}

/// Pulls inline `!priority` and `@YYYY-MM-DD` tokens out of a title.
///
/// `!1`..`!3` map to low..high. The first valid token of each kind wins;
/// every token is stripped from the title, valid or not.
pub fn parse_task_input(input: &str) -> ParsedTask {
    let mut priority = None;
    for caps in PRIORITY_RE.captures_iter(input) {
        if priority.is_some() {
            break;
        }
        if let Some(m) = caps.get(1) {
            priority = match m.as_str().to_ascii_lowercase().as_str() {
                "1" => Some(Priority::Low),
                "2" => Some(Priority::Medium),
                "3" => Some(Priority::High),
                word => Priority::parse(word),
            };
        }
    }

    let mut due_date = None;
    for caps in DUE_RE.captures_iter(input) {
        if due_date.is_some() {
            break;
        }
        if let Some(m) = caps.get(1) {
            due_date = NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d").ok();
        }
    }

    let title = PRIORITY_RE.replace_all(input, "");
    let title = DUE_RE.replace_all(&title, "");
    let title = SPACE_RE.replace_all(&title, " ").trim().to_string();

    ParsedTask {
        title,
        priority,
        due_date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_title() {
        let result = parse_task_input("Review pull request");
        assert_eq!(
            result,
            ParsedTask {
                title: "Review pull request".to_string(),
                priority: None,
                due_date: None,
            }
        );
    }

    #[test]
    fn test_parse_with_priority_word_in_middle() {
        let result = parse_task_input("Update !high software documentation");
        assert_eq!(result.title, "Update software documentation");
        assert_eq!(result.priority, Some(Priority::High));
    }

    #[test]
    fn test_parse_with_numeric_priority_and_extra_spaces() {
        let result = parse_task_input("Fix bugs !1    in the code");
        assert_eq!(result.title, "Fix bugs in the code");
        assert_eq!(result.priority, Some(Priority::Low));
    }

    #[test]
    fn test_parse_with_due_date() {
        let result = parse_task_input("Deploy to production @2024-07-15  ");
        assert_eq!(result.title, "Deploy to production");
        assert_eq!(result.due_date, NaiveDate::from_ymd_opt(2024, 7, 15));
    }

    #[test]
    fn test_parse_with_both_tokens_first_wins() {
        let result = parse_task_input("  !Medium !high Organize   team event @2024-03-01 @2024-04-01 ");
        assert_eq!(result.title, "Organize team event");
        assert_eq!(result.priority, Some(Priority::Medium));
        assert_eq!(result.due_date, NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_parse_invalid_tokens_are_stripped() {
        let result = parse_task_input("Check logs !8 immediately @2024-02-30");
        assert_eq!(result.title, "Check logs immediately");
        assert_eq!(result.priority, None);
        assert_eq!(result.due_date, None);
    }

    #[test]
    fn test_parse_leaves_words_starting_with_priority_alone() {
        let result = parse_task_input("Say hi!lowercase");
        assert_eq!(result.title, "Say hi!lowercase");
        assert_eq!(result.priority, None);
    }
}
