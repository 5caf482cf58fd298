// UI layer: type confirmation and selection, result printing, and the
// interactive setup flow. Prompts go through the `Prompter` trait so the
// decision logic can run without a terminal; output goes to any `Write`.

use crate::config::Config;
use crate::detector::TypeTag;
use crate::error::Result;
use crate::models::{
    format_int, format_number, join_types, DetailedCountResponse, MachineInfo, Payload,
    SearchResponse, SearchType,
};
use crate::spinner::SpinnerStyle;
use crate::tree::format_file_tree;
use dialoguer::{Confirm, Input, Password, Select};
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::PathBuf;

/// The selection menu, in display order (menu index = position + 1).
pub const TYPE_MENU: [SearchType; 9] = [
    SearchType::Login,
    SearchType::Password,
    SearchType::Url,
    SearchType::EmailDomain,
    SearchType::Username,
    SearchType::Ip,
    SearchType::Hash,
    SearchType::Phone,
    SearchType::Uuid,
];

/// Used when the selection contains no valid entry.
pub const DEFAULT_TYPES: [SearchType; 3] = [SearchType::Login, SearchType::Password, SearchType::Url];

/// Source of interactive answers.
pub trait Prompter {
    /// Asks whether the detected types should be used as they are.
    fn confirm_detected(&self, detected: &[SearchType]) -> io::Result<bool>;

    /// Shows `menu` and returns the raw selection line.
    fn select_types(&self, menu: &[SearchType]) -> io::Result<String>;

    /// Informational message for the user.
    fn notify(&self, _message: &str) {}
}

/// Terminal prompts backed by `dialoguer`.
pub struct DialoguerPrompter;

impl Prompter for DialoguerPrompter {
    fn confirm_detected(&self, detected: &[SearchType]) -> io::Result<bool> {
        eprintln!("Detected types: {}", join_types(detected));
        Confirm::new()
            .with_prompt("Use detected types?")
            .default(true)
            .interact()
    }

    fn select_types(&self, menu: &[SearchType]) -> io::Result<String> {
        eprintln!("\nAvailable types:");
        for (i, t) in menu.iter().enumerate() {
            eprintln!("{}. {}", i + 1, t);
        }
        eprintln!();
        Input::<String>::new()
            .with_prompt("Select types (comma-separated numbers, e.g., '1,2,3' or 'all')")
            .allow_empty(true)
            .interact_text()
    }

    fn notify(&self, message: &str) {
        eprintln!("{}", message);
    }
}

/// Answers without asking: accepts detected types, selects nothing (so the
/// defaults apply). Used with `--yes` or when stdin is not a terminal.
pub struct AutoPrompter;

impl Prompter for AutoPrompter {
    fn confirm_detected(&self, _detected: &[SearchType]) -> io::Result<bool> {
        Ok(true)
    }

    fn select_types(&self, _menu: &[SearchType]) -> io::Result<String> {
        Ok(String::new())
    }
}

/// Turns a detection result into the types to search for: the detected
/// types when the user accepts them, otherwise whatever the menu yields.
pub fn resolve_types(detected: &BTreeSet<TypeTag>, prompter: &dyn Prompter) -> io::Result<Vec<SearchType>> {
    let detected: Vec<SearchType> = detected.iter().map(|t| SearchType::from(*t)).collect();
    if !detected.is_empty() && prompter.confirm_detected(&detected)? {
        return Ok(detected);
    }

    let input = prompter.select_types(&TYPE_MENU)?;
    match parse_type_selection(&input) {
        Some(types) => Ok(types),
        None => {
            prompter.notify("No valid types selected, using defaults: login, password, url");
            Ok(DEFAULT_TYPES.to_vec())
        }
    }
}

/// Parses `"1,3,9"` or `"all"` against [`TYPE_MENU`]. Unknown entries are
/// skipped, duplicates keep their first position. `None` when nothing
/// valid remains.
pub fn parse_type_selection(input: &str) -> Option<Vec<SearchType>> {
    let input = input.trim().to_ascii_lowercase();
    if input == "all" {
        return Some(TYPE_MENU.to_vec());
    }

    let mut selected = Vec::new();
    for part in input.split(',') {
        let choice = part
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| TYPE_MENU.get(i));
        if let Some(t) = choice {
            if !selected.contains(t) {
                selected.push(*t);
            }
        }
    }
    if selected.is_empty() {
        None
    } else {
        Some(selected)
    }
}

/// Pretty-prints any serialisable value followed by a newline.
pub fn print_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Prints a payload as indented JSON. A machine-info record with files
/// gets its `fileTree` printed as a tree below the JSON instead.
pub fn print_payload<W: Write>(out: &mut W, payload: &Payload) -> Result<()> {
    match payload {
        Payload::MachineInfo(info) if !info.file_tree.is_empty() => {
            let files = &info.file_tree;
            let without_files = MachineInfo {
                file_tree: Vec::new(),
                ..info.clone()
            };
            print_json(out, &without_files)?;
            writeln!(out, "\n📁 File Structure:")?;
            writeln!(out, "{}", format_file_tree(files))?;
        }
        Payload::MachineInfo(info) => print_json(out, info)?,
        Payload::Json(value) => print_json(out, value)?,
    }
    Ok(())
}

/// Search output: just the result count in quiet mode, a summary plus
/// one block per page when paginated, otherwise the raw results.
pub fn print_search_results<W: Write>(out: &mut W, resp: &SearchResponse, quiet: bool) -> Result<()> {
    if quiet {
        writeln!(out, "{}", resp.result_count())?;
        return Ok(());
    }

    if resp.is_paginated() {
        writeln!(out, "🔍 Search Results (Paginated)")?;
        write!(out, "{}", pagination_summary(resp))?;
        for (page, results) in resp.page_numbers() {
            writeln!(out, "\n=== Page {} ===", page)?;
            print_payload(out, &Payload::Json(results.clone()))?;
        }
    } else {
        writeln!(out, "Found {} results", resp.result_count())?;
        writeln!(out, "Search Results:")?;
        print_json(out, &resp.results)?;
    }
    Ok(())
}

/// Results, total available and the page list, one per line.
fn pagination_summary(resp: &SearchResponse) -> String {
    let pages: Vec<String> = resp.page_numbers().iter().map(|(n, _)| n.to_string()).collect();
    let mut summary = format!("Results: {}\n", format_int(resp.result_count() as i64));
    if let Some(total) = resp.total {
        summary.push_str(&format!("Total available: {}\n", format_int(total as i64)));
    }
    summary.push_str(&format!("Pages retrieved: {}\n", pages.join(", ")));
    summary
}

/// Total count, then one line per type and the server time.
pub fn print_count<W: Write>(out: &mut W, resp: &DetailedCountResponse, quiet: bool) -> Result<()> {
    if quiet {
        writeln!(out, "{}", resp.total_count)?;
        return Ok(());
    }
    writeln!(out, "Count Results: {}", format_int(resp.total_count))?;
    for (kind, count) in &resp.counts {
        writeln!(out, "  {}: {}", kind, format_number(count))?;
    }
    writeln!(out, "Took: {} ms", format_int(resp.took))?;
    Ok(())
}

/// Prints the resolved configuration with the key masked.
pub fn print_config<W: Write>(out: &mut W, config: &Config, file: Option<&std::path::Path>) -> Result<()> {
    writeln!(out, "Current configuration:")?;
    writeln!(out, "Base URL: {}", config.base_url)?;
    if config.has_api_key() {
        writeln!(out, "API key: ********")?;
    } else {
        writeln!(out, "API key: Not set")?;
    }
    writeln!(out, "Save results: {}", config.save_results)?;
    if config.save_results {
        writeln!(out, "Results directory: {}", config.results_dir.display())?;
    }
    writeln!(out, "Spinner style: {}", config.spinner_style)?;
    match file {
        Some(path) => writeln!(out, "Config file: {}", path.display())?,
        None => writeln!(out, "Config file: Not found")?,
    }
    Ok(())
}

/// Lists every spinner style with its description.
pub fn print_spinner_styles<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "Available spinner styles:\n")?;
    for style in SpinnerStyle::ALL {
        writeln!(out, "  {:<10} - {}", style.name(), style.description())?;
    }
    writeln!(out, "\nUsage:")?;
    writeln!(out, "  cliscore setup  - Configure spinner style")?;
    writeln!(out, "  or set CLISCORE_SPINNER_STYLE environment variable")?;
    Ok(())
}

/// Interactive setup. Starts from `current`, validates the API key through
/// `validate` before returning, and leaves saving to the caller.
pub fn setup_wizard<F>(current: &Config, validate: F) -> Result<Config>
where
    F: Fn(&str, &str) -> Result<()>,
{
    eprintln!("🔧 Setting up CliScore configuration...");

    let base_url: String = Input::new()
        .with_prompt("API base URL")
        .default(current.base_url.clone())
        .interact_text()?;

    let api_key = if current.has_api_key() {
        let key = Password::new()
            .with_prompt("API key (press Enter to keep current)")
            .allow_empty_password(true)
            .interact()?;
        if key.is_empty() {
            current.api_key.clone()
        } else {
            key
        }
    } else {
        Password::new().with_prompt("API key").interact()?
    };

    eprint!("Validating API key...");
    if let Err(e) = validate(&base_url, &api_key) {
        eprintln!("\n❌ API key validation failed: {}", e);
        eprintln!("Please check your API key and try again.");
        return Err(e);
    }
    eprintln!(" ✅ Valid");

    let save_results = Confirm::new()
        .with_prompt("Save results to files?")
        .default(current.save_results)
        .interact()?;

    let results_dir = if save_results {
        let dir: String = Input::new()
            .with_prompt("Results directory")
            .default(current.results_dir.display().to_string())
            .interact_text()?;
        PathBuf::from(dir)
    } else {
        current.results_dir.clone()
    };

    let items: Vec<String> = SpinnerStyle::ALL
        .iter()
        .map(|s| format!("{} ({})", s.name(), s.description()))
        .collect();
    let current_style = SpinnerStyle::resolve(&current.spinner_style);
    let default_index = SpinnerStyle::ALL
        .iter()
        .position(|s| *s == current_style)
        .unwrap_or(0);
    let choice = Select::new()
        .with_prompt("Spinner style")
        .items(&items)
        .default(default_index)
        .interact()?;

    Ok(Config {
        base_url,
        api_key,
        results_dir,
        save_results,
        spinner_style: SpinnerStyle::ALL[choice].name().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::detect_types;
    use serde_json::json;
    use std::cell::RefCell;

    /// Replays canned answers and records what it was asked.
    struct Scripted {
        accept: bool,
        selection: &'static str,
        asked_confirm: RefCell<Option<Vec<SearchType>>>,
        asked_select: RefCell<bool>,
        notices: RefCell<Vec<String>>,
    }

    impl Scripted {
        fn new(accept: bool, selection: &'static str) -> Self {
            Scripted {
                accept,
                selection,
                asked_confirm: RefCell::new(None),
                asked_select: RefCell::new(false),
                notices: RefCell::new(Vec::new()),
            }
        }
    }

    impl Prompter for Scripted {
        fn confirm_detected(&self, detected: &[SearchType]) -> io::Result<bool> {
            *self.asked_confirm.borrow_mut() = Some(detected.to_vec());
            Ok(self.accept)
        }

        fn select_types(&self, menu: &[SearchType]) -> io::Result<String> {
            assert_eq!(menu.len(), 9);
            *self.asked_select.borrow_mut() = true;
            Ok(self.selection.to_string())
        }

        fn notify(&self, message: &str) {
            self.notices.borrow_mut().push(message.to_string());
        }
    }

    #[test]
    fn accepted_detection_is_used_without_menu() {
        let prompter = Scripted::new(true, "");
        let detected = detect_types(&["admin@example.com", "example.org"]);
        let types = resolve_types(&detected, &prompter).unwrap();
        assert_eq!(types, vec![SearchType::Email, SearchType::Domain]);
        assert!(!*prompter.asked_select.borrow());
    }

    #[test]
    fn rejected_detection_falls_back_to_menu() {
        let prompter = Scripted::new(false, "2, 9");
        let detected = detect_types(&["example.org"]);
        let types = resolve_types(&detected, &prompter).unwrap();
        assert_eq!(types, vec![SearchType::Password, SearchType::Uuid]);
        assert_eq!(
            prompter.asked_confirm.borrow().clone(),
            Some(vec![SearchType::Domain])
        );
    }

    #[test]
    fn nothing_detected_skips_confirmation() {
        let prompter = Scripted::new(true, "all");
        let types = resolve_types(&detect_types(&["plain"]), &prompter).unwrap();
        assert_eq!(types, TYPE_MENU.to_vec());
        assert!(prompter.asked_confirm.borrow().is_none());
    }

    #[test]
    fn invalid_selection_uses_defaults_and_says_so() {
        let prompter = Scripted::new(false, "0, 42, x");
        let types = resolve_types(&BTreeSet::new(), &prompter).unwrap();
        assert_eq!(types, DEFAULT_TYPES.to_vec());
        assert_eq!(prompter.notices.borrow().len(), 1);
    }

    #[test]
    fn auto_prompter_accepts_or_defaults() {
        let detected = detect_types(&["ce1869f2-b922-456b-882c-58aa4ad5f266"]);
        assert_eq!(resolve_types(&detected, &AutoPrompter).unwrap(), vec![SearchType::Uuid]);
        assert_eq!(
            resolve_types(&BTreeSet::new(), &AutoPrompter).unwrap(),
            DEFAULT_TYPES.to_vec()
        );
    }

    #[test]
    fn selection_parsing() {
        assert_eq!(
            parse_type_selection(" 1,3 ,1,4 "),
            Some(vec![SearchType::Login, SearchType::Url, SearchType::EmailDomain])
        );
        assert_eq!(parse_type_selection("ALL"), Some(TYPE_MENU.to_vec()));
        assert_eq!(parse_type_selection(""), None);
        assert_eq!(parse_type_selection("10,-1"), None);
    }

    fn render(payload: &Payload) -> String {
        let mut out = Vec::new();
        print_payload(&mut out, payload).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn machine_info_prints_file_tree_separately() {
        let info = MachineInfo {
            computer_name: Some("DESKTOP-1".into()),
            file_tree: vec!["b/x".into(), "a/y".into(), "a/x".into()],
            ..MachineInfo::default()
        };
        let out = render(&Payload::MachineInfo(info));
        let expected = "{\n  \"computerName\": \"DESKTOP-1\"\n}\n\
\n📁 File Structure:\n\
├── a/\n│   ├── x\n│   └── y\n└── b/\n    └── x\n\n";
        assert_eq!(out, expected);
        assert!(!out.contains("fileTree"));
    }

    #[test]
    fn machine_info_without_files_is_plain_json() {
        let info = MachineInfo {
            hwid: Some("ABC".into()),
            ..MachineInfo::default()
        };
        assert_eq!(render(&Payload::MachineInfo(info)), "{\n  \"hwid\": \"ABC\"\n}\n");
    }

    #[test]
    fn generic_json_keeps_file_tree_field() {
        let out = render(&Payload::Json(json!({"fileTree": ["a/b"]})));
        assert!(out.contains("\"fileTree\""));
        assert!(!out.contains("File Structure"));
    }

    #[test]
    fn count_output_groups_digits() {
        let resp: DetailedCountResponse = serde_json::from_value(json!({
            "counts": {"email": 1234567, "domain": "42"},
            "total_count": 1234609,
            "took": 1500
        }))
        .unwrap();
        let mut out = Vec::new();
        print_count(&mut out, &resp, false).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("Count Results: 1,234,609\n"));
        assert!(out.contains("  email: 1,234,567\n"));
        assert!(out.contains("  domain: 42\n"));
        assert!(out.ends_with("Took: 1,500 ms\n"));

        let mut quiet = Vec::new();
        print_count(&mut quiet, &resp, true).unwrap();
        assert_eq!(String::from_utf8(quiet).unwrap(), "1234609\n");
    }

    #[test]
    fn paginated_search_prints_each_page() {
        let resp: SearchResponse = serde_json::from_value(json!({
            "pages": {"2": {"b": 1}, "1": {"a": 1}},
            "size": 2,
            "total": 1500
        }))
        .unwrap();
        let mut out = Vec::new();
        print_search_results(&mut out, &resp, false).unwrap();
        let out = String::from_utf8(out).unwrap();
        let first = out.find("=== Page 1 ===").unwrap();
        let second = out.find("=== Page 2 ===").unwrap();
        assert!(first < second);
        assert!(out.contains("Total available: 1,500\n"));
        assert!(out.contains("Pages retrieved: 1, 2\n"));
    }

    #[test]
    fn config_output_masks_key() {
        let config = Config {
            api_key: "super-secret".into(),
            ..Config::default()
        };
        let mut out = Vec::new();
        print_config(&mut out, &config, None).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("API key: ********"));
        assert!(!out.contains("super-secret"));
        assert!(out.contains("Config file: Not found"));
    }
}
